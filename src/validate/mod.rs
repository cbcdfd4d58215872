//! Output and counter validation
//!
//! Pure comparison of what a job was expected to produce against what it
//! actually produced. Nothing here logs or fails; callers receive every
//! [`Discrepancy`] and decide what to do with them.

pub mod counters;
pub mod output;
pub mod pair;
pub mod positions;
pub mod report;
pub mod value;

pub use counters::{
    CounterEnum, CounterExpectation, CounterFindings, CounterId, CounterLookup, CounterOrigin,
    CounterValidator, Counters,
};
pub use output::OutputValidator;
pub use pair::{parse_comma_delimited_list, parse_tabbed_pair, Pair, TypeTag};
pub use positions::PositionMap;
pub use report::{Discrepancy, ErrorBatch, Phase, Side, ValidationFailure, ValidationReport};
pub use value::Value;

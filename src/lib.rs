//! mrcheck - output and counter validation for data-processing jobs
//!
//! Register the outputs and counters a job should produce on a
//! [`TestDriver`], run the job, and get every discrepancy back in one
//! failure: missing or unexpected outputs, outputs at the wrong position,
//! key or value type mismatches, wrong counter values and, in strict mode,
//! counters nobody declared.

pub mod cli;
pub mod commands;
pub mod common;
pub mod harness;
pub mod testing;
pub mod validate;

// Re-export commonly used types
pub use common::{Error, Result};
pub use harness::{Job, JobContext, JobOutput, RecordedJob, TestDriver};
pub use validate::{
    CounterEnum, CounterId, Counters, Discrepancy, Pair, ValidationFailure, ValidationReport,
    Value,
};

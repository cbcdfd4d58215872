//! Error records and their per-phase aggregation
//!
//! Validators never stop at the first problem. Each one returns a list of
//! [`Discrepancy`] records; the caller groups them into an [`ErrorBatch`]
//! per validation phase and only then decides whether the run failed.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::counters::{CounterId, CounterOrigin};

/// Which side an unmatched output was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Expected but never produced
    Missing,
    /// Produced but never expected
    Unexpected,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Missing => write!(f, "Missing expected output"),
            Side::Unexpected => write!(f, "Received unexpected output"),
        }
    }
}

/// A single discrepancy between expected and actual results
///
/// Outputs are stored in their rendered form so records from differently
/// typed validations can share one list.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    #[error("Expected no outputs; got {actual} outputs.")]
    UnexpectedOutputs { actual: usize },

    #[error("Matched expected output {output} but at incorrect position {actual} (expected position {expected})")]
    WrongPosition {
        output: String,
        expected: usize,
        actual: usize,
    },

    #[error("{side} {output}{}", at_position(.position))]
    Unmatched {
        side: Side,
        output: String,
        position: Option<usize>,
    },

    #[error("{side} {output}: Mismatch in key class: expected: {expected} actual: {actual}")]
    KeyTypeMismatch {
        side: Side,
        output: String,
        expected: String,
        actual: String,
    },

    #[error("{side} {output}: Mismatch in value class: expected: {expected} actual: {actual}")]
    ValueTypeMismatch {
        side: Side,
        output: String,
        expected: String,
        actual: String,
    },

    #[error("{}", counter_mismatch(.counter, .origin, .expected, .actual))]
    CounterMismatch {
        counter: CounterId,
        origin: CounterOrigin,
        expected: i64,
        actual: i64,
    },

    #[error("{}", undeclared_counter(.counter))]
    UndeclaredCounter { counter: CounterId },
}

fn at_position(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" at position {}.", p),
        None => String::new(),
    }
}

fn counter_mismatch(
    counter: &CounterId,
    origin: &CounterOrigin,
    expected: &i64,
    actual: &i64,
) -> String {
    match origin {
        CounterOrigin::Enum => format!(
            "Counter {}.{} have value {} instead of expected {}",
            counter.group(),
            counter.name(),
            actual,
            expected
        ),
        CounterOrigin::Named => format!(
            "Counter with category {} and name {} have value {} instead of expected {}",
            counter.group(),
            counter.name(),
            actual,
            expected
        ),
    }
}

fn undeclared_counter(counter: &CounterId) -> String {
    format!(
        "Actual counter (\"{}\",\"{}\") was not found in expected counters",
        counter.group(),
        counter.name()
    )
}

/// Validation phases; each is aggregated and reported on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Outputs,
    ExpectedCounters,
    UndeclaredCounters,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Outputs => write!(f, "outputs"),
            Phase::ExpectedCounters => write!(f, "expected counters"),
            Phase::UndeclaredCounters => write!(f, "undeclared counters"),
        }
    }
}

/// All discrepancies found by one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBatch {
    pub phase: Phase,
    pub errors: Vec<Discrepancy>,
}

impl ErrorBatch {
    pub fn new(phase: Phase, errors: Vec<Discrepancy>) -> Self {
        Self { phase, errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// `"<N> Error(s): (msg1, msg2, ...)"`
impl fmt::Display for ErrorBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Error(s): (", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", error)?;
        }
        write!(f, ")")
    }
}

/// The batches produced by one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    batches: Vec<ErrorBatch>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: ErrorBatch) {
        self.batches.push(batch);
    }

    pub fn batches(&self) -> &[ErrorBatch] {
        &self.batches
    }

    /// Batches that contain at least one discrepancy
    pub fn failures(&self) -> impl Iterator<Item = &ErrorBatch> {
        self.batches.iter().filter(|b| !b.is_empty())
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn error_count(&self) -> usize {
        self.batches.iter().map(ErrorBatch::len).sum()
    }

    /// Convert into a failure carrying every non-empty batch
    pub fn into_result(self) -> Result<(), ValidationFailure> {
        let failed: Vec<ErrorBatch> = self.batches.into_iter().filter(|b| !b.is_empty()).collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure { batches: failed })
        }
    }
}

/// One or more failing phases; displays one aggregated line per phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    batches: Vec<ErrorBatch>,
}

impl ValidationFailure {
    pub fn batches(&self) -> &[ErrorBatch] {
        &self.batches
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, batch) in self.batches.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", batch)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

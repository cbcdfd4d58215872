//! Counter identities, the counter registry and the counter validator

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::report::{Discrepancy, ErrorBatch, Phase};
use crate::common::{Error, Result};

/// `(group, name)`: how every counter is identified once declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterId {
    group: String,
    name: String,
}

impl CounterId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Identity of an enumerated counter constant
    pub fn of<E: CounterEnum>(counter: &E) -> Self {
        Self::new(counter.group(), counter.name())
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A counter declared as a constant of an enum
///
/// The group defaults to the enum's fully qualified type name, so
/// `mylib::Records::Skipped` lands in group `mylib::Records` with name
/// `Skipped`. Implementors only need to name their variants.
pub trait CounterEnum {
    fn name(&self) -> &'static str;

    fn group(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// How a counter expectation was declared; only affects message wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOrigin {
    Enum,
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterExpectation {
    pub counter: CounterId,
    pub expected: i64,
    pub origin: CounterOrigin,
}

impl CounterExpectation {
    pub fn named(group: impl Into<String>, name: impl Into<String>, expected: i64) -> Self {
        Self {
            counter: CounterId::new(group, name),
            expected,
            origin: CounterOrigin::Named,
        }
    }

    pub fn enumerated<E: CounterEnum>(counter: &E, expected: i64) -> Self {
        Self {
            counter: CounterId::of(counter),
            expected,
            origin: CounterOrigin::Enum,
        }
    }
}

/// Read access to the counters a job actually produced
pub trait CounterLookup {
    /// Current value, 0 when the counter was never touched
    fn value_of(&self, counter: &CounterId) -> i64;

    fn identities(&self) -> BTreeSet<CounterId>;
}

/// In-memory counter registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    values: BTreeMap<CounterId, i64>,
}

/// Prefix of a streaming-style counter update line
const REPORTER_COUNTER_PREFIX: &str = "reporter:counter:";

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount`, saturating at the `i64` bounds
    pub fn increment(&mut self, group: impl Into<String>, name: impl Into<String>, amount: i64) {
        let value = self.values.entry(CounterId::new(group, name)).or_insert(0);
        *value = value.saturating_add(amount);
    }

    /// Add `amount` to an enum counter, saturating at the `i64` bounds
    pub fn increment_enum<E: CounterEnum>(&mut self, counter: &E, amount: i64) {
        let value = self.values.entry(CounterId::of(counter)).or_insert(0);
        *value = value.saturating_add(amount);
    }

    pub fn set(&mut self, counter: CounterId, value: i64) {
        self.values.insert(counter, value);
    }

    pub fn find(&self, group: &str, name: &str) -> i64 {
        self.value_of(&CounterId::new(group, name))
    }

    pub fn find_enum<E: CounterEnum>(&self, counter: &E) -> i64 {
        self.value_of(&CounterId::of(counter))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CounterId, i64)> {
        self.values.iter().map(|(id, value)| (id, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Apply `reporter:counter:<group>,<name>,<amount>` lines
    ///
    /// Other lines are ignored so a job's whole stderr can be fed in.
    /// Either every update is applied or, on a malformed line or an
    /// overflowing total, none is. Returns the number of updates applied.
    pub fn apply_reporter_lines(&mut self, text: &str) -> Result<usize> {
        let updates = text
            .lines()
            .filter_map(|line| {
                let update = line.trim().strip_prefix(REPORTER_COUNTER_PREFIX)?;
                Some(parse_reporter_update(line, update))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut staged = self.values.clone();
        for (line, counter, amount) in &updates {
            let value = staged.entry(counter.clone()).or_insert(0);
            *value = value.checked_add(*amount).ok_or_else(|| Error::CounterOverflow {
                counter: counter.to_string(),
                line: line.to_string(),
            })?;
        }
        self.values = staged;
        Ok(updates.len())
    }
}

/// Parse the part of a reporter line after the prefix
fn parse_reporter_update<'a>(line: &'a str, update: &str) -> Result<(&'a str, CounterId, i64)> {
    let invalid = || Error::InvalidCounterLine(line.to_string());
    let (rest, amount) = update.rsplit_once(',').ok_or_else(invalid)?;
    let (group, name) = rest.split_once(',').ok_or_else(invalid)?;
    let amount: i64 = amount.trim().parse().map_err(|_| invalid())?;
    Ok((line, CounterId::new(group, name), amount))
}

impl CounterLookup for Counters {
    fn value_of(&self, counter: &CounterId) -> i64 {
        self.values.get(counter).copied().unwrap_or(0)
    }

    fn identities(&self) -> BTreeSet<CounterId> {
        self.values.keys().cloned().collect()
    }
}

impl FromIterator<(CounterId, i64)> for Counters {
    fn from_iter<T: IntoIterator<Item = (CounterId, i64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Result of a counter validation; the two passes stay separate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterFindings {
    /// Expected counters whose actual value differs
    pub mismatched: Vec<Discrepancy>,
    /// Actual counters never declared (strict mode only)
    pub undeclared: Vec<Discrepancy>,
    /// Whether the undeclared pass ran
    pub strict: bool,
}

impl CounterFindings {
    pub fn errors(&self) -> impl Iterator<Item = &Discrepancy> {
        self.mismatched.iter().chain(self.undeclared.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.mismatched.is_empty() && self.undeclared.is_empty()
    }

    /// One batch per pass that ran
    pub fn into_batches(self) -> Vec<ErrorBatch> {
        let mut batches = vec![ErrorBatch::new(Phase::ExpectedCounters, self.mismatched)];
        if self.strict {
            batches.push(ErrorBatch::new(Phase::UndeclaredCounters, self.undeclared));
        }
        batches
    }
}

pub struct CounterValidator;

impl CounterValidator {
    /// Compare expectations against actual counters
    ///
    /// Every expectation is checked by value. In strict mode every actual
    /// counter must also have been declared, regardless of its value.
    pub fn validate<L: CounterLookup + ?Sized>(
        expectations: &[CounterExpectation],
        actual: &L,
        strict: bool,
    ) -> CounterFindings {
        let mismatched = expectations
            .iter()
            .filter_map(|exp| {
                let value = actual.value_of(&exp.counter);
                (value != exp.expected).then(|| Discrepancy::CounterMismatch {
                    counter: exp.counter.clone(),
                    origin: exp.origin,
                    expected: exp.expected,
                    actual: value,
                })
            })
            .collect();

        let mut undeclared = Vec::new();
        if strict {
            let declared: BTreeSet<&CounterId> = expectations.iter().map(|e| &e.counter).collect();
            undeclared = actual
                .identities()
                .into_iter()
                .filter(|id| !declared.contains(id))
                .map(|counter| Discrepancy::UndeclaredCounter { counter })
                .collect();
        }

        CounterFindings {
            mismatched,
            undeclared,
            strict,
        }
    }
}

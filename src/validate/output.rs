//! Expected-vs-actual output diffing
//!
//! Exact matches are settled first, per distinct pair, using position maps.
//! Pairs left without any exact counterpart then get a second look: if the
//! other sequence holds a pair of a different key or value type at the same
//! position, the type mismatch is reported instead of a plain missing or
//! unexpected output.

use std::fmt::Display;
use std::hash::Hash;

use super::pair::{Pair, TypeTag};
use super::positions::PositionMap;
use super::report::{Discrepancy, Side};

pub struct OutputValidator;

impl OutputValidator {
    /// Diff `actual` against `expected`
    ///
    /// With `order_matters` each occurrence of a pair must sit at the same
    /// index on both sides; otherwise only per-pair occurrence counts are
    /// compared. Never stops early: every discrepancy is returned.
    pub fn validate<K, V>(
        expected: &[Pair<K, V>],
        actual: &[Pair<K, V>],
        order_matters: bool,
    ) -> Vec<Discrepancy>
    where
        K: Eq + Hash + Display + TypeTag,
        V: Eq + Hash + Display + TypeTag,
    {
        let mut errors = Vec::new();

        if expected.is_empty() && !actual.is_empty() {
            errors.push(Discrepancy::UnexpectedOutputs {
                actual: actual.len(),
            });
        }

        let expected_positions = PositionMap::build(expected);
        let mut actual_positions = PositionMap::build(actual);
        let type_check = TypeCheck {
            expected,
            actual,
            order_matters,
        };

        for (output, expected_list) in expected_positions.iter() {
            match actual_positions.remove(output) {
                Some(actual_list) if order_matters => {
                    compare_positions(output, expected_list, &actual_list, &mut errors);
                }
                Some(actual_list) => {
                    compare_counts(output, expected_list.len(), actual_list.len(), &mut errors);
                }
                None => type_check.report(output, expected_list, Side::Missing, &mut errors),
            }
        }

        for (output, actual_list) in actual_positions.iter() {
            type_check.report(output, actual_list, Side::Unexpected, &mut errors);
        }

        errors
    }
}

/// Index-aware merge of two ascending position lists for one pair
fn compare_positions<K: Display, V: Display>(
    output: &Pair<K, V>,
    expected: &[usize],
    actual: &[usize],
    errors: &mut Vec<Discrepancy>,
) {
    if expected == actual {
        return;
    }

    let rendered = output.to_string();
    for i in 0..expected.len().max(actual.len()) {
        match (expected.get(i), actual.get(i)) {
            (Some(&e), Some(&a)) if e == a => {}
            (Some(&e), Some(&a)) => errors.push(Discrepancy::WrongPosition {
                output: rendered.clone(),
                expected: e,
                actual: a,
            }),
            (Some(&e), None) => errors.push(Discrepancy::Unmatched {
                side: Side::Missing,
                output: rendered.clone(),
                position: Some(e),
            }),
            (None, Some(&a)) => errors.push(Discrepancy::Unmatched {
                side: Side::Unexpected,
                output: rendered.clone(),
                position: Some(a),
            }),
            (None, None) => break,
        }
    }
}

fn compare_counts<K: Display, V: Display>(
    output: &Pair<K, V>,
    expected: usize,
    actual: usize,
    errors: &mut Vec<Discrepancy>,
) {
    let (side, surplus) = if expected > actual {
        (Side::Missing, expected - actual)
    } else {
        (Side::Unexpected, actual - expected)
    };
    for _ in 0..surplus {
        errors.push(Discrepancy::Unmatched {
            side,
            output: output.to_string(),
            position: None,
        });
    }
}

/// Both full sequences, for looking up the counterpart at a position
struct TypeCheck<'a, K, V> {
    expected: &'a [Pair<K, V>],
    actual: &'a [Pair<K, V>],
    order_matters: bool,
}

impl<K, V> TypeCheck<'_, K, V>
where
    K: Display + TypeTag,
    V: Display + TypeTag,
{
    fn report(
        &self,
        output: &Pair<K, V>,
        positions: &[usize],
        side: Side,
        errors: &mut Vec<Discrepancy>,
    ) {
        for &pos in positions {
            let error = self.type_mismatch(output, pos, side).unwrap_or_else(|| {
                Discrepancy::Unmatched {
                    side,
                    output: output.to_string(),
                    position: self.order_matters.then_some(pos),
                }
            });
            errors.push(error);
        }
    }

    fn type_mismatch(&self, output: &Pair<K, V>, pos: usize, side: Side) -> Option<Discrepancy> {
        let expected = self.expected.get(pos)?;
        let actual = self.actual.get(pos)?;

        let (expected_key, actual_key) = (expected.key().type_tag(), actual.key().type_tag());
        if expected_key != actual_key {
            return Some(Discrepancy::KeyTypeMismatch {
                side,
                output: output.to_string(),
                expected: expected_key.to_string(),
                actual: actual_key.to_string(),
            });
        }

        let (expected_value, actual_value) =
            (expected.value().type_tag(), actual.value().type_tag());
        if expected_value != actual_value {
            return Some(Discrepancy::ValueTypeMismatch {
                side,
                output: output.to_string(),
                expected: expected_value.to_string(),
                actual: actual_value.to_string(),
            });
        }

        None
    }
}

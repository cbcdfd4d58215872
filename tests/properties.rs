use mrcheck::validate::{
    CounterExpectation, CounterValidator, Counters, Discrepancy, OutputValidator, Pair,
};
use proptest::prelude::*;

fn arb_pair() -> impl Strategy<Value = Pair<u8, u8>> {
    (0u8..4, 0u8..3).prop_map(|(k, v)| Pair::new(k, v))
}

fn arb_outputs() -> impl Strategy<Value = Vec<Pair<u8, u8>>> {
    prop::collection::vec(arb_pair(), 0..12)
}

fn is_wrong_position(error: &Discrepancy) -> bool {
    matches!(error, Discrepancy::WrongPosition { .. })
}

fn sorted_messages(errors: &[Discrepancy]) -> Vec<String> {
    let mut messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    messages.sort();
    messages
}

proptest! {
    #[test]
    fn validation_is_reflexive(outputs in arb_outputs(), order_matters in any::<bool>()) {
        let errors = OutputValidator::validate(&outputs, &outputs, order_matters);
        prop_assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn unordered_ignores_permutation(
        expected in arb_outputs(),
        (actual, permuted) in arb_outputs()
            .prop_flat_map(|a| (Just(a.clone()), Just(a).prop_shuffle())),
    ) {
        let first = OutputValidator::validate(&expected, &actual, false);
        let second = OutputValidator::validate(&expected, &permuted, false);
        prop_assert_eq!(sorted_messages(&first), sorted_messages(&second));
    }

    #[test]
    fn equal_multisets_pass_unordered(
        (expected, actual) in arb_outputs()
            .prop_flat_map(|e| (Just(e.clone()), Just(e).prop_shuffle())),
    ) {
        let errors = OutputValidator::validate(&expected, &actual, false);
        prop_assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn reordering_fails_only_when_order_matters(
        (expected, actual) in arb_outputs()
            .prop_flat_map(|e| (Just(e.clone()), Just(e).prop_shuffle())),
    ) {
        prop_assume!(expected != actual);

        let ordered = OutputValidator::validate(&expected, &actual, true);
        let positional = ordered.iter().filter(|e| is_wrong_position(e)).count();
        prop_assert!(positional > 0, "{:?}", ordered);
        prop_assert_eq!(positional, ordered.len());

        let unordered = OutputValidator::validate(&expected, &actual, false);
        prop_assert!(unordered.is_empty(), "{:?}", unordered);
    }

    #[test]
    fn strict_mode_reports_each_undeclared_counter(
        declared in 0i64..5,
        extra in prop::collection::btree_map("[a-e]", 1i64..10, 0..4),
    ) {
        let mut actual = Counters::new();
        actual.increment("g", "declared", declared);
        for (name, value) in &extra {
            actual.increment("other", name.as_str(), *value);
        }
        let expectations = vec![CounterExpectation::named("g", "declared", declared)];

        let lenient = CounterValidator::validate(&expectations, &actual, false);
        prop_assert!(lenient.is_empty());

        let strict = CounterValidator::validate(&expectations, &actual, true);
        prop_assert!(strict.mismatched.is_empty());
        prop_assert_eq!(strict.undeclared.len(), extra.len());
    }
}

#[test]
fn strictness_toggle_example() {
    let mut actual = Counters::new();
    actual.increment("g", "a", 1);
    actual.increment("g", "b", 2);
    let expectations = vec![CounterExpectation::named("g", "a", 1)];

    assert!(CounterValidator::validate(&expectations, &actual, false).is_empty());

    let strict = CounterValidator::validate(&expectations, &actual, true);
    let messages: Vec<String> = strict.errors().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec!["Actual counter (\"g\",\"b\") was not found in expected counters"]
    );
}

//! Proptest strategies for generating pi-calculus terms.

use proptest::prelude::*;

use fresca_dsl::ast::{Name, Term};

/// Strategy for a free name drawn from a small alphabet, so that generated
/// terms share names often enough to exercise substitution and scoping.
pub fn arb_name() -> impl Strategy<Value = Name> {
    "[a-d]".prop_map(Name::free)
}

/// Strategy for a closed-form term of bounded depth. All names are free;
/// alpha conversion is what introduces bound names.
pub fn arb_term() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![
        Just(Term::Nil),
        ("[P-R]", proptest::collection::vec(arb_name(), 0..3))
            .prop_map(|(name, args)| Term::Call { name, args }),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (arb_name(), arb_name(), inner.clone()).prop_map(|(channel, value, next)| {
                Term::Output {
                    channel,
                    value,
                    next: Box::new(next),
                }
            }),
            (arb_name(), arb_name(), inner.clone()).prop_map(|(channel, binding, next)| {
                Term::Input {
                    channel,
                    binding,
                    next: Box::new(next),
                }
            }),
            (arb_name(), arb_name(), any::<bool>(), inner.clone()).prop_map(
                |(left, right, negate, next)| Term::Match {
                    left,
                    right,
                    negate,
                    next: Box::new(next),
                }
            ),
            (arb_name(), inner.clone()).prop_map(|(name, next)| Term::Restriction {
                name,
                next: Box::new(next),
            }),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| Term::Sum {
                left: Box::new(left),
                right: Box::new(right),
            }),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| Term::Parallel {
                left: Box::new(left),
                right: Box::new(right),
            }),
        ]
    })
}

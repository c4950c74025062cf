// tests/status_lattice.rs

use proptest::prelude::*;

use qualgate::types::Status;

fn any_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Green),
        Just(Status::Yellow),
        Just(Status::Red),
        Just(Status::Failed),
        Just(Status::Error),
        Just(Status::Skipped),
        Just(Status::Unanswered),
        Just(Status::Na),
    ]
}

proptest! {
    #[test]
    fn combine_is_commutative(a in any_status(), b in any_status()) {
        prop_assert_eq!(Status::combine(a, b), Status::combine(b, a));
    }

    #[test]
    fn combine_is_associative(a in any_status(), b in any_status(), c in any_status()) {
        prop_assert_eq!(
            Status::combine(Status::combine(a, b), c),
            Status::combine(a, Status::combine(b, c))
        );
    }

    #[test]
    fn na_is_the_identity(a in any_status()) {
        prop_assert_eq!(Status::combine(a, Status::Na), a);
        prop_assert_eq!(Status::combine(Status::Na, a), a);
    }

    #[test]
    fn combine_returns_one_of_its_operands(a in any_status(), b in any_status()) {
        let combined = Status::combine(a, b);
        prop_assert!(combined == a || combined == b);
    }
}

#[test]
fn priority_chain_first_match_wins() {
    // ERROR > FAILED > RED > YELLOW > GREEN > SKIPPED > UNANSWERED
    let chain = [
        Status::Error,
        Status::Failed,
        Status::Red,
        Status::Yellow,
        Status::Green,
        Status::Skipped,
        Status::Unanswered,
    ];

    for (i, &high) in chain.iter().enumerate() {
        for &low in &chain[i..] {
            assert_eq!(Status::combine(high, low), high);
            assert_eq!(Status::combine(low, high), high);
        }
    }
}

#[test]
fn folding_a_run_of_greens_stays_green() {
    let statuses = [Status::Green, Status::Green, Status::Green];
    let folded = statuses
        .iter()
        .fold(Status::Na, |acc, &s| Status::combine(acc, s));
    assert_eq!(folded, Status::Green);
}

#[test]
fn one_red_dominates_a_run_of_greens() {
    let statuses = [Status::Green, Status::Red, Status::Green];
    let folded = statuses
        .iter()
        .fold(Status::Na, |acc, &s| Status::combine(acc, s));
    assert_eq!(folded, Status::Red);
}

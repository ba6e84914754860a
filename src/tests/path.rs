use super::*;
use crate::rule::RuleId;

fn rule(raw: u32) -> RuleId {
    RuleId::from_raw(raw)
}

#[test]
fn invert_reverses_order_and_flips_steps() {
    let mut path: RewritePath = [
        RewriteStep::apply_rule(rule(0), 0, 0, false),
        RewriteStep::apply_rule(rule(1), 0, 0, true),
    ]
    .into_iter()
    .collect();

    path.invert();
    assert_eq!(
        path.steps(),
        &[
            RewriteStep::apply_rule(rule(1), 0, 0, false),
            RewriteStep::apply_rule(rule(0), 0, 0, true),
        ]
    );
}

#[test]
fn invert_twice_is_identity() {
    let path: RewritePath = [
        RewriteStep::apply_rule(rule(0), 1, 2, false),
        RewriteStep::decompose(2, false),
        RewriteStep::shift(true),
    ]
    .into_iter()
    .collect();

    assert_eq!(path.inverted().inverted(), path);
}

#[test]
fn split_cycle_at_forward_occurrence() {
    // Cycle: apply #2 forward, then travel back via #1 and #0 inverses.
    let path: RewritePath = [
        RewriteStep::apply_rule(rule(2), 0, 0, false),
        RewriteStep::apply_rule(rule(1), 0, 0, true),
        RewriteStep::apply_rule(rule(0), 0, 0, true),
    ]
    .into_iter()
    .collect();

    // Splitting at #2 should yield the lhs-to-rhs route around the rest
    // of the cycle: apply #1 then #0, forward.
    let replacement = path.split_cycle_at_rule(rule(2));
    assert_eq!(
        replacement.steps(),
        &[
            RewriteStep::apply_rule(rule(1), 0, 0, false),
            RewriteStep::apply_rule(rule(0), 0, 0, false),
        ]
    );
}

#[test]
fn split_cycle_at_inverted_occurrence() {
    let path: RewritePath = [
        RewriteStep::apply_rule(rule(0), 0, 0, false),
        RewriteStep::apply_rule(rule(1), 0, 0, true),
    ]
    .into_iter()
    .collect();

    // The occurrence of #1 is inverted, so the replacement is not
    // inverted again: it is simply the rest of the cycle.
    let replacement = path.split_cycle_at_rule(rule(1));
    assert_eq!(
        replacement.steps(),
        &[RewriteStep::apply_rule(rule(0), 0, 0, false)]
    );
}

#[test]
#[should_panic(expected = "more than once")]
fn split_cycle_rejects_repeated_rule() {
    let path: RewritePath = [
        RewriteStep::apply_rule(rule(0), 0, 0, false),
        RewriteStep::apply_rule(rule(0), 0, 0, true),
    ]
    .into_iter()
    .collect();
    path.split_cycle_at_rule(rule(0));
}

#[test]
#[should_panic(expected = "in context")]
fn split_cycle_rejects_occurrence_in_context() {
    let path: RewritePath = [RewriteStep::apply_rule(rule(0), 1, 0, false)]
        .into_iter()
        .collect();
    path.split_cycle_at_rule(rule(0));
}

#[test]
#[should_panic(expected = "does not appear")]
fn split_cycle_rejects_missing_rule() {
    let path: RewritePath = [RewriteStep::apply_rule(rule(0), 0, 0, false)]
        .into_iter()
        .collect();
    path.split_cycle_at_rule(rule(7));
}

#[test]
fn replace_adds_outer_context_to_inner_steps() {
    // An occurrence with whiskers (2, 3) re-contextualizes the inner step.
    let mut path: RewritePath = [RewriteStep::apply_rule(rule(7), 2, 3, false)]
        .into_iter()
        .collect();
    let replacement: RewritePath = [RewriteStep::apply_rule(rule(9), 0, 0, false)]
        .into_iter()
        .collect();

    assert!(path.replace_rule_with_path(rule(7), &replacement));
    assert_eq!(
        path.steps(),
        &[RewriteStep::apply_rule(rule(9), 2, 3, false)]
    );
}

#[test]
fn replace_at_inverted_occurrence_reverses_and_toggles() {
    let mut path: RewritePath = [RewriteStep::apply_rule(rule(7), 2, 3, true)]
        .into_iter()
        .collect();
    let replacement: RewritePath = [
        RewriteStep::apply_rule(rule(9), 0, 0, false),
        RewriteStep::apply_rule(rule(8), 0, 0, false),
    ]
    .into_iter()
    .collect();

    assert!(path.replace_rule_with_path(rule(7), &replacement));
    assert_eq!(
        path.steps(),
        &[
            RewriteStep::apply_rule(rule(8), 2, 3, true),
            RewriteStep::apply_rule(rule(9), 2, 3, true),
        ]
    );
}

#[test]
fn replace_does_not_recontextualize_inside_decompose() {
    // Steps bracketed by a Decompose/Compose pair operate on freshly
    // pushed terms; only the brackets themselves get the outer whiskers.
    let mut path: RewritePath = [RewriteStep::apply_rule(rule(7), 5, 5, false)]
        .into_iter()
        .collect();
    let replacement: RewritePath = [
        RewriteStep::decompose(2, false),
        RewriteStep::apply_rule(rule(9), 0, 0, false),
        RewriteStep::decompose(2, true),
    ]
    .into_iter()
    .collect();

    assert!(path.replace_rule_with_path(rule(7), &replacement));

    let steps = path.steps();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0], RewriteStep::decompose(2, false).with_offsets(5, 5));
    assert_eq!(steps[1], RewriteStep::apply_rule(rule(9), 0, 0, false));
    assert_eq!(steps[2], RewriteStep::decompose(2, true).with_offsets(5, 5));
}

#[test]
fn replace_returns_false_when_rule_is_absent() {
    let original: RewritePath = [
        RewriteStep::apply_rule(rule(1), 0, 0, false),
        RewriteStep::shift(false),
    ]
    .into_iter()
    .collect();

    let mut path = original.clone();
    let replacement: RewritePath = [RewriteStep::apply_rule(rule(2), 0, 0, false)]
        .into_iter()
        .collect();

    assert!(!path.replace_rule_with_path(rule(7), &replacement));
    assert_eq!(path, original);
}

#[test]
fn replace_is_idempotent_once_the_rule_is_gone() {
    let mut path: RewritePath = [
        RewriteStep::apply_rule(rule(0), 0, 0, false),
        RewriteStep::apply_rule(rule(7), 1, 0, false),
    ]
    .into_iter()
    .collect();
    let replacement: RewritePath = [RewriteStep::apply_rule(rule(9), 0, 0, true)]
        .into_iter()
        .collect();

    assert!(path.replace_rule_with_path(rule(7), &replacement));
    let after_first = path.clone();
    assert!(!path.replace_rule_with_path(rule(7), &replacement));
    assert_eq!(path, after_first);
}

#[test]
fn replace_copies_unrelated_steps_unchanged() {
    let mut path: RewritePath = [
        RewriteStep::shift(false),
        RewriteStep::apply_rule(rule(7), 0, 0, false),
        RewriteStep::concrete_conformance(true),
    ]
    .into_iter()
    .collect();
    let replacement: RewritePath = [RewriteStep::apply_rule(rule(9), 0, 0, false)]
        .into_iter()
        .collect();

    assert!(path.replace_rule_with_path(rule(7), &replacement));
    assert_eq!(
        path.steps(),
        &[
            RewriteStep::shift(false),
            RewriteStep::apply_rule(rule(9), 0, 0, false),
            RewriteStep::concrete_conformance(true),
        ]
    );
}

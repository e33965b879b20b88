use dnis_sync::{allowed_transitions, validate_transition, Progress, ReconcileState};
use proptest::prelude::*;

fn any_state() -> impl Strategy<Value = ReconcileState> {
    prop_oneof![
        Just(ReconcileState::Idle),
        Just(ReconcileState::InitialApplied),
        Just(ReconcileState::ChunkApplying),
        Just(ReconcileState::Completed),
        Just(ReconcileState::Failed),
        Just(ReconcileState::Compensating),
        Just(ReconcileState::Compensated),
    ]
}

#[test]
fn test_initial_applied_transitions() {
    assert!(validate_transition(ReconcileState::InitialApplied, ReconcileState::ChunkApplying).is_ok());
    assert!(validate_transition(ReconcileState::InitialApplied, ReconcileState::Completed).is_ok());
    assert!(validate_transition(ReconcileState::InitialApplied, ReconcileState::Failed).is_ok());

    assert!(validate_transition(ReconcileState::InitialApplied, ReconcileState::Compensating).is_err());
}

#[test]
fn test_compensation_requires_failure_first() {
    assert!(validate_transition(ReconcileState::ChunkApplying, ReconcileState::Compensating).is_err());
    assert!(validate_transition(ReconcileState::Failed, ReconcileState::Compensating).is_ok());
    assert!(validate_transition(ReconcileState::Compensating, ReconcileState::Compensated).is_ok());
}

#[test]
fn test_progress_rejects_illegal_step() {
    let mut progress = Progress::new();
    progress.advance(ReconcileState::InitialApplied).unwrap();

    assert!(progress.advance(ReconcileState::Compensated).is_err());
    assert_eq!(progress.current(), ReconcileState::InitialApplied);
    assert_eq!(
        progress.history(),
        &[ReconcileState::Idle, ReconcileState::InitialApplied]
    );
}

#[test]
fn test_only_end_states_are_terminal() {
    assert!(ReconcileState::Completed.is_terminal());
    assert!(ReconcileState::Compensated.is_terminal());
    assert!(!ReconcileState::Failed.is_terminal());
    assert!(!ReconcileState::ChunkApplying.is_terminal());
}

proptest! {
    #[test]
    fn prop_validate_matches_allowed(from in any_state(), to in any_state()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);
        prop_assert_eq!(res.is_ok(), allowed.contains(&to));
    }
}

//! FSM unit tests

use pressbox::provision::fsm::{ProvisionEvent, ProvisionFsm, ProvisionState};

#[test]
fn test_fsm_initial_state() {
    let fsm = ProvisionFsm::new();
    assert_eq!(fsm.state(), ProvisionState::Pending);
    assert!(fsm.error().is_none());
}

#[test]
fn test_fsm_happy_path() {
    let mut fsm = ProvisionFsm::new();

    let path = [
        ProvisionState::Created,
        ProvisionState::RuntimeInstalled,
        ProvisionState::AppFetched,
        ProvisionState::ConfigWritten,
        ProvisionState::ServerConfigured,
        ProvisionState::ServerValidated,
        ProvisionState::ServicesStarted,
        ProvisionState::Ready,
    ];
    for state in path {
        fsm.process(ProvisionEvent::Reached(state)).unwrap();
        assert_eq!(fsm.state(), state);
    }
    assert!(fsm.state().is_terminal());
}

#[test]
fn test_fsm_failure_from_any_state() {
    let mut fsm = ProvisionFsm::new();
    fsm.process(ProvisionEvent::Failed("boom".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), ProvisionState::Failed);
    assert_eq!(fsm.error(), Some("boom"));

    let mut fsm = ProvisionFsm::new();
    fsm.process(ProvisionEvent::Reached(ProvisionState::Created))
        .unwrap();
    fsm.process(ProvisionEvent::Reached(ProvisionState::RuntimeInstalled))
        .unwrap();
    fsm.process(ProvisionEvent::Failed("fetch".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), ProvisionState::Failed);
}

#[test]
fn test_fsm_failed_is_absorbing() {
    let mut fsm = ProvisionFsm::new();
    fsm.process(ProvisionEvent::Failed("first".to_string()))
        .unwrap();

    assert!(fsm
        .process(ProvisionEvent::Reached(ProvisionState::Created))
        .is_err());
    assert!(fsm.process(ProvisionEvent::Failed("second".to_string())).is_err());
    assert_eq!(fsm.error(), Some("first"));
}

#[test]
fn test_fsm_ready_is_terminal() {
    let mut fsm = ProvisionFsm::new();
    let mut state = ProvisionState::Pending;
    while let Some(next) = state.next() {
        fsm.process(ProvisionEvent::Reached(next)).unwrap();
        state = next;
    }

    assert_eq!(fsm.state(), ProvisionState::Ready);
    assert!(fsm.process(ProvisionEvent::Failed("late".to_string())).is_err());
}

#[test]
fn test_fsm_invalid_transition() {
    let mut fsm = ProvisionFsm::new();

    // Steps cannot be skipped
    let result = fsm.process(ProvisionEvent::Reached(ProvisionState::AppFetched));
    assert!(result.is_err());
    assert_eq!(fsm.state(), ProvisionState::Pending);
}

// Domain and polling use-case tests through the public API

use std::time::Duration;

use squonk2_core::application::{
    wait_for_instance, wait_for_task, JobOutcome, PollPolicy, TaskOutcome,
};
use squonk2_core::domain::{AssetScope, DomainError, InstancePhase, JobSpecification};
use squonk2_core::port::mocks::ScriptedProbe;
use squonk2_core::port::TaskStatus;

fn fast(max_wait_ms: u64) -> PollPolicy {
    PollPolicy::bounded(Duration::from_millis(2), Duration::from_millis(max_wait_ms))
}

#[test]
fn test_job_specification_wire_form() {
    let spec = JobSpecification::new("im-test", "coin-test", "1.0.0").with_variable("count", 3);
    tokio_test::assert_ok!(spec.validate());

    let text = spec.to_json_string();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["collection"], "im-test");
    assert_eq!(value["variables"]["count"], 3);

    // No variables means no "variables" key
    let bare = JobSpecification::new("im-test", "nop", "1.0.0").to_json_string();
    assert!(!bare.contains("variables"));
}

#[test]
fn test_blank_specification_is_invalid() {
    let err = tokio_test::assert_err!(JobSpecification::new("im-test", " ", "1.0.0").validate());
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn test_asset_scopes() {
    let unit = AssetScope::classify("unit-0a1b2c3d-0000-4000-8000-abcdefabcdef").unwrap();
    assert_eq!(unit.query_param(), "unit_id");
    assert_eq!(unit.id(), "unit-0a1b2c3d-0000-4000-8000-abcdefabcdef");

    assert_eq!(AssetScope::classify("alan").unwrap().query_param(), "user_id");
    assert!(matches!(
        AssetScope::classify("merchant-0a1b2c3d-0000-4000-8000-abcdefabcdef"),
        Err(DomainError::UnsupportedScope(_))
    ));
}

#[tokio::test]
async fn test_instance_completes() {
    let probe = ScriptedProbe::new().with_phases(&[
        InstancePhase::Pending,
        InstancePhase::Running,
        InstancePhase::Completed,
    ]);

    let outcome = wait_for_instance(&probe, "instance-1", &fast(1_000))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(probe.call_count(), 3);
}

#[tokio::test]
async fn test_unknown_terminal_phase_is_a_failure() {
    let probe = ScriptedProbe::new().with_phases(&[
        InstancePhase::Running,
        InstancePhase::from("CANCELLED"),
    ]);

    let outcome = wait_for_instance(&probe, "instance-1", &fast(1_000))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        JobOutcome::Failed {
            phase: InstancePhase::Other("CANCELLED".to_string())
        }
    );
}

#[tokio::test]
async fn test_instance_wait_gives_up() {
    let probe = ScriptedProbe::new().with_phases(&[InstancePhase::Running]);

    let outcome = wait_for_instance(&probe, "instance-1", &fast(20))
        .await
        .unwrap();

    match outcome {
        JobOutcome::TimedOut { last_phase, waited } => {
            assert_eq!(last_phase, InstancePhase::Running);
            assert!(waited >= Duration::from_millis(20));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_probe_error_stops_waiting() {
    let probe = ScriptedProbe::new()
        .with_phases(&[InstancePhase::Pending])
        .with_instance_error("connection reset");

    let err = wait_for_instance(&probe, "instance-1", &fast(1_000))
        .await
        .unwrap_err();

    assert_eq!(err.0, "connection reset");
    assert_eq!(probe.call_count(), 2);
}

#[tokio::test]
async fn test_task_succeeds_after_polls() {
    let running = TaskStatus {
        done: false,
        exit_code: None,
    };
    let finished = TaskStatus {
        done: true,
        exit_code: Some(0),
    };
    let probe = ScriptedProbe::new().with_tasks(&[running.clone(), running, finished.clone()]);

    let policy = PollPolicy::with_max_polls(Duration::from_millis(2), 11);
    let outcome = wait_for_task(&probe, "task-1", &policy).await.unwrap();

    assert_eq!(outcome, TaskOutcome::Succeeded(finished));
}

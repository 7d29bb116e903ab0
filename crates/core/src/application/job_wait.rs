// Job Wait Use Cases - block until a job instance (or its task) finishes

use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::poll::{poll_until, PollOutcome, PollPolicy};
use crate::domain::{InstancePhase, PhaseTracker};
use crate::port::{InstanceProbe, InstanceStatus, TaskStatus};

/// How waiting for a job instance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The instance reached `COMPLETED`
    Completed(InstanceStatus),
    /// The instance reached any other terminal phase
    Failed { phase: InstancePhase },
    /// The instance was still pending or running when time ran out
    TimedOut {
        last_phase: InstancePhase,
        waited: Duration,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

/// How waiting for a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded(TaskStatus),
    Failed(TaskStatus),
    TimedOut { waited: Duration },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }
}

/// Wait for a job instance to leave the PENDING/RUNNING phases.
///
/// # Arguments
/// * `probe` - Source of instance status
/// * `instance_id` - The instance to watch
/// * `policy` - Poll interval and maximum wait
///
/// # Errors
/// Returns the probe's error from the first failed query.
pub async fn wait_for_instance<P>(
    probe: &P,
    instance_id: &str,
    policy: &PollPolicy,
) -> Result<JobOutcome, P::Error>
where
    P: InstanceProbe + ?Sized,
{
    let tracker = Mutex::new(PhaseTracker::new());

    let outcome = poll_until(
        policy,
        || probe.instance_status(instance_id),
        |status: &InstanceStatus| {
            let mut tracker = tracker.lock().unwrap_or_else(|e| e.into_inner());
            if tracker.last() != Some(&status.phase) {
                debug!(instance_id = %instance_id, phase = %status.phase, "Instance phase");
            }
            if let Err(e) = tracker.observe(&status.phase) {
                warn!(instance_id = %instance_id, error = %e, "Unexpected instance phase change");
            }
            status.phase.is_terminal()
        },
    )
    .await?;

    Ok(match outcome {
        PollOutcome::Ready(status) if status.phase.is_success() => {
            info!(instance_id = %instance_id, "Instance completed");
            JobOutcome::Completed(status)
        }
        PollOutcome::Ready(status) => {
            warn!(
                instance_id = %instance_id,
                phase = %status.phase,
                "Instance stopped without completing"
            );
            JobOutcome::Failed {
                phase: status.phase,
            }
        }
        PollOutcome::TimedOut { last, waited } => {
            warn!(
                instance_id = %instance_id,
                phase = %last.phase,
                waited_s = waited.as_secs_f64(),
                "Gave up waiting for instance"
            );
            JobOutcome::TimedOut {
                last_phase: last.phase,
                waited,
            }
        }
    })
}

/// Wait for a task to report that it is done.
pub async fn wait_for_task<P>(
    probe: &P,
    task_id: &str,
    policy: &PollPolicy,
) -> Result<TaskOutcome, P::Error>
where
    P: InstanceProbe + ?Sized,
{
    let outcome = poll_until(
        policy,
        || probe.task_status(task_id),
        |status: &TaskStatus| status.done,
    )
    .await?;

    Ok(match outcome {
        PollOutcome::Ready(status) if status.is_success() => TaskOutcome::Succeeded(status),
        PollOutcome::Ready(status) => {
            warn!(task_id = %task_id, exit_code = ?status.exit_code, "Task failed");
            TaskOutcome::Failed(status)
        }
        PollOutcome::TimedOut { waited, .. } => {
            warn!(task_id = %task_id, waited_s = waited.as_secs_f64(), "Gave up waiting for task");
            TaskOutcome::TimedOut { waited }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::instance_probe::mocks::{ScriptedProbe, ScriptedProbeError};

    fn fast() -> PollPolicy {
        PollPolicy::bounded(Duration::from_millis(1), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_wait_until_completed() {
        let probe = ScriptedProbe::new().with_phases(&[
            InstancePhase::Pending,
            InstancePhase::Running,
            InstancePhase::Running,
            InstancePhase::Completed,
        ]);

        let outcome = wait_for_instance(&probe, "instance-1", &fast()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(probe.call_count(), 4);
    }

    #[tokio::test]
    async fn test_wait_until_failed() {
        let probe =
            ScriptedProbe::new().with_phases(&[InstancePhase::Running, InstancePhase::Failed]);

        let outcome = wait_for_instance(&probe, "instance-1", &fast()).await.unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Failed {
                phase: InstancePhase::Failed
            }
        );
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_unknown_phase_is_terminal_failure() {
        let probe = ScriptedProbe::new().with_phases(&[InstancePhase::from("CANCELLED")]);

        let outcome = wait_for_instance(&probe, "instance-1", &fast()).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let probe = ScriptedProbe::new().with_phases(&[InstancePhase::Running]);
        let policy = PollPolicy::bounded(Duration::from_millis(2), Duration::from_millis(10));

        let outcome = wait_for_instance(&probe, "instance-1", &policy).await.unwrap();

        match outcome {
            JobOutcome::TimedOut { last_phase, .. } => {
                assert_eq!(last_phase, InstancePhase::Running)
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(probe.call_count() >= 2);
    }

    #[tokio::test]
    async fn test_probe_error_is_returned() {
        let probe = ScriptedProbe::new()
            .with_phases(&[InstancePhase::Running])
            .with_instance_error("connection refused");

        let err = wait_for_instance(&probe, "instance-1", &fast()).await.unwrap_err();
        assert_eq!(err, ScriptedProbeError("connection refused".to_string()));
    }

    #[tokio::test]
    async fn test_phase_regression_is_not_fatal() {
        let probe = ScriptedProbe::new().with_phases(&[
            InstancePhase::Running,
            InstancePhase::Pending,
            InstancePhase::Completed,
        ]);

        let outcome = wait_for_instance(&probe, "instance-1", &fast()).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_wait_for_task() {
        let probe = ScriptedProbe::new().with_tasks(&[
            TaskStatus {
                done: false,
                exit_code: None,
            },
            TaskStatus {
                done: true,
                exit_code: Some(0),
            },
        ]);

        let outcome = wait_for_task(&probe, "task-1", &fast()).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_wait_for_task_failure() {
        let probe = ScriptedProbe::new().with_tasks(&[TaskStatus {
            done: true,
            exit_code: Some(1),
        }]);

        let outcome = wait_for_task(&probe, "task-1", &fast()).await.unwrap();
        assert!(matches!(outcome, TaskOutcome::Failed(_)));
    }
}

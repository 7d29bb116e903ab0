// Instance Probe Port
// Abstraction over "what is my job doing right now?" queries

use async_trait::async_trait;

use crate::domain::InstancePhase;

/// Snapshot of a job instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatus {
    pub phase: InstancePhase,
    pub started: bool,
    pub stopped: bool,
}

/// Snapshot of the Task running a job instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub done: bool,
    pub exit_code: Option<i32>,
}

impl TaskStatus {
    /// A finished task succeeded if it reported no exit code or zero
    pub fn is_success(&self) -> bool {
        self.done && self.exit_code.unwrap_or(0) == 0
    }
}

/// Instance Probe trait
///
/// Implementations:
/// - DmProbe (sdk): queries the Data Manager REST API
/// - ScriptedProbe (tests): replays a fixed sequence of snapshots
#[async_trait]
pub trait InstanceProbe: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current status of a job instance
    async fn instance_status(&self, instance_id: &str) -> Result<InstanceStatus, Self::Error>;

    /// Current status of a task
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, Self::Error>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Debug, Error, Clone, PartialEq, Eq)]
    #[error("scripted probe failure: {0}")]
    pub struct ScriptedProbeError(pub String);

    /// Probe that replays scripted answers, repeating the last one forever.
    pub struct ScriptedProbe {
        instances: Mutex<VecDeque<Result<InstanceStatus, ScriptedProbeError>>>,
        tasks: Mutex<VecDeque<Result<TaskStatus, ScriptedProbeError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProbe {
        pub fn new() -> Self {
            Self {
                instances: Mutex::new(VecDeque::new()),
                tasks: Mutex::new(VecDeque::new()),
                calls: Mutex::new(0),
            }
        }

        /// Script a sequence of instance phases
        pub fn with_phases(self, phases: &[InstancePhase]) -> Self {
            {
                let mut instances = self.instances.lock().unwrap();
                for phase in phases {
                    instances.push_back(Ok(InstanceStatus {
                        phase: phase.clone(),
                        started: *phase != InstancePhase::Pending,
                        stopped: phase.is_terminal(),
                    }));
                }
            }
            self
        }

        pub fn with_instance_error(self, message: impl Into<String>) -> Self {
            self.instances
                .lock()
                .unwrap()
                .push_back(Err(ScriptedProbeError(message.into())));
            self
        }

        pub fn with_tasks(self, tasks: &[TaskStatus]) -> Self {
            self.tasks.lock().unwrap().extend(tasks.iter().cloned().map(Ok));
            self
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        fn next<T: Clone>(
            &self,
            queue: &Mutex<VecDeque<Result<T, ScriptedProbeError>>>,
        ) -> Result<T, ScriptedProbeError> {
            *self.calls.lock().unwrap() += 1;
            let mut queue = queue.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().expect("queue is not empty")
            } else {
                queue
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Err(ScriptedProbeError("nothing scripted".to_string())))
            }
        }
    }

    impl Default for ScriptedProbe {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl InstanceProbe for ScriptedProbe {
        type Error = ScriptedProbeError;

        async fn instance_status(&self, _instance_id: &str) -> Result<InstanceStatus, Self::Error> {
            self.next(&self.instances)
        }

        async fn task_status(&self, _task_id: &str) -> Result<TaskStatus, Self::Error> {
            self.next(&self.tasks)
        }
    }
}

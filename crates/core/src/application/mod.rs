// Application Layer - Use Cases

pub mod constants;
pub mod job_wait;
pub mod poll;

// Re-exports
pub use job_wait::{wait_for_instance, wait_for_task, JobOutcome, TaskOutcome};
pub use poll::{poll_until, PollOutcome, PollPolicy};

// Port Layer - Interfaces for external dependencies

pub mod instance_probe;

// Re-exports
pub use instance_probe::{mocks, InstanceProbe, InstanceStatus, TaskStatus};

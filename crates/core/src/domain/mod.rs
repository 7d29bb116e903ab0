// Domain Layer - Pure types shared by the clients and drivers

pub mod error;
pub mod job_spec;
pub mod phase;
pub mod scope;

// Re-exports
pub use error::DomainError;
pub use job_spec::{JobSpecification, DM_JOB_APPLICATION_ID};
pub use phase::{InstancePhase, PhaseTracker};
pub use scope::{is_as_uuid, is_prefixed_uuid, AssetScope};

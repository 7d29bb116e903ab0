// Polling constants (No magic values)
use std::time::Duration;

/// Default interval between job instance queries (1s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval used by the developer test driver (2s)
pub const TEST_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum wait used by the developer test driver (2 minutes)
pub const TEST_MAX_WAIT: Duration = Duration::from_secs(120);

/// Interval between Task queries (5s)
pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum number of Task polls before giving up
pub const TASK_MAX_POLLS: u32 = 11;

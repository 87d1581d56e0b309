//! Environment variable names for molino runtime tuning.

/// Overrides the number of parallel map tasks (default: one per CPU).
pub const ENV_TASKS: &str = "MOLINO_TASKS";

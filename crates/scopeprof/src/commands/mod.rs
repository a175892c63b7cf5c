//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod stats;
pub mod utils;
pub mod workload;

// Re-export main command functions
pub use models::{AllocArgs, SleepArgs, StatsArgs};
pub use stats::{execute_stats, parse_samples};
pub use utils::display_version;
pub use workload::{execute_alloc, execute_sleep};

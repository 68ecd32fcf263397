//! rclone wrapper library
//!
//! Drives the `rclone` command line tool from Rust:
//! - Reading the configured remotes from `rclone.conf`
//! - Running rclone commands as child processes
//! - Mapping exit codes onto a closed set of statuses
//! - Normalizing `lsjson` listings into directory-only and file-only views
//! - Dry-run gating for every command

pub mod config;
pub mod error;
pub mod executor;
pub mod listing;
pub mod output;
pub mod runner;
pub mod status;

// Re-export main types and functions
pub use config::{RcloneConfig, Remote};
pub use error::{ConfigError, Result};
pub use executor::{ExecutorOptions, Rclone, DRY_RUN_FLAG};
pub use listing::{EntryKind, FilterMode, ListingFormat};
pub use output::{ListEntry, RcloneOutput};
pub use runner::{ProcessOutput, ProcessRunner, TokioRunner};
pub use status::RcloneStatus;

/// Run a single rclone command against the default configuration
///
/// Fails only if the configuration cannot be loaded; the command's own
/// outcome is in the returned status.
pub async fn run_command(name: &str, args: &[&str]) -> Result<RcloneOutput> {
    let rclone = Rclone::with_default_config().await?;
    Ok(rclone.command(name, args).await)
}

#[cfg(test)]
mod listing_tests;

//! The uniform result returned by every rclone invocation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::RcloneStatus;

/// Captured result of one rclone run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcloneOutput {
    pub status: RcloneStatus,
    /// Raw exit code as reported by the OS; `None` when rclone never ran
    /// or was terminated by a signal
    pub exit_code: Option<i32>,
    /// Standard output, one entry per line
    pub output: Vec<String>,
    /// Standard error, one entry per line
    pub error: Vec<String>,
}

impl RcloneOutput {
    /// Build a result from a finished process
    pub fn from_process(exit_code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        let status = exit_code
            .map(RcloneStatus::from_exit_code)
            .unwrap_or(RcloneStatus::Uncategorised);

        Self {
            status,
            exit_code,
            output: split_lines(stdout),
            error: split_lines(stderr),
        }
    }

    /// Result for a failure that happened before or around rclone itself
    ///
    /// Both streams hold a single empty line so callers indexing `[0]` stay safe.
    pub fn local_failure(status: RcloneStatus) -> Self {
        Self {
            status,
            exit_code: None,
            output: vec![String::new()],
            error: vec![String::new()],
        }
    }

    pub fn binary_missing() -> Self {
        Self::local_failure(RcloneStatus::BinaryMissing)
    }

    pub fn internal_failure() -> Self {
        Self::local_failure(RcloneStatus::InternalFailure)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Standard output joined back into one string
    pub fn stdout(&self) -> String {
        self.output.join("\n")
    }

    /// Standard error joined back into one string
    pub fn stderr(&self) -> String {
        self.error.join("\n")
    }

    /// Parse the output of an `lsjson` listing
    ///
    /// Works on filtered listings too, as long as the remaining lines still
    /// form a JSON array.
    pub fn entries(&self) -> serde_json::Result<Vec<ListEntry>> {
        let text = self.stdout();
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        // A filter may drop the last entry and leave a dangling comma before `]`
        serde_json::from_str(&strip_trailing_comma(text))
    }
}

/// One record of `rclone lsjson`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEntry {
    pub path: String,
    pub name: String,
    /// Size in bytes, -1 for directories and unknown sizes
    pub size: i64,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
    #[serde(default, rename = "ID")]
    pub id: Option<String>,
}

/// Decode a captured stream and split it into lines
///
/// A trailing line terminator does not produce an empty final line, and an
/// empty stream yields no lines at all.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

fn strip_trailing_comma(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    let last_entry = lines
        .iter()
        .rposition(|line| line.trim() != "]" && !line.trim().is_empty());

    if let Some(index) = last_entry {
        if index + 1 < lines.len() {
            lines[index] = lines[index].trim_end().trim_end_matches(',');
        }
    }

    lines.join("\n")
}

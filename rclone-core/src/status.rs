//! Outcome classification for an rclone invocation

use serde::{Deserialize, Serialize};

/// Result of running rclone, derived from its exit code
///
/// The two negative variants never come from rclone: they describe failures
/// to run it at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RcloneStatus {
    /// The rclone executable could not be found
    BinaryMissing,
    /// Spawning or talking to the process failed, or the command was refused
    InternalFailure,
    Success,
    SyntaxOrUsage,
    /// Error not otherwise categorised, also used for unknown exit codes
    Uncategorised,
    FolderNotFound,
    FileNotFound,
    /// Temporary error, retrying may fix it
    RetryError,
    /// Less serious error, retrying won't fix it
    NoRetryError,
    FatalError,
    /// Transfer limit (`--max-transfer`) reached
    TransferExceeded,
}

impl RcloneStatus {
    /// Map a process exit code onto a status
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::SyntaxOrUsage,
            2 => Self::Uncategorised,
            3 => Self::FolderNotFound,
            4 => Self::FileNotFound,
            5 => Self::RetryError,
            6 => Self::NoRetryError,
            7 => Self::FatalError,
            8 => Self::TransferExceeded,
            _ => Self::Uncategorised,
        }
    }

    /// Numeric form: rclone's exit code, or a negative value for local failures
    pub fn code(&self) -> i32 {
        match self {
            Self::BinaryMissing => -1,
            Self::InternalFailure => -2,
            Self::Success => 0,
            Self::SyntaxOrUsage => 1,
            Self::Uncategorised => 2,
            Self::FolderNotFound => 3,
            Self::FileNotFound => 4,
            Self::RetryError => 5,
            Self::NoRetryError => 6,
            Self::FatalError => 7,
            Self::TransferExceeded => 8,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// rclone reported the failure as temporary. Nothing retries automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryError)
    }

    /// Whether rclone ran at all
    pub fn is_local_failure(&self) -> bool {
        matches!(self, Self::BinaryMissing | Self::InternalFailure)
    }
}

impl std::fmt::Display for RcloneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BinaryMissing => write!(f, "rclone executable not found"),
            Self::InternalFailure => write!(f, "Internal failure"),
            Self::Success => write!(f, "Success"),
            Self::SyntaxOrUsage => write!(f, "Syntax or usage error"),
            Self::Uncategorised => write!(f, "Error not otherwise categorised"),
            Self::FolderNotFound => write!(f, "Directory not found"),
            Self::FileNotFound => write!(f, "File not found"),
            Self::RetryError => write!(f, "Temporary error (retry may help)"),
            Self::NoRetryError => write!(f, "Less serious error (retry won't help)"),
            Self::FatalError => write!(f, "Fatal error"),
            Self::TransferExceeded => write!(f, "Transfer exceeded"),
        }
    }
}

//! Error types for loading rclone configuration
//!
//! Command execution never returns these: its failures are reported through
//! [`crate::status::RcloneStatus`] on the returned output instead.

use std::path::PathBuf;

/// Result type alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while reading an rclone configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read at the given location
    ///
    /// Covers every read failure of the requested file, not only a missing
    /// one: a directory or an unreadable file counts as no configuration.
    #[error("Can't find rclone config at '{path}'")]
    NotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A remote section lacks a required key
    #[error("Remote '{remote}' is missing required field '{field}'")]
    MissingField { remote: String, field: &'static str },

    /// The same remote name appears in more than one section
    #[error("Remote '{0}' is defined more than once")]
    DuplicateRemote(String),

    /// The text is not valid INI
    #[error("Config parse error: {0}")]
    Parse(String),

    /// The platform has no user configuration directory
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

impl ConfigError {
    /// Create a new not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Not-found error keeping the IO failure that caused it
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::NotFound {
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create a new missing field error
    pub fn missing_field(remote: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            remote: remote.into(),
            field,
        }
    }

    /// Whether this error means no configuration file could be read
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ini::ParseError> for ConfigError {
    fn from(err: ini::ParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

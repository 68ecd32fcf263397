//! Loading remote definitions from an rclone configuration file
//!
//! rclone stores its remotes in an INI file, one section per remote:
//!
//! ```text
//! [dropbox]
//! type = dropbox
//! token = {...}
//! ```
//!
//! Only the section name and the `type` key are read. Everything else is left
//! to rclone itself.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Key every remote section has to carry
const TYPE_KEY: &str = "type";

/// A single configured storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    /// Section name, used to address the remote as `name:`
    pub name: String,
    /// Backend type, e.g. `local`, `s3`, `drive`
    pub remote_type: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, remote_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_type: remote_type.into(),
        }
    }

    /// The remote in rclone's `name:` addressing form
    pub fn address(&self) -> String {
        format!("{}:", self.name)
    }
}

/// The set of remotes rclone knows about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcloneConfig {
    remotes: Vec<Remote>,
    /// File the remotes were read from, if any
    source: Option<PathBuf>,
}

impl RcloneConfig {
    /// Build a configuration from remotes directly
    pub fn from_remotes(remotes: Vec<Remote>) -> Result<Self> {
        let mut seen = HashSet::new();
        for remote in &remotes {
            if !seen.insert(remote.name.as_str()) {
                return Err(ConfigError::DuplicateRemote(remote.name.clone()));
            }
        }

        Ok(Self {
            remotes,
            source: None,
        })
    }

    /// Read the configuration file at `path`
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::unreadable(path, e))?;

        let mut config: RcloneConfig = content.parse()?;
        config.source = Some(path.to_path_buf());
        debug!(
            "Loaded {} remote(s) from {}",
            config.remotes.len(),
            path.display()
        );
        Ok(config)
    }

    /// Read the configuration from the platform default location
    pub async fn load_default() -> Result<Self> {
        Self::load(Self::default_path()?).await
    }

    /// Location rclone itself uses when no `--config` is given
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("rclone").join("rclone.conf"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// All remotes in the order they appear in the file
    pub fn remotes(&self) -> &[Remote] {
        &self.remotes
    }

    /// Remote names in `name:` form, in file order
    pub fn remote_names(&self) -> Vec<String> {
        self.remotes.iter().map(Remote::address).collect()
    }

    /// Look up a remote by name, with or without the trailing colon
    pub fn get(&self, name: &str) -> Option<&Remote> {
        let name = name.strip_suffix(':').unwrap_or(name);
        self.remotes.iter().find(|remote| remote.name == name)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }
}

impl FromStr for RcloneConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text)?;

        let mut remotes = Vec::new();
        // Keys outside any section land in the general section, which is not a remote
        for (section, properties) in ini.iter() {
            let Some(name) = section else {
                continue;
            };

            // Option names are case-insensitive, `Type = s3` is still the type
            let remote_type = properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(TYPE_KEY))
                .map(|(_, value)| value)
                .ok_or_else(|| ConfigError::missing_field(name, TYPE_KEY))?;

            remotes.push(Remote::new(name, remote_type));
        }

        Self::from_remotes(remotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_REMOTES: &str = "[local]\ntype = local\nnounc = true\n\n[backup]\ntype = s3\nprovider = AWS\n";

    #[fixture]
    fn config() -> RcloneConfig {
        TWO_REMOTES.parse().unwrap()
    }

    #[rstest]
    fn test_parses_remotes_in_order(config: RcloneConfig) {
        assert_eq!(config.len(), 2);
        assert_eq!(config.remotes()[0], Remote::new("local", "local"));
        assert_eq!(config.remotes()[1], Remote::new("backup", "s3"));
        assert!(config.source().is_none());
    }

    #[rstest]
    fn test_remote_names_have_colon(config: RcloneConfig) {
        assert_eq!(config.remote_names(), vec!["local:", "backup:"]);
    }

    #[rstest]
    fn test_get_accepts_address_form(config: RcloneConfig) {
        assert_eq!(config.get("backup").unwrap().remote_type, "s3");
        assert_eq!(config.get("backup:").unwrap().remote_type, "s3");
        assert!(config.get("missing").is_none());
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let err = "[broken]\nprovider = AWS\n".parse::<RcloneConfig>().unwrap_err();
        match err {
            ConfigError::MissingField { remote, field } => {
                assert_eq!(remote, "broken");
                assert_eq!(field, "type");
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_section_is_an_error() {
        let err = "[a]\ntype = local\n[a]\ntype = s3\n"
            .parse::<RcloneConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRemote(name) if name == "a"));
    }

    #[test]
    fn test_empty_text_has_no_remotes() {
        let config: RcloneConfig = "".parse().unwrap();
        assert!(config.is_empty());
        assert!(config.remote_names().is_empty());
    }

    #[test]
    fn test_keys_before_first_section_are_ignored() {
        let config: RcloneConfig = "stray = 1\n[local]\ntype = local\n".parse().unwrap();
        assert_eq!(config.remote_names(), vec!["local:"]);
    }

    #[test]
    fn test_from_remotes_rejects_duplicates() {
        let result = RcloneConfig::from_remotes(vec![
            Remote::new("x", "local"),
            Remote::new("x", "local"),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateRemote(_))));
    }

    #[tokio::test]
    async fn test_load_from_file_records_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TWO_REMOTES.as_bytes()).unwrap();

        let config = RcloneConfig::load(file.path()).await.unwrap();

        assert_eq!(config.remote_names(), vec!["local:", "backup:"]);
        assert_eq!(config.source(), Some(file.path()));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.conf");

        let err = RcloneConfig::load(&path).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope.conf"));
    }

    #[tokio::test]
    async fn test_load_directory_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();

        let err = RcloneConfig::load(dir.path()).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_load_non_utf8_file_is_not_found() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, b'[', 0xc3]).unwrap();

        let err = RcloneConfig::load(file.path()).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[rstest]
    #[case("[s]\nType = local\n")]
    #[case("[s]\nTYPE = local\n")]
    #[case("[s]\ntype = local\n")]
    fn test_type_key_is_case_insensitive(#[case] text: &str) {
        let config: RcloneConfig = text.parse().unwrap();
        assert_eq!(config.remotes(), &[Remote::new("s", "local")]);
    }

    #[test]
    fn test_default_path_ends_with_rclone_conf() {
        if let Ok(path) = RcloneConfig::default_path() {
            assert!(path.ends_with("rclone/rclone.conf"));
        }
    }
}

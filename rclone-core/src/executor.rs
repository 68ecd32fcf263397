//! Running rclone commands and shaping their results

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::RcloneConfig;
use crate::listing::{retain_entries, EntryKind, FilterMode, ListingFormat};
use crate::output::RcloneOutput;
use crate::runner::{ProcessRunner, TokioRunner};

/// Flag injected after the command name while in dry-run mode
pub const DRY_RUN_FLAG: &str = "--dry-run";

/// Options controlling how commands are run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorOptions {
    /// Program to run, looked up on `PATH` unless it contains a separator
    pub binary: PathBuf,
    /// Only let commands through that carry `--dry-run`
    pub dry_run: bool,
    /// Structured (`lsjson`) or legacy text listings
    pub listing_format: ListingFormat,
    /// How `lsjson` lines are classified by `lsd` / `lsl`
    pub filter_mode: FilterMode,
    /// Kill rclone and report an internal failure after this long
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Append `--config <file>` so rclone reads the same file we parsed
    pub pass_config_path: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("rclone"),
            dry_run: false,
            listing_format: ListingFormat::default(),
            filter_mode: FilterMode::default(),
            timeout: None,
            pass_config_path: false,
        }
    }
}

/// Handle for running rclone against a set of configured remotes
///
/// Every operation returns an [`RcloneOutput`]; failures are reported through
/// its status, never as a Rust error. The mode setters take `&mut self`, so
/// share one instance per caller or wrap it in a lock.
pub struct Rclone {
    config: Arc<RcloneConfig>,
    options: ExecutorOptions,
    runner: Arc<dyn ProcessRunner>,
}

impl Rclone {
    /// Create an executor with default options
    pub fn new(config: impl Into<Arc<RcloneConfig>>) -> Self {
        Self::with_options(config, ExecutorOptions::default())
    }

    pub fn with_options(config: impl Into<Arc<RcloneConfig>>, options: ExecutorOptions) -> Self {
        Self {
            config: config.into(),
            options,
            runner: Arc::new(TokioRunner),
        }
    }

    /// Create an executor for the configuration at rclone's default location
    pub async fn with_default_config() -> crate::error::Result<Self> {
        Ok(Self::new(RcloneConfig::load_default().await?))
    }

    /// Replace the process runner, mainly to script rclone in tests
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &RcloneConfig {
        &self.config
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.options.dry_run = dry_run;
    }

    pub fn listing_format(&self) -> ListingFormat {
        self.options.listing_format
    }

    pub fn set_listing_format(&mut self, format: ListingFormat) {
        self.options.listing_format = format;
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.options.filter_mode = mode;
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.options.timeout = timeout;
    }

    /// Run a complete argument vector, `argv[0]` being the program
    ///
    /// In dry-run mode a vector without a dry-run flag is refused and reported
    /// as [`crate::RcloneStatus::InternalFailure`] without starting anything.
    pub async fn execute(&self, argv: Vec<String>) -> RcloneOutput {
        if self.options.dry_run && !has_dry_run_flag(argv.as_slice()) {
            error!(?argv, "Refusing to run a command without {} in dry-run mode", DRY_RUN_FLAG);
            return RcloneOutput::internal_failure();
        }

        debug!("Running: {:?}", argv);

        let run = self.runner.run(&argv);
        let result = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    error!(?argv, "Command timed out after {:?}", limit);
                    return RcloneOutput::internal_failure();
                }
            },
            None => run.await,
        };

        match result {
            Ok(process) => {
                let output =
                    RcloneOutput::from_process(process.exit_code, &process.stdout, &process.stderr);
                debug!(status = %output.status, "Command returned {:?}", output.output);
                if !output.error.is_empty() {
                    warn!("{}", output.stderr());
                }
                output
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!("Can't find rclone executable {:?}: {}", argv.first(), e);
                RcloneOutput::binary_missing()
            }
            Err(e) => {
                error!("Exception running {:?}: {}", argv, e);
                RcloneOutput::internal_failure()
            }
        }
    }

    /// Run `rclone <name> <args...>`
    ///
    /// Nothing is added to `args`: in dry-run mode the caller has to pass
    /// `--dry-run` itself or the command is refused.
    pub async fn command(&self, name: &str, args: &[&str]) -> RcloneOutput {
        let mut argv = Vec::with_capacity(args.len() + 4);
        argv.push(self.options.binary.to_string_lossy().into_owned());
        argv.push(name.to_string());
        argv.extend(args.iter().map(|arg| arg.to_string()));

        if self.options.pass_config_path {
            if let Some(source) = self.config.source() {
                argv.push("--config".to_string());
                argv.push(source.to_string_lossy().into_owned());
            }
        }

        self.execute(argv).await
    }

    /// Command with `--dry-run` placed right after the name when in dry-run mode
    async fn run(&self, name: &str, args: Vec<&str>) -> RcloneOutput {
        let mut full = Vec::with_capacity(args.len() + 1);
        if self.options.dry_run {
            full.push(DRY_RUN_FLAG);
        }
        full.extend(args);
        self.command(name, &full).await
    }

    /// Configured remote names in `name:` form. Does not start rclone.
    pub fn listremotes(&self) -> Vec<String> {
        self.config.remote_names()
    }

    /// Recursive listing of everything below `path`
    pub async fn ls(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        match self.options.listing_format {
            ListingFormat::Json => self.run("lsjson", with_flags(&["-R", path], flags)).await,
            ListingFormat::Text => self.run("ls", with_flags(&[path], flags)).await,
        }
    }

    /// Directories directly inside `path`
    pub async fn lsd(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        match self.options.listing_format {
            ListingFormat::Json => {
                let output = self.run("lsjson", with_flags(&[path], flags)).await;
                self.retain(output, EntryKind::Directories)
            }
            ListingFormat::Text => self.run("lsd", with_flags(&[path], flags)).await,
        }
    }

    /// Recursive long listing of files only
    pub async fn lsl(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        match self.options.listing_format {
            ListingFormat::Json => {
                let output = self.run("lsjson", with_flags(&["-R", path], flags)).await;
                self.retain(output, EntryKind::Files)
            }
            ListingFormat::Text => self.run("lsl", with_flags(&[path], flags)).await,
        }
    }

    /// Bare names, one per line. The listing format does not apply.
    pub async fn lsf(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("lsf", with_flags(&[path], flags)).await
    }

    /// Unfiltered `lsjson`, whatever the listing format
    pub async fn lsjson(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("lsjson", with_flags(&[path], flags)).await
    }

    pub async fn size(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("size", with_flags(&[path], flags)).await
    }

    /// Remove the files in `path`, leaving the directory structure
    pub async fn delete(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("delete", with_flags(&[path], flags)).await
    }

    pub async fn deletefile(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("deletefile", with_flags(&[path], flags)).await
    }

    /// Remove `path` and all of its contents
    pub async fn purge(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("purge", with_flags(&[path], flags)).await
    }

    pub async fn mkdir(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("mkdir", with_flags(&[path], flags)).await
    }

    pub async fn rmdir(&self, path: &str, flags: &[&str]) -> RcloneOutput {
        self.run("rmdir", with_flags(&[path], flags)).await
    }

    /// Make `dest` identical to `source`
    pub async fn sync(&self, source: &str, dest: &str, flags: &[&str]) -> RcloneOutput {
        self.run("sync", with_flags(&[source, dest], flags)).await
    }

    pub async fn copy(&self, source: &str, dest: &str, flags: &[&str]) -> RcloneOutput {
        self.run("copy", with_flags(&[source, dest], flags)).await
    }

    /// `rclone move`
    pub async fn move_files(&self, source: &str, dest: &str, flags: &[&str]) -> RcloneOutput {
        self.run("move", with_flags(&[source, dest], flags)).await
    }

    pub async fn copyto(&self, source: &str, dest: &str, flags: &[&str]) -> RcloneOutput {
        self.run("copyto", with_flags(&[source, dest], flags)).await
    }

    pub async fn moveto(&self, source: &str, dest: &str, flags: &[&str]) -> RcloneOutput {
        self.run("moveto", with_flags(&[source, dest], flags)).await
    }

    pub async fn version(&self, flags: &[&str]) -> RcloneOutput {
        self.run("version", flags.to_vec()).await
    }

    fn retain(&self, mut output: RcloneOutput, keep: EntryKind) -> RcloneOutput {
        if output.is_success() {
            output.output = retain_entries(output.output, keep, self.options.filter_mode);
        }
        output
    }
}

fn with_flags<'a>(args: &[&'a str], flags: &[&'a str]) -> Vec<&'a str> {
    let mut all = Vec::with_capacity(args.len() + flags.len());
    all.extend_from_slice(args);
    all.extend_from_slice(flags);
    all
}

/// Whether an argument vector asks rclone for a dry run
pub fn has_dry_run_flag<S: AsRef<str>>(args: &[S]) -> bool {
    args.iter()
        .any(|arg| matches!(arg.as_ref(), DRY_RUN_FLAG | "--dry-run=true" | "-n"))
}

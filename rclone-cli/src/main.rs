use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rclone_core::{
    ExecutorOptions, FilterMode, ListingFormat, Rclone, RcloneConfig, RcloneOutput, RcloneStatus,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

mod logging;
mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(name = "rcw")]
#[command(about = "Run rclone commands and get structured results")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// rclone configuration file (defaults to rclone's own location)
    #[arg(long, global = true)]
    rclone_config: Option<PathBuf>,

    /// Settings file for rcw itself
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// rclone executable to run
    #[arg(long, global = true)]
    binary: Option<PathBuf>,

    /// Only simulate changes; commands are run with --dry-run
    #[arg(long, global = true)]
    dry_run: bool,

    /// Use rclone's text listings instead of lsjson
    #[arg(long, global = true)]
    plain: bool,

    /// Classify lsjson lines by parsing them instead of matching markers
    #[arg(long, global = true)]
    structural: bool,

    /// Give up on rclone after this long, e.g. "30s" or "5m"
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// How results are printed
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured remotes
    Remotes,
    /// List everything below a path, recursively
    Ls(PathArgs),
    /// List directories directly inside a path
    Lsd(PathArgs),
    /// List files below a path with size and time, recursively
    Lsl(PathArgs),
    /// List names only
    Lsf(PathArgs),
    /// Raw lsjson output
    Lsjson(PathArgs),
    /// Total size and object count
    Size(PathArgs),
    /// Create a directory
    Mkdir(PathArgs),
    /// Remove an empty directory
    Rmdir(PathArgs),
    /// Remove the files in a path
    Delete(PathArgs),
    /// Remove a single file
    Deletefile(PathArgs),
    /// Remove a path and all of its contents
    Purge(PathArgs),
    /// Make destination identical to source
    Sync(TransferArgs),
    /// Copy files from source to destination
    Copy(TransferArgs),
    /// Move files from source to destination
    Move(TransferArgs),
    /// Copy a single file
    Copyto(TransferArgs),
    /// Move a single file
    Moveto(TransferArgs),
    /// Show the rclone version
    Version {
        /// Extra rclone flags, after `--`
        #[arg(last = true)]
        flags: Vec<String>,
    },
    /// Run any rclone command
    Raw {
        /// rclone command name
        command: String,
        /// Arguments passed through unchanged
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Args)]
struct PathArgs {
    /// Remote path, e.g. "remote:dir"
    path: String,
    /// Extra rclone flags, after `--`
    #[arg(last = true)]
    flags: Vec<String>,
}

#[derive(Args)]
struct TransferArgs {
    /// Source path
    source: String,
    /// Destination path
    dest: String,
    /// Extra rclone flags, after `--`
    #[arg(last = true)]
    flags: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// What a subcommand produced
enum Outcome {
    Remotes(Vec<String>),
    Command(RcloneOutput),
}

impl Outcome {
    fn exit_code(&self) -> i32 {
        match self {
            Outcome::Remotes(_) => 0,
            Outcome::Command(output) => exit_code_for(output.status),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_or_default(cli.settings.as_deref()).await?;
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| settings.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    let log_file = cli.log_file.clone().or_else(|| settings.log_file.clone());
    let guard = logging::init_logging(&log_level, log_file.as_deref())?;

    let rclone = build_rclone(&cli, &settings).await?;
    let outcome = dispatch(&rclone, &cli.command).await;
    print_outcome(&outcome, cli.output)?;

    let code = outcome.exit_code();
    if code != 0 {
        // process::exit skips destructors, flush the log file first
        drop(guard);
        std::process::exit(code);
    }
    Ok(())
}

impl Cli {
    /// Settings-file options with command line flags applied on top
    fn executor_options(&self, base: ExecutorOptions) -> ExecutorOptions {
        let mut options = base;
        if let Some(binary) = &self.binary {
            options.binary = binary.clone();
        }
        if self.dry_run {
            options.dry_run = true;
        }
        if self.plain {
            options.listing_format = ListingFormat::Text;
        }
        if self.structural {
            options.filter_mode = FilterMode::Structural;
        }
        if self.timeout.is_some() {
            options.timeout = self.timeout;
        }
        options
    }
}

async fn build_rclone(cli: &Cli, settings: &Settings) -> Result<Rclone> {
    let config = match cli.rclone_config.as_ref().or(settings.rclone_config.as_ref()) {
        Some(path) => {
            info!("Loading rclone configuration from {}", path.display());
            RcloneConfig::load(path)
                .await
                .with_context(|| format!("Failed to load rclone config {}", path.display()))?
        }
        None => match RcloneConfig::load_default().await {
            Ok(config) => config,
            // rclone itself runs fine without a config file
            Err(e) if e.is_not_found() => {
                warn!("{}; continuing without remotes", e);
                RcloneConfig::default()
            }
            Err(e) => return Err(e).context("Failed to load default rclone config"),
        },
    };

    let options = cli.executor_options(settings.executor.clone());
    Ok(Rclone::with_options(config, options))
}

async fn dispatch(rclone: &Rclone, command: &Commands) -> Outcome {
    let output = match command {
        Commands::Remotes => return Outcome::Remotes(rclone.listremotes()),
        Commands::Ls(args) => rclone.ls(&args.path, &as_strs(&args.flags)).await,
        Commands::Lsd(args) => rclone.lsd(&args.path, &as_strs(&args.flags)).await,
        Commands::Lsl(args) => rclone.lsl(&args.path, &as_strs(&args.flags)).await,
        Commands::Lsf(args) => rclone.lsf(&args.path, &as_strs(&args.flags)).await,
        Commands::Lsjson(args) => rclone.lsjson(&args.path, &as_strs(&args.flags)).await,
        Commands::Size(args) => rclone.size(&args.path, &as_strs(&args.flags)).await,
        Commands::Mkdir(args) => rclone.mkdir(&args.path, &as_strs(&args.flags)).await,
        Commands::Rmdir(args) => rclone.rmdir(&args.path, &as_strs(&args.flags)).await,
        Commands::Delete(args) => rclone.delete(&args.path, &as_strs(&args.flags)).await,
        Commands::Deletefile(args) => rclone.deletefile(&args.path, &as_strs(&args.flags)).await,
        Commands::Purge(args) => rclone.purge(&args.path, &as_strs(&args.flags)).await,
        Commands::Sync(args) => rclone.sync(&args.source, &args.dest, &as_strs(&args.flags)).await,
        Commands::Copy(args) => rclone.copy(&args.source, &args.dest, &as_strs(&args.flags)).await,
        Commands::Move(args) => {
            rclone.move_files(&args.source, &args.dest, &as_strs(&args.flags)).await
        }
        Commands::Copyto(args) => {
            rclone.copyto(&args.source, &args.dest, &as_strs(&args.flags)).await
        }
        Commands::Moveto(args) => {
            rclone.moveto(&args.source, &args.dest, &as_strs(&args.flags)).await
        }
        Commands::Version { flags } => rclone.version(&as_strs(flags)).await,
        Commands::Raw { command, args } => rclone.command(command, &as_strs(args)).await,
    };

    Outcome::Command(output)
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

fn print_outcome(outcome: &Outcome, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    write_outcome(outcome, format, &mut stdout.lock(), &mut stderr.lock())
}

/// Render an outcome: results go to `out`, rclone's stderr to `err` in text mode
fn write_outcome<W: Write, E: Write>(
    outcome: &Outcome,
    format: OutputFormat,
    out: &mut W,
    err: &mut E,
) -> Result<()> {
    match (outcome, format) {
        (Outcome::Remotes(names), OutputFormat::Text) => {
            for name in names {
                writeln!(out, "{name}")?;
            }
        }
        (Outcome::Remotes(names), OutputFormat::Json) => {
            writeln!(out, "{}", serde_json::to_string_pretty(names)?)?;
        }
        (Outcome::Remotes(names), OutputFormat::Yaml) => {
            write!(out, "{}", serde_yaml::to_string(names)?)?;
        }
        (Outcome::Command(output), OutputFormat::Text) => {
            for line in &output.output {
                writeln!(out, "{line}")?;
            }
            for line in &output.error {
                writeln!(err, "{line}")?;
            }
            if !output.is_success() {
                writeln!(err, "rcw: {} (code {})", output.status, output.status.code())?;
            }
        }
        (Outcome::Command(output), OutputFormat::Json) => {
            writeln!(out, "{}", serde_json::to_string_pretty(output)?)?;
        }
        (Outcome::Command(output), OutputFormat::Yaml) => {
            write!(out, "{}", serde_yaml::to_string(output)?)?;
        }
    }
    Ok(())
}

/// Process exit code for a status: rclone's own code where there is one
fn exit_code_for(status: RcloneStatus) -> i32 {
    match status {
        RcloneStatus::BinaryMissing => 127,
        RcloneStatus::InternalFailure => 70,
        other => other.code(),
    }
}

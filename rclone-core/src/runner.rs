//! Spawning the rclone process

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

/// Everything a finished child process leaves behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn new(exit_code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Runs an argument vector to completion
///
/// `argv[0]` is the program, the rest are passed through untouched with no
/// shell in between. Launch failures come back as `io::Error`, with
/// [`io::ErrorKind::NotFound`] reserved for a missing program.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, argv: &[String]) -> io::Result<ProcessOutput>;
}

/// Runs commands as real child processes through tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(&self, argv: &[String]) -> io::Result<ProcessOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argument vector"))?;

        // The child is killed if the caller stops waiting, e.g. on timeout
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

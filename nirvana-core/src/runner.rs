//! Subprocess execution
//!
//! Handles the external commands a deployment needs:
//! - Launching background commands whose output is captured for later
//! - Polling them without blocking
//! - Joining them exactly once, caching the result for repeated joins
//! - Running attached commands whose output goes straight to the terminal

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::task::{CommandOutput, TaskKind};
use crate::error::{NirvanaError, Result};

/// An external command as an explicit argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Human-readable command line, for logs and error messages only
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Whether a background task has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Done,
}

/// Handle to a command running in the background
///
/// The handle owns the process and its output buffers until it is joined.
/// Dropping an unjoined handle does not stop the process.
pub struct BackgroundTask {
    kind: TaskKind,
    command: String,
    started_at: DateTime<Utc>,
    // exactly one of these is set
    handle: Option<JoinHandle<std::io::Result<CommandOutput>>>,
    output: Option<CommandOutput>,
}

impl BackgroundTask {
    /// Spawns `output` onto the runtime as the body of a background task
    pub fn spawn<F>(kind: TaskKind, command: impl Into<String>, output: F) -> Self
    where
        F: Future<Output = std::io::Result<CommandOutput>> + Send + 'static,
    {
        Self {
            kind,
            command: command.into(),
            started_at: Utc::now(),
            handle: Some(tokio::spawn(output)),
            output: None,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Checks for completion without blocking
    pub fn poll(&self) -> TaskStatus {
        match &self.handle {
            Some(handle) if !handle.is_finished() => TaskStatus::Running,
            _ => TaskStatus::Done,
        }
    }

    /// Waits for the command to finish and returns its output
    ///
    /// The first join consumes the process; later joins return the cached
    /// output. A command that could not be waited on reports exit code -1.
    pub async fn join(&mut self) -> &CommandOutput {
        let Some(handle) = self.handle.take() else {
            return self
                .output
                .get_or_insert_with(|| CommandOutput::failed("task output is unavailable"));
        };

        let output = match handle.await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Failed to wait for `{}`: {}", self.command, e);
                CommandOutput::failed(format!("failed to wait for command: {}", e))
            }
            Err(e) => {
                warn!("Background task for `{}` did not complete: {}", self.command, e);
                CommandOutput::failed(format!("background task did not complete: {}", e))
            }
        };

        let elapsed = Utc::now() - self.started_at;
        debug!(
            "Joined {} task after {} ms: exit_code={}, stdout_len={}, stderr_len={}",
            self.kind,
            elapsed.num_milliseconds(),
            output.exit_code,
            output.stdout.len(),
            output.stderr.len()
        );

        self.output.insert(output)
    }
}

impl std::fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("kind", &self.kind)
            .field("command", &self.command)
            .field("started_at", &self.started_at)
            .field("status", &self.poll())
            .finish()
    }
}

/// Launches the external commands of a deployment run
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Starts a command in the background with captured output
    ///
    /// # Errors
    /// Returns `NirvanaError::Launch` if the process cannot be started.
    /// A command that starts and then fails is not an error here.
    fn start(&self, kind: TaskKind, spec: CommandSpec) -> Result<BackgroundTask>;

    /// Runs a command attached to the terminal and returns its exit code
    async fn run_attached(&self, spec: CommandSpec) -> Result<i32>;
}

/// Runs commands as local child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    fn start(&self, kind: TaskKind, spec: CommandSpec) -> Result<BackgroundTask> {
        let command_line = spec.display();
        debug!("Starting {} task: {}", kind, command_line);

        let child = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NirvanaError::launch(command_line.clone(), e))?;

        Ok(BackgroundTask::spawn(kind, command_line, async move {
            child.wait_with_output().await.map(CommandOutput::from)
        }))
    }

    async fn run_attached(&self, spec: CommandSpec) -> Result<i32> {
        let command_line = spec.display();
        debug!("Running attached: {}", command_line);

        let status = spec
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| NirvanaError::launch(command_line.clone(), e))?;

        let exit_code = status.code().unwrap_or(-1);
        debug!("`{}` exited with {}", command_line, exit_code);
        Ok(exit_code)
    }
}

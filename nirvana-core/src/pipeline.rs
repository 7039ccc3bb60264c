//! Upgrade pipeline
//!
//! `Pending → DependenciesJoined → PreviewedDiff → Confirmed → Applied`,
//! with `Aborted` reachable from any state. Only a failed dependency update
//! (or a command that cannot be launched) is an error; a failing diff is
//! advisory and a "no" at confirmation is a clean abort.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::console::Console;
use crate::discovery;
use crate::error::{NirvanaError, Result};
use crate::helm::DeployCommands;
use crate::runner::{CommandRunner, TaskStatus};
use crate::domain::task::TaskKind;
use crate::scheduler::{RunEvent, ScheduledRun};

const CONFIRM_PROMPT: &str = "Do the above changes look correct?";

/// Where the pipeline currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    DependenciesJoined,
    PreviewedDiff,
    Confirmed,
    Applied,
    Aborted,
}

/// How a pipeline run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The upgrade ran; its exit code is the run's final status
    Applied { exit_code: i32 },
    /// The operator declined at confirmation
    Aborted,
}

/// Sequences the dependency join, diff preview, confirmation and upgrade
pub struct UpgradePipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    console: &'a dyn Console,
    state: PipelineState,
    trace: Vec<RunEvent>,
}

impl<'a> UpgradePipeline<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            config,
            runner,
            console,
            state: PipelineState::Pending,
            trace: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The scheduler's trace extended with the pipeline's own steps
    pub fn trace(&self) -> &[RunEvent] {
        &self.trace
    }

    /// Runs the pipeline for a scheduled run
    ///
    /// # Errors
    /// `DependencyUpdateFailed` if the dependency update exited non-zero,
    /// `Launch` if diff or upgrade could not be started, or a console error.
    pub async fn run(&mut self, scheduled: ScheduledRun) -> Result<PipelineOutcome> {
        let result = self.execute(scheduled).await;
        if !matches!(result, Ok(PipelineOutcome::Applied { .. })) {
            self.transition(PipelineState::Aborted);
        }
        result
    }

    async fn execute(&mut self, scheduled: ScheduledRun) -> Result<PipelineOutcome> {
        let ScheduledRun {
            base_dir,
            inputs,
            mut dependency_update,
            trace,
        } = scheduled;
        self.trace = trace;

        self.console.show_summary(&inputs);

        if dependency_update.poll() == TaskStatus::Running {
            self.console
                .status("Waiting for helm dependency update to finish...");
        }
        let update = dependency_update.join().await;
        self.record(RunEvent::Joined(TaskKind::DependencyUpdate));
        if !update.success() {
            warn!(
                "Dependency update exited with {}: {}",
                update.exit_code,
                update.stderr.trim()
            );
            return Err(NirvanaError::DependencyUpdateFailed {
                stderr: update.stderr.clone(),
            });
        }
        self.transition(PipelineState::DependenciesJoined);

        let commands = DeployCommands::new(self.config, &base_dir);
        let values_files =
            discovery::release_values_files(&base_dir, &inputs.service, &inputs.environment);
        debug!("Values files: {:?}", values_files);

        self.console.section("HELM DIFF OUTPUT");
        let diff_exit_code = self
            .runner
            .run_attached(commands.diff(&inputs, &values_files))
            .await?;
        self.record(RunEvent::Diffed);
        self.console.section("HELM DIFF OUTPUT");
        if diff_exit_code != 0 {
            warn!("helm diff exited with {}, continuing", diff_exit_code);
        }
        self.transition(PipelineState::PreviewedDiff);

        if !self.console.confirm(CONFIRM_PROMPT)? {
            info!("Upgrade declined");
            return Ok(PipelineOutcome::Aborted);
        }
        self.transition(PipelineState::Confirmed);

        self.console.section("RUNNING HELM UPGRADE");
        let exit_code = self
            .runner
            .run_attached(commands.upgrade(&inputs, &values_files))
            .await?;
        self.record(RunEvent::Upgraded);
        self.transition(PipelineState::Applied);

        info!(
            "helm upgrade for {} in {} exited with {}",
            inputs.service, inputs.namespace, exit_code
        );
        Ok(PipelineOutcome::Applied { exit_code })
    }

    fn record(&mut self, event: RunEvent) {
        debug!("{:?}", event);
        self.trace.push(event);
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

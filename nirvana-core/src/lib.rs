//! Nirvana Core
//!
//! Orchestration for interactive helm deployments.
//!
//! This crate contains:
//! - Runner: background and attached subprocesses with captured output
//! - Discovery: service chart directories and their environment values files
//! - Resolver: how each deployment input is obtained
//! - Scheduler: when background commands start and where they are joined
//! - Pipeline: dependency join, diff preview, confirmation and upgrade

pub mod config;
pub mod console;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod helm;
pub mod pipeline;
pub mod preflight;
pub mod resolver;
pub mod runner;
pub mod scheduler;
pub mod values;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use console::Console;
pub use domain::inputs::{InputKind, RequestedInputs, ResolvedInputs};
pub use domain::task::{CommandOutput, TaskKind};
pub use error::{NirvanaError, Result};
pub use pipeline::{PipelineOutcome, PipelineState, UpgradePipeline};
pub use runner::{BackgroundTask, CommandRunner, CommandSpec, ProcessRunner, TaskStatus};
pub use scheduler::{RunEvent, ScheduledRun, Scheduler};

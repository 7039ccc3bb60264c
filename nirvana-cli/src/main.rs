//! helm-nirvana
//!
//! Interactive helm deployment helper: pick a service, namespace,
//! environment and image tag, review the diff, then upgrade.

mod render;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use nirvana_core::{
    Config, NirvanaError, PipelineOutcome, ProcessRunner, RequestedInputs, Scheduler,
    UpgradePipeline, preflight,
};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::terminal::TerminalConsole;

/// Exit status when the operator stops the run
const USER_ABORT_EXIT_CODE: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "helm-nirvana")]
#[command(about = "Interactive helm diff and upgrade for service charts", long_about = None)]
struct Cli {
    /// Target namespace (chosen from kubens if omitted)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Service chart directory to deploy
    #[arg(short, long)]
    service_name: Option<String>,

    /// Environment, i.e. the `values-<env>.yaml` file to apply
    #[arg(short, long)]
    env_name: Option<String>,

    /// Image tag (defaults to the currently deployed tag)
    #[arg(short = 't', long)]
    image_tag: Option<String>,

    /// helm executable
    #[arg(long, env = "HELM_NIRVANA_HELM", default_value = "helm")]
    helm_bin: String,

    /// Namespace lister
    #[arg(long, env = "HELM_NIRVANA_KUBENS", default_value = "kubens")]
    kubens_bin: String,

    /// Fuzzy picker for interactive choices
    #[arg(long, env = "HELM_NIRVANA_FZF", default_value = "fzf")]
    fzf_bin: String,

    /// Directory holding the service charts, used when it exists
    #[arg(long, env = "HELM_NIRVANA_DEPLOYMENT_DIR", default_value = "deployment")]
    deployment_dir: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn requested(&self) -> RequestedInputs {
        RequestedInputs {
            service: self.service_name.clone(),
            namespace: self.namespace.clone(),
            environment: self.env_name.clone(),
            image_tag: self.image_tag.clone(),
        }
        .normalized()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(PipelineOutcome::Applied { exit_code }) => exit_status(exit_code),
        Ok(PipelineOutcome::Aborted) => ExitCode::from(USER_ABORT_EXIT_CODE),
        Err(e) if is_user_abort(&e) => ExitCode::from(USER_ABORT_EXIT_CODE),
        Err(e) => {
            render::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<PipelineOutcome> {
    let requested = cli.requested();

    let config = Config::from_current_dir()?
        .with_helm_bin(cli.helm_bin)
        .with_kubens_bin(cli.kubens_bin)
        .with_fzf_bin(cli.fzf_bin)
        .with_deployment_dir(cli.deployment_dir);
    config.validate()?;
    debug!("Loaded configuration: {:?}", config);

    preflight::check_requirements(&config, &requested)?;

    let runner = ProcessRunner::new();
    let console = TerminalConsole::new(config.fzf_bin.clone());

    let scheduled = Scheduler::new(&config, &runner, &console)
        .run(requested)
        .await
        .context("Failed to resolve the deployment target")?;

    let mut pipeline = UpgradePipeline::new(&config, &runner, &console);
    let outcome = pipeline.run(scheduled).await?;
    debug!("Pipeline finished in state {:?}", pipeline.state());
    debug!("Run trace: {:?}", pipeline.trace());

    Ok(outcome)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "helm_nirvana=debug,nirvana_core=debug"
    } else {
        "warn"
    };

    // stdout belongs to prompts and helm output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn is_user_abort(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NirvanaError>()
        .is_some_and(NirvanaError::is_user_abort)
}

/// Maps the upgrade's exit code onto the process status
fn exit_status(exit_code: i32) -> ExitCode {
    match u8::try_from(exit_code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

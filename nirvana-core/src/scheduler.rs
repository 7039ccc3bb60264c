//! Dependency scheduler
//!
//! Drives input resolution in a fixed order and launches each background
//! command at the earliest point its inputs exist:
//!
//! 1. Namespace not supplied: start listing namespaces
//! 2. Resolve the service
//! 3. Start the chart dependency update for the service
//! 4. Namespace not supplied: join the listing, choose the namespace
//! 5. Image tag not supplied: start fetching the deployed values
//! 6. Resolve the environment
//! 7. Image tag not supplied: join the values fetch, prompt for the tag
//!
//! The base path is resolved before step 1 because it is the working
//! directory of every command, the namespace listing included.
//!
//! Results are joined only where they are consumed. The dependency update
//! is handed to the upgrade pipeline still pending.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::console::Console;
use crate::discovery;
use crate::domain::inputs::{InputKind, RequestedInputs, ResolvedInputs};
use crate::domain::task::{CommandOutput, TaskKind};
use crate::error::Result;
use crate::helm::DeployCommands;
use crate::resolver::{self, Resolution, Source};
use crate::runner::{BackgroundTask, CommandRunner, CommandSpec};

/// A step of a run, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Resolved(InputKind),
    Started(TaskKind),
    Joined(TaskKind),
    /// The attached diff preview ran
    Diffed,
    /// The attached upgrade ran
    Upgraded,
}

/// Everything the upgrade pipeline needs from scheduling
#[derive(Debug)]
pub struct ScheduledRun {
    /// Directory holding the service charts
    pub base_dir: PathBuf,
    pub inputs: ResolvedInputs,
    /// Started as soon as the service was known, not joined yet
    pub dependency_update: BackgroundTask,
    pub trace: Vec<RunEvent>,
}

enum NamespaceSource {
    Supplied(String),
    Listing(BackgroundTask),
}

enum ImageTagSource {
    Supplied(String),
    Fetching(BackgroundTask),
}

/// Orders input resolution and background commands for one run
pub struct Scheduler<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    console: &'a dyn Console,
    trace: Vec<RunEvent>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            config,
            runner,
            console,
            trace: Vec::new(),
        }
    }

    /// Resolves all four inputs, overlapping background commands with prompts
    ///
    /// # Errors
    /// Fails on launch errors, discovery errors, empty candidate lists and
    /// cancelled prompts. Failed background commands are not errors here.
    pub async fn run(mut self, requested: RequestedInputs) -> Result<ScheduledRun> {
        let requested = requested.normalized();
        for input in requested.supplied() {
            self.record(RunEvent::Resolved(input));
        }
        let RequestedInputs {
            service,
            namespace,
            environment,
            image_tag,
        } = requested;

        let base_dir =
            discovery::resolve_base_dir(&self.config.working_dir, &self.config.deployment_dir);
        let commands = DeployCommands::new(self.config, &base_dir);

        let namespace = match namespace {
            Some(namespace) => NamespaceSource::Supplied(namespace),
            None => NamespaceSource::Listing(
                self.start(TaskKind::ListNamespaces, commands.list_namespaces())?,
            ),
        };

        let service = resolver::resolve_service(self.console, &base_dir, service)?;
        let service = self.resolved(InputKind::Service, service);

        let dependency_update =
            self.start(TaskKind::DependencyUpdate, commands.dependency_update(&service))?;

        let namespace = match namespace {
            NamespaceSource::Supplied(namespace) => namespace,
            NamespaceSource::Listing(mut listing) => {
                let listing = self.join(&mut listing).await;
                let namespace = resolver::choose_namespace(self.console, &listing)?;
                self.resolved(InputKind::Namespace, namespace)
            }
        };

        let image_tag = match image_tag {
            Some(image_tag) => ImageTagSource::Supplied(image_tag),
            None => ImageTagSource::Fetching(
                self.start(TaskKind::FetchValues, commands.get_values(&namespace, &service))?,
            ),
        };

        let environment = resolver::resolve_environment(
            self.console,
            &base_dir,
            &service,
            &namespace,
            environment,
        )?;
        let environment = self.resolved(InputKind::Environment, environment);

        let image_tag = match image_tag {
            ImageTagSource::Supplied(image_tag) => image_tag,
            ImageTagSource::Fetching(mut values_fetch) => {
                let values = self.join(&mut values_fetch).await;
                let image_tag = resolver::prompt_image_tag(
                    self.console,
                    Some(&values),
                    &self.config.default_image_tag,
                )?;
                self.resolved(InputKind::ImageTag, image_tag)
            }
        };

        let inputs = ResolvedInputs::new(service, namespace, environment, image_tag)?;
        info!(
            "Resolved deployment: service={} namespace={} environment={} image_tag={}",
            inputs.service, inputs.namespace, inputs.environment, inputs.image_tag
        );

        Ok(ScheduledRun {
            base_dir,
            inputs,
            dependency_update,
            trace: self.trace,
        })
    }

    fn start(&mut self, kind: TaskKind, spec: CommandSpec) -> Result<BackgroundTask> {
        let task = self.runner.start(kind, spec)?;
        self.record(RunEvent::Started(kind));
        Ok(task)
    }

    async fn join(&mut self, task: &mut BackgroundTask) -> CommandOutput {
        let output = task.join().await.clone();
        self.record(RunEvent::Joined(task.kind()));
        output
    }

    fn resolved(&mut self, input: InputKind, resolution: Resolution) -> String {
        // Supplied values were recorded when the run began
        if resolution.source == Source::Chosen {
            self.record(RunEvent::Resolved(input));
        }
        resolution.value
    }

    fn record(&mut self, event: RunEvent) {
        debug!("{:?}", event);
        self.trace.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NirvanaError;
    use crate::testing::{FakeRunner, Interaction, ScriptedConsole};
    use std::fs;
    use std::path::Path;

    fn chart_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let deployment = dir.path().join("deployment");
        fs::create_dir(&deployment).unwrap();
        for (service, envs) in [("api", vec!["dev", "prod", "staging"]), ("worker", vec!["dev"])] {
            fs::create_dir(deployment.join(service)).unwrap();
            for env in envs {
                fs::write(deployment.join(service).join(format!("values-{}.yaml", env)), "")
                    .unwrap();
            }
        }
        dir
    }

    fn runner() -> FakeRunner {
        FakeRunner::new()
            .with_output(TaskKind::ListNamespaces, "default\n\nprod\n", "", 0)
            .with_output(
                TaskKind::FetchValues,
                "global:\n  image:\n    tag: v1.2.3\n",
                "",
                0,
            )
    }

    fn position(trace: &[RunEvent], event: RunEvent) -> usize {
        trace
            .iter()
            .position(|e| *e == event)
            .unwrap_or_else(|| panic!("{:?} missing from {:?}", event, trace))
    }

    /// Every started task comes after the inputs it is scoped to
    fn assert_prerequisites_respected(trace: &[RunEvent]) {
        for (index, event) in trace.iter().enumerate() {
            let prerequisites: &[InputKind] = match event {
                RunEvent::Started(TaskKind::ListNamespaces) => &[],
                RunEvent::Started(TaskKind::DependencyUpdate) => &[InputKind::Service],
                RunEvent::Started(TaskKind::FetchValues) => {
                    &[InputKind::Service, InputKind::Namespace]
                }
                _ => continue,
            };
            for input in prerequisites {
                assert!(
                    position(trace, RunEvent::Resolved(*input)) < index,
                    "{:?} started before {:?} was resolved: {:?}",
                    event,
                    input,
                    trace
                );
            }
        }
    }

    fn config(dir: &Path) -> Config {
        Config::new(dir.to_path_buf())
    }

    #[tokio::test]
    async fn test_fully_interactive_run_order() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = runner();
        let console = ScriptedConsole::new(vec!["api", "prod", "prod", ""]);

        let run = Scheduler::new(&config, &runner, &console)
            .run(RequestedInputs::default())
            .await
            .unwrap();

        assert_eq!(
            run.inputs,
            ResolvedInputs::new("api", "prod", "prod", "v1.2.3").unwrap()
        );
        assert_eq!(run.base_dir, dir.path().join("deployment"));
        assert_eq!(
            run.trace,
            vec![
                RunEvent::Started(TaskKind::ListNamespaces),
                RunEvent::Resolved(InputKind::Service),
                RunEvent::Started(TaskKind::DependencyUpdate),
                RunEvent::Joined(TaskKind::ListNamespaces),
                RunEvent::Resolved(InputKind::Namespace),
                RunEvent::Started(TaskKind::FetchValues),
                RunEvent::Resolved(InputKind::Environment),
                RunEvent::Joined(TaskKind::FetchValues),
                RunEvent::Resolved(InputKind::ImageTag),
            ]
        );
        assert_prerequisites_respected(&run.trace);

        assert_eq!(
            console.interactions(),
            vec![
                Interaction::Choose {
                    prompt: "Service to deploy > ".to_string(),
                    options: vec!["api".to_string(), "worker".to_string()],
                },
                Interaction::Choose {
                    prompt: "Target namespace > ".to_string(),
                    options: vec!["default".to_string(), "prod".to_string()],
                },
                Interaction::Choose {
                    prompt: "Target env > ".to_string(),
                    options: vec!["prod".to_string(), "dev".to_string(), "staging".to_string()],
                },
                Interaction::Input {
                    prompt: "Image tag".to_string(),
                    default: "v1.2.3".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_background_commands_are_scoped_to_resolved_inputs() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = runner();
        let console = ScriptedConsole::new(vec!["worker", "prod", "dev", "v7"]);

        let run = Scheduler::new(&config, &runner, &console)
            .run(RequestedInputs::default())
            .await
            .unwrap();
        assert_eq!(run.inputs.image_tag, "v7");

        let started = runner.started();
        let (_, update) = &started[1];
        assert_eq!(update.display(), "helm dependency update worker");
        assert_eq!(update.current_dir, Some(dir.path().join("deployment")));

        let (kind, fetch) = &started[2];
        assert_eq!(*kind, TaskKind::FetchValues);
        assert_eq!(
            fetch.display(),
            "helm get values --namespace prod worker --output yaml"
        );
    }

    #[tokio::test]
    async fn test_all_supplied_starts_only_dependency_update() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let runner = runner();
        let console = ScriptedConsole::new(vec![]);

        let requested = RequestedInputs {
            service: Some("api".to_string()),
            namespace: Some("prod".to_string()),
            environment: Some("production".to_string()),
            image_tag: Some("v2".to_string()),
        };
        let run = Scheduler::new(&config, &runner, &console)
            .run(requested)
            .await
            .unwrap();

        assert_eq!(runner.started_kinds(), vec![TaskKind::DependencyUpdate]);
        assert!(console.interactions().is_empty());
        assert_eq!(run.base_dir, dir.path());
        assert_eq!(
            run.inputs,
            ResolvedInputs::new("api", "prod", "production", "v2").unwrap()
        );
        assert_prerequisites_respected(&run.trace);
    }

    #[tokio::test]
    async fn test_supplied_namespace_skips_listing() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = runner();
        let console = ScriptedConsole::new(vec!["api", "staging", ""]);

        let requested = RequestedInputs {
            namespace: Some("prod".to_string()),
            ..Default::default()
        };
        let run = Scheduler::new(&config, &runner, &console)
            .run(requested)
            .await
            .unwrap();

        assert_eq!(
            runner.started_kinds(),
            vec![TaskKind::DependencyUpdate, TaskKind::FetchValues]
        );
        assert_eq!(run.inputs.environment, "staging");
        assert_prerequisites_respected(&run.trace);
    }

    #[tokio::test]
    async fn test_supplied_image_tag_skips_values_fetch_and_prompt() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = runner();
        let console = ScriptedConsole::new(vec!["api", "default", "dev"]);

        let requested = RequestedInputs {
            image_tag: Some("v3".to_string()),
            ..Default::default()
        };
        let run = Scheduler::new(&config, &runner, &console)
            .run(requested)
            .await
            .unwrap();

        assert_eq!(
            runner.started_kinds(),
            vec![TaskKind::ListNamespaces, TaskKind::DependencyUpdate]
        );
        assert_eq!(run.inputs.image_tag, "v3");
        assert!(
            !console
                .interactions()
                .iter()
                .any(|i| matches!(i, Interaction::Input { .. }))
        );
    }

    #[tokio::test]
    async fn test_failed_values_fetch_offers_latest() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = FakeRunner::new()
            .with_output(TaskKind::ListNamespaces, "prod\n", "", 0)
            .with_output(
                TaskKind::FetchValues,
                "",
                "Error: release: not found",
                1,
            );
        let console = ScriptedConsole::new(vec!["api", "prod", "prod", ""]);

        let run = Scheduler::new(&config, &runner, &console)
            .run(RequestedInputs::default())
            .await
            .unwrap();

        assert_eq!(run.inputs.image_tag, "latest");
    }

    #[tokio::test]
    async fn test_cancelled_choice_stops_run() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = runner();
        let console = ScriptedConsole::new(vec![]);

        let err = Scheduler::new(&config, &runner, &console)
            .run(RequestedInputs::default())
            .await
            .unwrap_err();

        assert!(err.is_user_abort());
        assert_eq!(runner.started_kinds(), vec![TaskKind::ListNamespaces]);
    }

    #[tokio::test]
    async fn test_failed_namespace_listing_is_reported() {
        let dir = chart_tree();
        let config = config(dir.path());
        let runner = FakeRunner::new().with_output(
            TaskKind::ListNamespaces,
            "",
            "error: current-context is not set",
            1,
        );
        let console = ScriptedConsole::new(vec!["api"]);

        let err = Scheduler::new(&config, &runner, &console)
            .run(RequestedInputs::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NirvanaError::NoCandidates {
                input: InputKind::Namespace,
                ..
            }
        ));
        assert!(err.to_string().contains("current-context is not set"));
    }
}

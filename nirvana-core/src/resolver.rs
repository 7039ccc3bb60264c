//! Selection resolution
//!
//! Each input comes from, in order of priority:
//! 1. The command line, used verbatim
//! 2. An interactive choice from discovered or fetched candidates
//!
//! A single candidate is still presented for an explicit choice.

use std::path::Path;
use tracing::debug;

use crate::console::Console;
use crate::discovery;
use crate::domain::inputs::InputKind;
use crate::domain::task::CommandOutput;
use crate::error::{NirvanaError, Result};
use crate::values;

const SERVICE_PROMPT: &str = "Service to deploy > ";
const NAMESPACE_PROMPT: &str = "Target namespace > ";
const ENVIRONMENT_PROMPT: &str = "Target env > ";
const IMAGE_TAG_PROMPT: &str = "Image tag";

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Supplied,
    Chosen,
}

/// A resolved input value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: String,
    pub source: Source,
}

impl Resolution {
    fn supplied(value: String) -> Self {
        Self {
            value,
            source: Source::Supplied,
        }
    }

    fn chosen(value: String) -> Self {
        Self {
            value,
            source: Source::Chosen,
        }
    }
}

/// Resolves the service from the CLI or the charts under `base_dir`
pub fn resolve_service(
    console: &dyn Console,
    base_dir: &Path,
    supplied: Option<String>,
) -> Result<Resolution> {
    if let Some(service) = supplied {
        return Ok(Resolution::supplied(service));
    }

    let services: Vec<String> = discovery::find_services(base_dir)?
        .into_iter()
        .map(|service| service.name)
        .collect();

    choose(console, InputKind::Service, SERVICE_PROMPT, &services).map(Resolution::chosen)
}

/// Splits namespace listing output into choices
pub fn namespace_candidates(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves the namespace from a joined namespace listing
pub fn choose_namespace(console: &dyn Console, listing: &CommandOutput) -> Result<Resolution> {
    let namespaces = namespace_candidates(&listing.stdout);
    if namespaces.is_empty() {
        return Err(NirvanaError::NoCandidates {
            input: InputKind::Namespace,
            detail: listing.stderr.clone(),
        });
    }

    choose(console, InputKind::Namespace, NAMESPACE_PROMPT, &namespaces).map(Resolution::chosen)
}

/// Moves the environment named like `namespace` to the front, if present
///
/// The other environments keep their relative order.
pub fn prioritize_namespace(mut environments: Vec<String>, namespace: &str) -> Vec<String> {
    if let Some(index) = environments.iter().position(|env| env == namespace) {
        let matching = environments.remove(index);
        environments.insert(0, matching);
    }
    environments
}

/// Resolves the environment from the CLI or the service's values files
pub fn resolve_environment(
    console: &dyn Console,
    base_dir: &Path,
    service: &str,
    namespace: &str,
    supplied: Option<String>,
) -> Result<Resolution> {
    if let Some(environment) = supplied {
        return Ok(Resolution::supplied(environment));
    }

    let environments: Vec<String> = discovery::find_environments(&base_dir.join(service))?
        .into_iter()
        .map(|file| file.name)
        .collect();
    let environments = prioritize_namespace(environments, namespace);

    choose(
        console,
        InputKind::Environment,
        ENVIRONMENT_PROMPT,
        &environments,
    )
    .map(Resolution::chosen)
}

/// Prompts for the image tag, offering the deployed tag as the default
///
/// `values_output` is the joined values fetch, or `None` if none was run.
pub fn prompt_image_tag(
    console: &dyn Console,
    values_output: Option<&CommandOutput>,
    fallback: &str,
) -> Result<Resolution> {
    let default = values::deployed_image_tag(values_output).tag_or(fallback);
    debug!("Offering image tag default {}", default);

    let answer = console.input(IMAGE_TAG_PROMPT, &default)?;
    let answer = answer.trim();
    let tag = if answer.is_empty() { default } else { answer.to_string() };
    Ok(Resolution::chosen(tag))
}

fn choose(
    console: &dyn Console,
    input: InputKind,
    prompt: &str,
    candidates: &[String],
) -> Result<String> {
    if candidates.is_empty() {
        return Err(NirvanaError::no_candidates(input));
    }

    debug!("Choosing {} from {} candidate(s)", input, candidates.len());
    let choice = console.choose(prompt, candidates)?;
    if choice.trim().is_empty() {
        return Err(NirvanaError::EmptyInput(input));
    }
    Ok(choice)
}

//! Service chart discovery
//!
//! A service is a directory under the base directory holding at least one
//! environment values file named `values-<env>.yaml` or `values-<env>.yml`.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{NirvanaError, Result};

/// Recognised values file extensions, in order of preference
const VALUES_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// An environment values file inside a service directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFile {
    /// Environment name, e.g. `staging`
    pub name: String,
    /// File name, e.g. `values-staging.yaml`
    pub file_name: String,
}

/// A deployable service chart directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChart {
    pub name: String,
    pub environments: Vec<EnvironmentFile>,
}

/// Picks the directory holding the service charts
///
/// The deployment subdirectory wins when it exists.
pub fn resolve_base_dir(working_dir: &Path, deployment_dir: &str) -> PathBuf {
    let candidate = working_dir.join(deployment_dir);
    if candidate.is_dir() {
        debug!("Using deployment directory {}", candidate.display());
        candidate
    } else {
        working_dir.to_path_buf()
    }
}

/// Extracts `<env>` from `values-<env>.yaml` or `values-<env>.yml`
pub fn environment_name(file_name: &str) -> Option<&str> {
    let rest = file_name.strip_prefix("values-")?;
    VALUES_EXTENSIONS
        .iter()
        .find_map(|ext| rest.strip_suffix(ext)?.strip_suffix('.'))
        .filter(|env| !env.is_empty())
}

/// Lists the environment values files of a service directory
///
/// Sorted by environment name; when both extensions exist for one
/// environment the `.yaml` file is kept.
pub fn find_environments(service_dir: &Path) -> Result<Vec<EnvironmentFile>> {
    let entries = std::fs::read_dir(service_dir).map_err(|source| NirvanaError::Discovery {
        path: service_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(EnvironmentFile, usize)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| NirvanaError::Discovery {
            path: service_dir.to_path_buf(),
            source,
        })?;

        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(name) = environment_name(&file_name) else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }

        let rank = if file_name.ends_with(".yaml") { 0 } else { 1 };
        files.push((
            EnvironmentFile {
                name: name.to_string(),
                file_name,
            },
            rank,
        ));
    }

    files.sort_by(|(a, a_rank), (b, b_rank)| a.name.cmp(&b.name).then(a_rank.cmp(b_rank)));
    files.dedup_by(|(later, _), (kept, _)| later.name == kept.name);

    Ok(files.into_iter().map(|(file, _)| file).collect())
}

/// Lists every service chart directory under `base_dir`, sorted by name
pub fn find_services(base_dir: &Path) -> Result<Vec<ServiceChart>> {
    let entries = std::fs::read_dir(base_dir).map_err(|source| NirvanaError::Discovery {
        path: base_dir.to_path_buf(),
        source,
    })?;

    let mut services = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| NirvanaError::Discovery {
            path: base_dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };

        match find_environments(&path) {
            Ok(environments) if !environments.is_empty() => {
                services.push(ServiceChart { name, environments });
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    services.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(
        "Discovered {} service(s) in {}",
        services.len(),
        base_dir.display()
    );
    Ok(services)
}

/// Values files passed to helm for a release, relative to `base_dir`
///
/// The chart's own `values.yaml` comes first when present, followed by the
/// environment file. An environment without a file on disk still yields
/// `values-<env>.yaml` so that helm reports the missing file.
pub fn release_values_files(base_dir: &Path, service: &str, environment: &str) -> Vec<PathBuf> {
    let service_dir = Path::new(service);
    let existing = |stem: &str| {
        VALUES_EXTENSIONS
            .iter()
            .map(|ext| service_dir.join(format!("{}.{}", stem, ext)))
            .find(|relative| base_dir.join(relative).is_file())
    };

    let mut files = Vec::new();
    if let Some(chart_values) = existing("values") {
        files.push(chart_values);
    }

    let env_stem = format!("values-{}", environment);
    files.push(
        existing(&env_stem).unwrap_or_else(|| service_dir.join(format!("{}.yaml", env_stem))),
    );
    files
}

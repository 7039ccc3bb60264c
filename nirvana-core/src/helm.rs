//! helm and kubens command construction
//!
//! Every command is built as an argument vector and runs in the resolved
//! base directory, so chart paths stay relative to it.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::domain::inputs::ResolvedInputs;
use crate::runner::CommandSpec;

/// Builds the external commands for one base directory
#[derive(Debug, Clone)]
pub struct DeployCommands {
    helm_bin: String,
    kubens_bin: String,
    base_dir: PathBuf,
}

impl DeployCommands {
    pub fn new(config: &Config, base_dir: &Path) -> Self {
        Self {
            helm_bin: config.helm_bin.clone(),
            kubens_bin: config.kubens_bin.clone(),
            base_dir: base_dir.to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `kubens` prints one namespace per line when its output is not a TTY
    pub fn list_namespaces(&self) -> CommandSpec {
        CommandSpec::new(&self.kubens_bin).current_dir(&self.base_dir)
    }

    pub fn dependency_update(&self, service: &str) -> CommandSpec {
        self.helm().args(["dependency", "update", service])
    }

    /// Values of the deployed release; the release is named after the service
    pub fn get_values(&self, namespace: &str, service: &str) -> CommandSpec {
        self.helm()
            .args(["get", "values", "--namespace", namespace, service])
            .args(["--output", "yaml"])
    }

    /// Dry-run comparison of the deployed release against the upgrade
    ///
    /// `values_files` are relative to the base directory, in merge order.
    pub fn diff(&self, inputs: &ResolvedInputs, values_files: &[PathBuf]) -> CommandSpec {
        self.helm()
            .args(["diff", "upgrade", "--namespace", inputs.namespace.as_str()])
            .arg("--allow-unreleased")
            .args(release_args(inputs, values_files))
    }

    /// Upgrade, installing the release if it does not exist yet
    pub fn upgrade(&self, inputs: &ResolvedInputs, values_files: &[PathBuf]) -> CommandSpec {
        self.helm()
            .args(["upgrade", "--install", "--namespace", inputs.namespace.as_str()])
            .args(release_args(inputs, values_files))
    }

    fn helm(&self) -> CommandSpec {
        CommandSpec::new(&self.helm_bin).current_dir(&self.base_dir)
    }
}

/// Release name, chart path, values files and overrides shared by diff and upgrade
fn release_args(inputs: &ResolvedInputs, values_files: &[PathBuf]) -> Vec<String> {
    let mut args = vec![inputs.service.clone(), inputs.service.clone()];

    for file in values_files {
        args.push("-f".to_string());
        args.push(file.to_string_lossy().to_string());
    }

    // --set-string keeps tags like 1.10 from being read as numbers
    args.push("--set-string".to_string());
    args.push(format!("global.namespace={}", inputs.namespace));
    args.push("--set-string".to_string());
    args.push(format!("global.image.tag={}", inputs.image_tag));

    args
}

//! Deployment helper configuration
//!
//! Names of the external tools, where service charts live, and the image
//! tag offered when no deployed tag can be found.

use std::path::PathBuf;

use crate::error::{NirvanaError, Result};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the tool was started from
    pub working_dir: PathBuf,

    /// Subdirectory of `working_dir` holding service charts, if present
    pub deployment_dir: String,

    /// helm executable (name on PATH or explicit path)
    pub helm_bin: String,

    /// Namespace lister for the current cluster context
    pub kubens_bin: String,

    /// Fuzzy picker used for interactive choices
    pub fzf_bin: String,

    /// Tag offered when the deployed values carry none
    pub default_image_tag: String,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            deployment_dir: "deployment".to_string(),
            helm_bin: "helm".to_string(),
            kubens_bin: "kubens".to_string(),
            fzf_bin: "fzf".to_string(),
            default_image_tag: "latest".to_string(),
        }
    }

    /// Creates a configuration rooted at the process working directory
    pub fn from_current_dir() -> Result<Self> {
        let working_dir = std::env::current_dir().map_err(|source| NirvanaError::Discovery {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::new(working_dir))
    }

    pub fn with_helm_bin(mut self, helm_bin: impl Into<String>) -> Self {
        self.helm_bin = helm_bin.into();
        self
    }

    pub fn with_kubens_bin(mut self, kubens_bin: impl Into<String>) -> Self {
        self.kubens_bin = kubens_bin.into();
        self
    }

    pub fn with_fzf_bin(mut self, fzf_bin: impl Into<String>) -> Self {
        self.fzf_bin = fzf_bin.into();
        self
    }

    pub fn with_deployment_dir(mut self, deployment_dir: impl Into<String>) -> Self {
        self.deployment_dir = deployment_dir.into();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("helm_bin", &self.helm_bin),
            ("kubens_bin", &self.kubens_bin),
            ("fzf_bin", &self.fzf_bin),
            ("default_image_tag", &self.default_image_tag),
        ] {
            if value.trim().is_empty() {
                return Err(NirvanaError::InvalidConfig(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }

        if self.deployment_dir.is_empty() {
            return Err(NirvanaError::InvalidConfig(
                "deployment_dir cannot be empty".to_string(),
            ));
        }

        if self.deployment_dir.contains(['/', '\\']) {
            return Err(NirvanaError::InvalidConfig(
                "deployment_dir must be a single directory name".to_string(),
            ));
        }

        Ok(())
    }
}

//! Background task domain types

use serde::{Deserialize, Serialize};

/// The background commands a run may launch
///
/// Each kind is started at most once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// List the namespaces of the current cluster context
    ListNamespaces,
    /// Update the chart dependencies of the selected service
    DependencyUpdate,
    /// Fetch the values currently deployed for namespace + service
    FetchValues,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::ListNamespaces => "list namespaces",
            TaskKind::DependencyUpdate => "dependency update",
            TaskKind::FetchValues => "fetch values",
        };
        f.write_str(name)
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Output of a command that could not be awaited to completion
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: -1,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        let mut stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = match output.status.code() {
            Some(code) => code,
            None => {
                stderr.push_str(&format!("terminated by signal ({})", output.status));
                -1
            }
        };
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
            exit_code,
        }
    }
}

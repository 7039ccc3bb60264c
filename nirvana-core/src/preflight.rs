//! Requirement checks before a run
//!
//! Verifies the external tools a run will need can be found, without
//! launching any of them.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::inputs::RequestedInputs;
use crate::error::{NirvanaError, Result};

/// Locates an executable by explicit path or on `PATH`
///
/// Files without the executable bit are not considered found.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Checks that the tools needed for `requested` are installed
///
/// helm is always needed; kubens only when the namespace must be chosen.
pub fn check_requirements(config: &Config, requested: &RequestedInputs) -> Result<()> {
    let mut required = vec![config.helm_bin.as_str()];
    if requested.namespace.is_none() {
        required.push(config.kubens_bin.as_str());
    }

    for program in required {
        match find_executable(program) {
            Some(path) => debug!("Found {} at {}", program, path.display()),
            None => return Err(NirvanaError::MissingTool(program.to_string())),
        }
    }

    if find_executable(&config.fzf_bin).is_none() {
        info!(
            "{} not found, interactive choices will use a select list",
            config.fzf_bin
        );
    }

    Ok(())
}

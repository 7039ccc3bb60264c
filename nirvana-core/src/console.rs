//! Operator interaction
//!
//! The scheduler and pipeline never touch the terminal directly; they go
//! through this trait so runs can be scripted in tests.

use crate::domain::inputs::ResolvedInputs;
use crate::error::Result;

/// Interactive prompts and progress output
pub trait Console: Send + Sync {
    /// Lets the operator pick one of `options`
    ///
    /// # Errors
    /// Returns `NirvanaError::Cancelled` if the operator backs out.
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String>;

    /// Asks for free text, returning `default` on an empty answer
    fn input(&self, prompt: &str, default: &str) -> Result<String>;

    /// Asks a yes/no question; anything but an explicit yes is `false`
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Shows the resolved deployment target
    fn show_summary(&self, inputs: &ResolvedInputs);

    /// Shows a one-line progress notice
    fn status(&self, message: &str);

    /// Shows a section banner around attached command output
    fn section(&self, title: &str);
}

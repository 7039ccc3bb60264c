//! Interactive terminal console
//!
//! Choices go through fzf when it is installed and fall back to a dialoguer
//! select list otherwise. Free text and confirmations are dialoguer prompts;
//! Esc, Ctrl-C or end of input count as backing out.

use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use nirvana_core::{Console, NirvanaError, ResolvedInputs, Result};
use std::io::{self, Write};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::render;

/// fzf exits with 1 when nothing matched and 130 on Esc or Ctrl-C
const FZF_CANCEL_CODES: [i32; 2] = [1, 130];

pub struct TerminalConsole {
    fzf_bin: String,
}

impl TerminalConsole {
    pub fn new(fzf_bin: impl Into<String>) -> Self {
        Self {
            fzf_bin: fzf_bin.into(),
        }
    }

    /// Runs fzf over `options`; `None` when fzf cannot be launched
    fn choose_with_fzf(&self, prompt: &str, options: &[String]) -> Option<Result<String>> {
        let spawned = Command::new(&self.fzf_bin)
            .args(["--prompt", prompt, "--height", "40%", "--reverse", "--no-multi"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} not installed, using a select list", self.fzf_bin);
                return None;
            }
            Err(e) => return Some(Err(NirvanaError::Console(e))),
        };

        Some(feed_and_collect(&mut child, options))
    }

    fn choose_from_menu(&self, prompt: &str, options: &[String]) -> Result<String> {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.trim_end_matches(['>', ' ']))
            .items(options)
            .default(0)
            .interact_opt()
            .map_err(console_error)?;

        selection
            .and_then(|index| options.get(index))
            .cloned()
            .ok_or(NirvanaError::Cancelled)
    }
}

fn feed_and_collect(child: &mut std::process::Child, options: &[String]) -> Result<String> {
    if let Some(mut stdin) = child.stdin.take() {
        let listing = options.join("\n");
        if let Err(e) = stdin.write_all(listing.as_bytes()) {
            // fzf may close its input early once it has drawn the list
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(NirvanaError::Console(e));
            }
        }
    }

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        io::Read::read_to_string(&mut out, &mut stdout).map_err(NirvanaError::Console)?;
    }
    let status = child.wait().map_err(NirvanaError::Console)?;

    match status.code() {
        Some(0) => match stdout.lines().next().map(str::trim) {
            Some(choice) if !choice.is_empty() => Ok(choice.to_string()),
            _ => Err(NirvanaError::Cancelled),
        },
        Some(code) if FZF_CANCEL_CODES.contains(&code) => Err(NirvanaError::Cancelled),
        // killed by a signal
        None => Err(NirvanaError::Cancelled),
        Some(code) => {
            warn!("fzf exited with {}", code);
            Err(NirvanaError::Console(io::Error::other(format!(
                "fzf exited with {}",
                code
            ))))
        }
    }
}

/// Maps a prompt failure; an interrupted or closed terminal is a cancel
fn console_error(err: dialoguer::Error) -> NirvanaError {
    match err {
        dialoguer::Error::IO(e)
            if matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
            ) =>
        {
            NirvanaError::Cancelled
        }
        dialoguer::Error::IO(e) => NirvanaError::Console(e),
    }
}

impl Console for TerminalConsole {
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String> {
        match self.choose_with_fzf(prompt, options) {
            Some(choice) => choice,
            None => self.choose_from_menu(prompt, options),
        }
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        let answer = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default.to_string())
            .interact_text()
            .map_err(console_error)?;

        let answer = answer.trim();
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact_opt()
            .map_err(console_error)?
            .ok_or(NirvanaError::Cancelled)
    }

    fn show_summary(&self, inputs: &ResolvedInputs) {
        println!();
        for line in render::summary_table(inputs, true) {
            println!("{}", line);
        }
        println!();
    }

    fn status(&self, message: &str) {
        println!("{}", message.yellow());
    }

    fn section(&self, title: &str) {
        println!("\n{}\n", render::section_banner(title).bold());
    }
}

//! Scripted collaborators for driving runs in tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::console::Console;
use crate::domain::inputs::ResolvedInputs;
use crate::domain::task::{CommandOutput, TaskKind};
use crate::error::{NirvanaError, Result};
use crate::runner::{BackgroundTask, CommandRunner, CommandSpec};

/// Something the code under test asked of the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Choose { prompt: String, options: Vec<String> },
    Input { prompt: String, default: String },
    Confirm { prompt: String },
    Summary(ResolvedInputs),
    Status(String),
    Section(String),
}

/// Console answering prompts from a fixed script
///
/// Running out of answers behaves like the operator cancelling.
pub struct ScriptedConsole {
    answers: Mutex<VecDeque<String>>,
    interactions: Mutex<Vec<Interaction>>,
}

impl ScriptedConsole {
    pub fn new(answers: Vec<&str>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(str::to_string).collect()),
            interactions: Mutex::new(Vec::new()),
        }
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.interactions.lock().unwrap().clone()
    }

    fn record(&self, interaction: Interaction) {
        self.interactions.lock().unwrap().push(interaction);
    }

    fn next_answer(&self) -> Result<String> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(NirvanaError::Cancelled)
    }
}

impl Console for ScriptedConsole {
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String> {
        self.record(Interaction::Choose {
            prompt: prompt.to_string(),
            options: options.to_vec(),
        });
        self.next_answer()
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        self.record(Interaction::Input {
            prompt: prompt.to_string(),
            default: default.to_string(),
        });
        let answer = self.next_answer()?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.record(Interaction::Confirm {
            prompt: prompt.to_string(),
        });
        let answer = self.next_answer()?;
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    fn show_summary(&self, inputs: &ResolvedInputs) {
        self.record(Interaction::Summary(inputs.clone()));
    }

    fn status(&self, message: &str) {
        self.record(Interaction::Status(message.to_string()));
    }

    fn section(&self, title: &str) {
        self.record(Interaction::Section(title.to_string()));
    }
}

/// Runner returning canned outputs instead of launching processes
#[derive(Default)]
pub struct FakeRunner {
    outputs: HashMap<TaskKind, CommandOutput>,
    attached_exit_codes: Mutex<VecDeque<i32>>,
    started: Mutex<Vec<(TaskKind, CommandSpec)>>,
    attached: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output returned when a task of `kind` is joined
    pub fn with_output(mut self, kind: TaskKind, stdout: &str, stderr: &str, exit_code: i32) -> Self {
        self.outputs.insert(
            kind,
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code,
            },
        );
        self
    }

    /// Exit codes of successive attached commands; 0 once exhausted
    pub fn with_attached_exit_codes(self, codes: Vec<i32>) -> Self {
        *self.attached_exit_codes.lock().unwrap() = codes.into();
        self
    }

    pub fn started(&self) -> Vec<(TaskKind, CommandSpec)> {
        self.started.lock().unwrap().clone()
    }

    pub fn started_kinds(&self) -> Vec<TaskKind> {
        self.started().into_iter().map(|(kind, _)| kind).collect()
    }

    pub fn attached(&self) -> Vec<CommandSpec> {
        self.attached.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    fn start(&self, kind: TaskKind, spec: CommandSpec) -> Result<BackgroundTask> {
        let output = self.outputs.get(&kind).cloned().unwrap_or(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        });
        let command = spec.display();
        self.started.lock().unwrap().push((kind, spec));
        Ok(BackgroundTask::spawn(kind, command, async move { Ok(output) }))
    }

    async fn run_attached(&self, spec: CommandSpec) -> Result<i32> {
        self.attached.lock().unwrap().push(spec);
        Ok(self
            .attached_exit_codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(0))
    }
}

//! Command runner abstraction for dispatching control-binary invocations.
//!
//! `CommandRunner` is the trait the reconciler dispatches through.
//! `ProcessRunner` is the production implementation that spawns the program
//! directly with its argv (no shell). `MockRunner` is the test double that
//! records calls and returns preset responses.

use std::cell::RefCell;
use std::process::Command;

use super::CommandLine;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The program could not be started at all.
    #[error("cannot execute {program}: {reason}")]
    Spawn { program: String, reason: String },
    /// The program ran and exited unsuccessfully.
    #[error("exited with {}: {}", exit_label(.code), .stderr.trim())]
    Exit { code: Option<i32>, stderr: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// Trait for executing a command line; `Ok` carries stdout.
pub trait CommandRunner {
    fn run(&self, cmd: &CommandLine) -> Result<String, RunError>;
}

/// Production runner that spawns the program and waits for it.
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, cmd: &CommandLine) -> Result<String, RunError> {
        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .output()
            .map_err(|e| RunError::Spawn {
                program: cmd.program.clone(),
                reason: e.to_string(),
            })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(RunError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

/// Test-double runner that records command lines and returns pre-configured responses.
pub struct MockRunner {
    responses: RefCell<Vec<Result<String, RunError>>>,
    commands: RefCell<Vec<CommandLine>>,
}

impl MockRunner {
    pub fn with_responses(responses: Vec<Result<String, RunError>>) -> Self {
        let mut reversed = responses;
        reversed.reverse();
        MockRunner {
            responses: RefCell::new(reversed),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        MockRunner {
            responses: RefCell::new(Vec::new()),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn executed_commands(&self) -> Vec<CommandLine> {
        self.commands.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.commands.borrow().len()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &CommandLine) -> Result<String, RunError> {
        self.commands.borrow_mut().push(cmd.clone());
        let mut responses = self.responses.borrow_mut();
        if let Some(response) = responses.pop() {
            response
        } else {
            Ok(String::new())
        }
    }
}

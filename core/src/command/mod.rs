//! Command construction and dispatch for the supervisor's control binary.
//!
//! `builder` turns an action plus a declaration into argv tokens; `runner`
//! executes a `CommandLine` (or records it, in tests).

pub mod builder;
pub mod runner;

pub use builder::CommandBuilder;
pub use runner::{CommandRunner, MockRunner, ProcessRunner, RunError};

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fully-formed invocation: `<program> svc <action> <ident> <args...>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandLine {
            program: program.into(),
            args,
        }
    }

    /// The trailing token, if any.
    pub fn last_arg(&self) -> Option<&str> {
        self.args.last().map(|s| s.as_str())
    }

    pub fn has_arg(&self, token: &str) -> bool {
        self.args.iter().any(|a| a == token)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

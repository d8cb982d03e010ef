//! Convergence controller for a single supervised service.
//!
//! Given a declared `DesiredConfig`, probe the supervisor's HTTP status
//! gateway, work out whether the running service already matches, and
//! dispatch the minimal `<tool> svc <action>` commands when it does not.
//! Every action is idempotent: no command is issued when the current state
//! already satisfies the declaration.

pub mod command;
pub mod convergence;
pub mod data;
pub mod error;
pub mod status;
pub mod types;

pub use command::{CommandBuilder, CommandLine, CommandRunner, MockRunner, ProcessRunner, RunError};
pub use convergence::{diff, ChangeSet, Outcome, PollOutcome, Reconciler, WaitCondition};
pub use data::declaration::Declaration;
pub use error::{ConvergeError, Result};
pub use status::{normalize, observe, HttpStatusClient, Probe, ScriptedStatus, StatusSource};
pub use types::{Action, BindingMode, DesiredConfig, ServiceIdent, ServiceSnapshot, Strategy, Topology};

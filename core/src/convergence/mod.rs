//! Convergence engine: diffs desired vs actual state and drives actions.
//!
//! The `diff` module reports which reloadable fields drifted. The `poller`
//! module waits, with a bounded attempt budget, for a service to stop or
//! disappear. The `reconciler` ties probing, diffing, command building and
//! dispatch together into the six lifecycle actions.

pub mod diff;
pub mod poller;
pub mod reconciler;

pub use diff::{diff, ChangeSet, Field, FieldChange};
pub use poller::{ConvergencePoller, PollOutcome, PollPolicy, WaitCondition};
pub use reconciler::{Outcome, Reconciler, DEFAULT_PROGRAM};

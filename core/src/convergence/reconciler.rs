//! Reconciler: the per-action state machine.
//!
//! Each action starts from a fresh probe and decides whether anything needs
//! to be dispatched. Simple actions dispatch at most one command; restart and
//! reload dispatch an unload, block on the `ConvergencePoller`, then run a
//! full load. A timed-out wait aborts before the load half.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::diff::{diff, ChangeSet};
use super::poller::{ConvergencePoller, PollOutcome, PollPolicy, WaitCondition};
use crate::command::{CommandBuilder, CommandLine, CommandRunner};
use crate::error::{ConvergeError, Result};
use crate::status::{observe, StatusSource};
use crate::types::{Action, DesiredConfig, ServiceSnapshot};

pub const DEFAULT_PROGRAM: &str = "hab";

/// What one action did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub action: Action,
    pub service: String,
    /// Commands dispatched, in order. Empty for a no-op.
    pub dispatched: Vec<CommandLine>,
    /// The load carried `--force`.
    pub forced: bool,
    /// Drift that caused the forced load, if any.
    pub changes: ChangeSet,
    /// Result of the wait inside restart/reload.
    pub poll: Option<PollOutcome>,
}

impl Outcome {
    fn new(action: Action, cfg: &DesiredConfig) -> Self {
        Outcome {
            action,
            service: cfg.service.to_string(),
            dispatched: Vec::new(),
            forced: false,
            changes: ChangeSet::default(),
            poll: None,
        }
    }

    /// Nothing was dispatched; the service already matched.
    pub fn is_noop(&self) -> bool {
        self.dispatched.is_empty()
    }
}

pub struct Reconciler<'a, S: StatusSource + ?Sized, R: CommandRunner + ?Sized> {
    status: &'a S,
    runner: &'a R,
    builder: CommandBuilder,
    poll_delay: Duration,
}

impl<'a, S: StatusSource + ?Sized, R: CommandRunner + ?Sized> Reconciler<'a, S, R> {
    pub fn new(status: &'a S, runner: &'a R) -> Self {
        Reconciler {
            status,
            runner,
            builder: CommandBuilder::new(DEFAULT_PROGRAM),
            poll_delay: Duration::from_secs(1),
        }
    }

    /// Control binary to invoke instead of `hab`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.builder = CommandBuilder::new(program);
        self
    }

    /// Sleep between poller probes. Zero disables sleeping.
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Probe and normalize the current state of `cfg.service`.
    pub fn probe(&self, cfg: &DesiredConfig) -> ServiceSnapshot {
        observe(self.status, &cfg.remote_sup_http, &cfg.service)
    }

    /// Probe and report drift without dispatching anything. Drift is only
    /// computed for a service the supervisor lists.
    pub fn inspect(&self, cfg: &DesiredConfig) -> (ServiceSnapshot, ChangeSet) {
        let snapshot = self.probe(cfg);
        let changes = if snapshot.exists {
            diff(cfg, &snapshot)
        } else {
            ChangeSet::default()
        };
        (snapshot, changes)
    }

    /// Drive `cfg.service` towards the state `action` asks for.
    pub fn reconcile(&self, action: Action, cfg: &DesiredConfig) -> Result<Outcome> {
        let mut outcome = Outcome::new(action, cfg);
        match action {
            Action::Load => self.load(cfg, &mut outcome)?,
            Action::Unload => self.unload(cfg, &mut outcome)?,
            Action::Start => self.start(cfg, &mut outcome)?,
            Action::Stop => self.stop(cfg, &mut outcome)?,
            Action::Restart => self.cycle(cfg, WaitCondition::NotRunning, &mut outcome)?,
            Action::Reload => self.cycle(cfg, WaitCondition::NotLoaded, &mut outcome)?,
        }
        Ok(outcome)
    }

    fn load(&self, cfg: &DesiredConfig, outcome: &mut Outcome) -> Result<()> {
        let (current, changes) = self.inspect(cfg);
        let forced = changes.requires_reload();
        if current.exists && !forced {
            debug!(service = %cfg.service, "already loaded with the declared configuration");
            return Ok(());
        }
        if forced {
            for change in changes.changes() {
                info!(service = %cfg.service, "{}", change);
            }
            debug!(service = %cfg.service, "reloading using --force due to parameter change");
        }
        outcome.forced = forced;
        outcome.changes = changes;
        self.dispatch(Action::Load, cfg, forced, outcome)
    }

    fn unload(&self, cfg: &DesiredConfig, outcome: &mut Outcome) -> Result<()> {
        if !self.probe(cfg).exists {
            debug!(service = %cfg.service, "not loaded, nothing to unload");
            return Ok(());
        }
        self.dispatch(Action::Unload, cfg, false, outcome)
    }

    fn start(&self, cfg: &DesiredConfig, outcome: &mut Outcome) -> Result<()> {
        let current = self.require_loaded(cfg)?;
        if current.running {
            debug!(service = %cfg.service, "already running");
            return Ok(());
        }
        self.dispatch(Action::Start, cfg, false, outcome)
    }

    fn stop(&self, cfg: &DesiredConfig, outcome: &mut Outcome) -> Result<()> {
        let current = self.require_loaded(cfg)?;
        if !current.running {
            debug!(service = %cfg.service, "already stopped");
            return Ok(());
        }
        self.dispatch(Action::Stop, cfg, false, outcome)
    }

    /// unload, wait for `condition`, load again.
    fn cycle(&self, cfg: &DesiredConfig, condition: WaitCondition, outcome: &mut Outcome) -> Result<()> {
        self.unload(cfg, outcome)?;

        let policy = PollPolicy::for_shutdown(cfg.shutdown_timeout_secs, self.poll_delay);
        let waited = ConvergencePoller::new(self.status, policy).wait(cfg, condition);
        outcome.poll = Some(waited);
        if let PollOutcome::TimedOut { attempts } = waited {
            let err = ConvergeError::ConvergenceTimeout {
                service: cfg.service.to_string(),
                condition,
                attempts,
            };
            error!("{}", err);
            return Err(err);
        }

        self.reengage(cfg, outcome)
    }

    /// Load half of a cycle. Always dispatches: a service the supervisor still
    /// lists (restart only waits for it to stop) is replaced with `--force`.
    fn reengage(&self, cfg: &DesiredConfig, outcome: &mut Outcome) -> Result<()> {
        let (current, changes) = self.inspect(cfg);
        for change in changes.changes() {
            info!(service = %cfg.service, "{}", change);
        }
        let forced = current.exists;
        if forced {
            debug!(service = %cfg.service, "still listed after the wait, loading with --force");
        }
        outcome.forced = forced;
        outcome.changes = changes;
        self.dispatch(Action::Load, cfg, forced, outcome)
    }

    fn require_loaded(&self, cfg: &DesiredConfig) -> Result<ServiceSnapshot> {
        let current = self.probe(cfg);
        if !current.exists {
            let err = ConvergeError::NotLoaded {
                service: cfg.service.to_string(),
            };
            error!("{}", err);
            return Err(err);
        }
        Ok(current)
    }

    fn dispatch(&self, action: Action, cfg: &DesiredConfig, force: bool, outcome: &mut Outcome) -> Result<()> {
        let line = self.builder.command(action, cfg, force);
        info!(service = %cfg.service, "running {}", line);
        match self.runner.run(&line) {
            Ok(_) => {
                outcome.dispatched.push(line);
                Ok(())
            }
            Err(source) => {
                let err = ConvergeError::Dispatch {
                    service: cfg.service.to_string(),
                    command: line.to_string(),
                    source,
                };
                error!("{}", err);
                Err(err)
            }
        }
    }
}

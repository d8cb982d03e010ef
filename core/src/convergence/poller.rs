//! Convergence poller: waits for a service to wind down.
//!
//! Re-probes the supervisor on a fixed cadence until a `WaitCondition`
//! holds or the attempt budget runs out. The budget is anchored to the
//! service's declared shutdown timeout: one probe per second of grace, plus
//! one. Blocking, single-threaded, no cancellation besides exhaustion.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::status::{observe, StatusSource};
use crate::types::{DesiredConfig, ServiceSnapshot};

// ---------------------------------------------------------------------------
// WaitCondition
// ---------------------------------------------------------------------------

/// What the poller waits for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// The supervisor reports the service as not running (it may still be listed).
    NotRunning,
    /// The supervisor no longer lists the service at all.
    NotLoaded,
}

impl WaitCondition {
    pub fn holds(&self, snapshot: &ServiceSnapshot) -> bool {
        match self {
            WaitCondition::NotRunning => !snapshot.running,
            WaitCondition::NotLoaded => !snapshot.exists,
        }
    }

    /// The state still being observed while the condition does not hold.
    pub fn pending(&self) -> &'static str {
        match self {
            WaitCondition::NotRunning => "started",
            WaitCondition::NotLoaded => "loaded",
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::NotRunning => f.write_str("not running"),
            WaitCondition::NotLoaded => f.write_str("not loaded"),
        }
    }
}

// ---------------------------------------------------------------------------
// PollPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of probes, including the first.
    pub max_attempts: u32,
    /// Sleep between consecutive probes.
    pub delay: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        PollPolicy {
            max_attempts,
            delay,
        }
    }

    /// `shutdown_timeout_secs + 1` attempts.
    pub fn for_shutdown(shutdown_timeout_secs: u64, delay: Duration) -> Self {
        let attempts = u32::try_from(shutdown_timeout_secs)
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        PollPolicy::new(attempts, delay)
    }
}

impl Default for PollPolicy {
    /// Default shutdown timeout (8s) plus one, one second apart.
    fn default() -> Self {
        PollPolicy::for_shutdown(
            crate::types::config::DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            Duration::from_secs(1),
        )
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum PollOutcome {
    Converged { attempts: u32 },
    TimedOut { attempts: u32 },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Converged { attempts } | PollOutcome::TimedOut { attempts } => *attempts,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self, PollOutcome::Converged { .. })
    }
}

// ---------------------------------------------------------------------------
// ConvergencePoller
// ---------------------------------------------------------------------------

pub struct ConvergencePoller<'a, S: StatusSource + ?Sized> {
    source: &'a S,
    policy: PollPolicy,
}

impl<'a, S: StatusSource + ?Sized> ConvergencePoller<'a, S> {
    pub fn new(source: &'a S, policy: PollPolicy) -> Self {
        ConvergencePoller { source, policy }
    }

    /// Probe until `condition` holds for `cfg.service` or attempts run out.
    pub fn wait(&self, cfg: &DesiredConfig, condition: WaitCondition) -> PollOutcome {
        let mut attempt: u32 = 0;
        while attempt < self.policy.max_attempts {
            if attempt > 0 && !self.policy.delay.is_zero() {
                thread::sleep(self.policy.delay);
            }
            attempt += 1;
            let snapshot = observe(self.source, &cfg.remote_sup_http, &cfg.service);
            if condition.holds(&snapshot) {
                debug!(service = %cfg.service, attempt, "{} reached", condition);
                return PollOutcome::Converged { attempts: attempt };
            }
            debug!(
                service = %cfg.service,
                attempt,
                max = self.policy.max_attempts,
                "still {}",
                condition.pending()
            );
        }
        PollOutcome::TimedOut { attempts: attempt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{normalize, Probe, ScriptedStatus};
    use crate::types::ServiceIdent;

    fn cfg() -> DesiredConfig {
        DesiredConfig::new(ServiceIdent::parse("core/redis").unwrap())
    }

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn budget_is_shutdown_timeout_plus_one() {
        assert_eq!(PollPolicy::for_shutdown(8, Duration::ZERO).max_attempts, 9);
        assert_eq!(PollPolicy::for_shutdown(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(PollPolicy::for_shutdown(u64::MAX, Duration::ZERO).max_attempts, u32::MAX);
        let p = PollPolicy::default();
        assert_eq!(p.max_attempts, 9);
        assert_eq!(p.delay, Duration::from_secs(1));
    }

    #[test]
    fn conditions() {
        let listed_down = normalize(&ScriptedStatus::down("core/redis"));
        let listed_up = normalize(&ScriptedStatus::up("core/redis"));
        let gone = normalize(&Probe::Unknown);

        assert!(WaitCondition::NotRunning.holds(&listed_down));
        assert!(!WaitCondition::NotRunning.holds(&listed_up));
        assert!(WaitCondition::NotRunning.holds(&gone));

        assert!(!WaitCondition::NotLoaded.holds(&listed_down));
        assert!(WaitCondition::NotLoaded.holds(&gone));
    }

    #[test]
    fn converges_on_first_probe() {
        let source = ScriptedStatus::always(Probe::Unknown);
        let poller = ConvergencePoller::new(&source, fast(5));
        let outcome = poller.wait(&cfg(), WaitCondition::NotLoaded);
        assert_eq!(outcome, PollOutcome::Converged { attempts: 1 });
        assert_eq!(source.probe_count(), 1);
    }

    #[test]
    fn converges_after_a_few_probes() {
        let source = ScriptedStatus::new(vec![
            ScriptedStatus::up("core/redis"),
            ScriptedStatus::up("core/redis"),
            ScriptedStatus::down("core/redis"),
        ]);
        let poller = ConvergencePoller::new(&source, fast(5));
        let outcome = poller.wait(&cfg(), WaitCondition::NotRunning);
        assert_eq!(outcome, PollOutcome::Converged { attempts: 3 });
        assert!(outcome.converged());
    }

    #[test]
    fn times_out_after_exactly_max_attempts() {
        let source = ScriptedStatus::always(ScriptedStatus::down("core/redis"));
        let poller = ConvergencePoller::new(&source, fast(4));
        let outcome = poller.wait(&cfg(), WaitCondition::NotLoaded);
        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 4 });
        assert!(!outcome.converged());
        assert_eq!(source.probe_count(), 4);
    }

    #[test]
    fn zero_attempts_times_out_without_probing() {
        let source = ScriptedStatus::always(Probe::Unknown);
        let poller = ConvergencePoller::new(&source, fast(0));
        assert_eq!(
            poller.wait(&cfg(), WaitCondition::NotLoaded),
            PollOutcome::TimedOut { attempts: 0 }
        );
        assert_eq!(source.probe_count(), 0);
    }

    #[test]
    fn sleeps_between_probes_only() {
        let source = ScriptedStatus::new(vec![ScriptedStatus::up("core/redis"), Probe::Unknown]);
        let poller = ConvergencePoller::new(&source, PollPolicy::new(3, Duration::from_millis(20)));
        let started = std::time::Instant::now();
        let outcome = poller.wait(&cfg(), WaitCondition::NotLoaded);
        assert_eq!(outcome, PollOutcome::Converged { attempts: 2 });
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}

//! Current-state probing.
//!
//! A `StatusSource` answers "what does the supervisor say about this
//! service right now?" with either a raw `ServiceRecord` or `Probe::Unknown`.
//! Probing never fails: an unreachable supervisor, a broken response, or a
//! missing service all collapse to `Unknown`, which `normalize` turns into a
//! not-loaded, not-running snapshot.

pub mod client;
pub mod mock;
pub mod normalize;
pub mod record;

pub use client::HttpStatusClient;
pub use mock::ScriptedStatus;
pub use normalize::normalize;
pub use record::ServiceRecord;

use tracing::debug;

use crate::types::{ServiceIdent, ServiceSnapshot};

/// Result of one probe against the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// The supervisor listed a record whose `origin/name` matches.
    Record(ServiceRecord),
    /// Unreachable supervisor, unreadable listing, or no matching record.
    Unknown,
}

impl Probe {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Probe::Unknown)
    }
}

/// Anything that can report the supervisor's view of a service.
pub trait StatusSource {
    /// Query the supervisor's status gateway at `http_addr` for `service`.
    fn probe(&self, http_addr: &str, service: &ServiceIdent) -> Probe;
}

/// Probe `service` and normalize the answer.
///
/// Runs inside a `probe` span carrying the service identifier, so the
/// per-field fallbacks logged by `normalize` are attributed to it, then logs
/// every normalized field at debug.
pub fn observe<S: StatusSource + ?Sized>(
    source: &S,
    http_addr: &str,
    service: &ServiceIdent,
) -> ServiceSnapshot {
    let _span = tracing::debug_span!("probe", service = %service).entered();
    let snapshot = normalize(&source.probe(http_addr, service));
    trace_snapshot(service, &snapshot);
    snapshot
}

fn trace_snapshot(svc: &ServiceIdent, s: &ServiceSnapshot) {
    debug!(service = %svc, "loaded state: {}", s.exists);
    debug!(service = %svc, "running state: {}", s.running);
    debug!(service = %svc, "strategy: {}", s.strategy);
    debug!(service = %svc, "topology: {}", s.topology);
    debug!(service = %svc, "builder url: {}", s.builder_url);
    debug!(service = %svc, "channel: {}", s.channel);
    debug!(service = %svc, "binds: {:?}", s.binds);
    debug!(service = %svc, "binding mode: {}", s.binding_mode);
    debug!(service = %svc, "service group: {}", s.service_group);
    debug!(service = %svc, "shutdown timeout: {}", s.shutdown_timeout_secs);
    debug!(service = %svc, "health check interval: {}", s.health_check_interval_secs);
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::with_default;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    use super::*;

    struct Buf(Arc<Mutex<String>>);

    impl io::Write for Buf {
        fn write(&mut self, b: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().push_str(&String::from_utf8_lossy(b));
            Ok(b.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured(f: impl FnOnce()) -> String {
        let store = Arc::new(Mutex::new(String::new()));
        let writer = store.clone();
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(move || Buf(writer.clone()));
        let subscriber = Registry::default().with(layer);
        with_default(subscriber, f);
        let logs = store.lock().unwrap().clone();
        logs
    }

    #[test]
    fn observe_attributes_every_line_to_the_service() {
        let source = ScriptedStatus::always(ScriptedStatus::up("core/redis"));
        let service = ServiceIdent::parse("core/redis").unwrap();
        let logs = captured(|| {
            let snap = observe(&source, "127.0.0.1:9631", &service);
            assert!(snap.running);
        });

        assert!(logs.contains("running state: true"), "{}", logs);
        assert!(logs.contains("health check interval: 30"), "{}", logs);
        // fallback lines from normalize sit inside the probe span
        let fallback = logs
            .lines()
            .find(|l| l.contains("topology not reported"))
            .unwrap_or_else(|| panic!("no fallback line in {}", logs));
        assert!(fallback.contains("core/redis"), "{}", fallback);
        assert!(logs.lines().filter(|l| !l.is_empty()).all(|l| l.contains("core/redis")));
    }
}

//! Scripted status source for testing.
//!
//! Replays a fixed sequence of probes, then keeps returning the last one,
//! making it easy to drive the reconciler and poller through a service that
//! disappears (or refuses to) after an unload.

use std::cell::{Cell, RefCell};

use super::record::{PkgInfo, ProcessInfo, ServiceRecord};
use super::{Probe, StatusSource};
use crate::types::ServiceIdent;

pub struct ScriptedStatus {
    /// Remaining probes, stored reversed so `pop` yields them in order.
    script: RefCell<Vec<Probe>>,
    last: RefCell<Probe>,
    probes: Cell<usize>,
}

impl ScriptedStatus {
    pub fn new(script: Vec<Probe>) -> Self {
        let mut reversed = script;
        reversed.reverse();
        ScriptedStatus {
            script: RefCell::new(reversed),
            last: RefCell::new(Probe::Unknown),
            probes: Cell::new(0),
        }
    }

    /// A source that always answers with `probe`.
    pub fn always(probe: Probe) -> Self {
        Self::new(vec![probe])
    }

    /// How many times `probe` has been called.
    pub fn probe_count(&self) -> usize {
        self.probes.get()
    }

    /// Convenience record for `ident` with the given process state.
    pub fn record(ident: &str, state: Option<&str>) -> ServiceRecord {
        let (origin, name) = ident.split_once('/').unwrap_or((ident, ""));
        let name = name.split('/').next().unwrap_or(name);
        ServiceRecord {
            pkg: Some(PkgInfo {
                origin: Some(origin.to_string()),
                name: Some(name.to_string()),
                shutdown_timeout: None,
            }),
            process: state.map(|s| ProcessInfo {
                state: Some(s.to_string()),
            }),
            ..ServiceRecord::default()
        }
    }

    pub fn up(ident: &str) -> Probe {
        Probe::Record(Self::record(ident, Some("up")))
    }

    pub fn down(ident: &str) -> Probe {
        Probe::Record(Self::record(ident, Some("down")))
    }
}

impl StatusSource for ScriptedStatus {
    fn probe(&self, _http_addr: &str, _service: &ServiceIdent) -> Probe {
        self.probes.set(self.probes.get() + 1);
        if let Some(next) = self.script.borrow_mut().pop() {
            *self.last.borrow_mut() = next;
        }
        self.last.borrow().clone()
    }
}

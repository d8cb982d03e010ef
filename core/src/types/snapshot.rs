use serde::{Deserialize, Serialize};

use super::config::{
    BindingMode, Strategy, Topology, DEFAULT_BLDR_URL, DEFAULT_CHANNEL,
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_SERVICE_GROUP, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};

/// What the supervisor reports for one service at the moment of a probe.
///
/// Rebuilt on every probe and never mutated afterwards. Fields mirror the
/// mutable part of `DesiredConfig` so the differ can compare them one by one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSnapshot {
    /// The supervisor lists the service (i.e. it is loaded).
    pub exists: bool,
    pub running: bool,
    pub strategy: Strategy,
    pub topology: Topology,
    pub builder_url: String,
    pub channel: String,
    pub binds: Vec<String>,
    pub binding_mode: BindingMode,
    pub service_group: String,
    pub shutdown_timeout_secs: u64,
    pub health_check_interval_secs: u64,
}

impl ServiceSnapshot {
    /// Snapshot for a service the supervisor does not know about.
    pub fn absent() -> Self {
        ServiceSnapshot {
            exists: false,
            running: false,
            strategy: Strategy::default(),
            topology: Topology::default(),
            builder_url: DEFAULT_BLDR_URL.into(),
            channel: DEFAULT_CHANNEL.into(),
            binds: Vec::new(),
            binding_mode: BindingMode::default(),
            service_group: DEFAULT_SERVICE_GROUP.into(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
        }
    }
}

impl Default for ServiceSnapshot {
    fn default() -> Self {
        Self::absent()
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ident::ServiceIdent;
use crate::error::ConvergeError;

pub const DEFAULT_BLDR_URL: &str = "https://bldr.habitat.sh";
pub const DEFAULT_CHANNEL: &str = "stable";
pub const DEFAULT_SERVICE_GROUP: &str = "default";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REMOTE_SUP: &str = "127.0.0.1:9632";
pub const DEFAULT_REMOTE_SUP_HTTP: &str = "127.0.0.1:9631";

/// Collapse the accepted spellings of an enum value (`:at-once`, `AT_ONCE`,
/// ` at-once `) to the canonical lower-case dashed form.
pub(crate) fn canonical(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(':')
        .to_ascii_lowercase()
        .replace('_', "-")
}

// ---------------------------------------------------------------------------
// Enumerated options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    None,
    AtOnce,
    Rolling,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::None => "none",
            Strategy::AtOnce => "at-once",
            Strategy::Rolling => "rolling",
        }
    }
}

impl FromStr for Strategy {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "none" => Ok(Strategy::None),
            "at-once" => Ok(Strategy::AtOnce),
            "rolling" => Ok(Strategy::Rolling),
            _ => Err(ConvergeError::InvalidValue {
                field: "strategy",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    #[default]
    Standalone,
    Leader,
}

impl Topology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Standalone => "standalone",
            Topology::Leader => "leader",
        }
    }
}

impl FromStr for Topology {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "standalone" => Ok(Topology::Standalone),
            "leader" => Ok(Topology::Leader),
            _ => Err(ConvergeError::InvalidValue {
                field: "topology",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BindingMode {
    #[default]
    Strict,
    Relaxed,
}

impl BindingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingMode::Strict => "strict",
            BindingMode::Relaxed => "relaxed",
        }
    }
}

impl FromStr for BindingMode {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "strict" => Ok(BindingMode::Strict),
            "relaxed" => Ok(BindingMode::Relaxed),
            _ => Err(ConvergeError::InvalidValue {
                field: "binding_mode",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Strategy, Topology, BindingMode);

// ---------------------------------------------------------------------------
// DesiredConfig
// ---------------------------------------------------------------------------

/// The declared state of one supervised service, fully defaulted.
///
/// Built from a `Declaration` (see `data::declaration`) or directly via
/// `DesiredConfig::new` in code and tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesiredConfig {
    pub service: ServiceIdent,
    pub strategy: Strategy,
    pub topology: Topology,
    pub builder_url: String,
    pub channel: String,
    pub binds: Vec<String>,
    pub binding_mode: BindingMode,
    pub service_group: String,
    pub shutdown_timeout_secs: u64,
    pub health_check_interval_secs: u64,
    /// `host:port` of the supervisor's control gateway.
    pub remote_sup: String,
    /// `host:port` of the supervisor's HTTP status gateway.
    pub remote_sup_http: String,
}

impl DesiredConfig {
    /// A declaration for `service` with every other field at its default.
    pub fn new(service: ServiceIdent) -> Self {
        DesiredConfig {
            service,
            strategy: Strategy::default(),
            topology: Topology::default(),
            builder_url: DEFAULT_BLDR_URL.into(),
            channel: DEFAULT_CHANNEL.into(),
            binds: Vec::new(),
            binding_mode: BindingMode::default(),
            service_group: DEFAULT_SERVICE_GROUP.into(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            remote_sup: DEFAULT_REMOTE_SUP.into(),
            remote_sup_http: DEFAULT_REMOTE_SUP_HTTP.into(),
        }
    }
}

//! Parser for service declaration files.
//!
//! A declaration names the service and any options that differ from the
//! defaults. It is YAML (JSON also parses, being a YAML subset):
//!
//! ```yaml
//! service: core/redis
//! topology: leader
//! bind: db:postgresql.default
//! shutdown_timeout: 20
//! ```
//!
//! Every field is optional at this stage. `Declaration::into_config`
//! applies defaults, coerces a scalar `bind` into a list, and canonicalises
//! the enumerated options.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConvergeError, Result};
use crate::types::{DesiredConfig, ServiceIdent};

/// `bind: x` or `bind: [x, y]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Binds {
    One(String),
    Many(Vec<String>),
}

impl Binds {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Binds::One(b) => vec![b],
            Binds::Many(bs) => bs,
        }
    }
}

/// Raw declared values, before defaulting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(alias = "service_name")]
    pub service: Option<String>,
    pub strategy: Option<String>,
    pub topology: Option<String>,
    #[serde(alias = "bldr_url")]
    pub builder_url: Option<String>,
    pub channel: Option<String>,
    #[serde(alias = "bind")]
    pub binds: Option<Binds>,
    pub binding_mode: Option<String>,
    pub service_group: Option<String>,
    #[serde(alias = "shutdown_timeout")]
    pub shutdown_timeout_secs: Option<u64>,
    #[serde(alias = "health_check_interval")]
    pub health_check_interval_secs: Option<u64>,
    pub remote_sup: Option<String>,
    pub remote_sup_http: Option<String>,
}

impl Declaration {
    /// Values set in `over` win; everything else is kept from `self`.
    pub fn overlay(self, over: Declaration) -> Declaration {
        Declaration {
            service: over.service.or(self.service),
            strategy: over.strategy.or(self.strategy),
            topology: over.topology.or(self.topology),
            builder_url: over.builder_url.or(self.builder_url),
            channel: over.channel.or(self.channel),
            binds: over.binds.or(self.binds),
            binding_mode: over.binding_mode.or(self.binding_mode),
            service_group: over.service_group.or(self.service_group),
            shutdown_timeout_secs: over.shutdown_timeout_secs.or(self.shutdown_timeout_secs),
            health_check_interval_secs: over
                .health_check_interval_secs
                .or(self.health_check_interval_secs),
            remote_sup: over.remote_sup.or(self.remote_sup),
            remote_sup_http: over.remote_sup_http.or(self.remote_sup_http),
        }
    }

    /// Apply defaults and coercions.
    pub fn into_config(self) -> Result<DesiredConfig> {
        let service = self
            .service
            .ok_or_else(|| ConvergeError::Declaration("missing service identifier".into()))?;
        let mut cfg = DesiredConfig::new(ServiceIdent::parse(&service)?);

        if let Some(v) = self.strategy {
            cfg.strategy = v.parse()?;
        }
        if let Some(v) = self.topology {
            cfg.topology = v.parse()?;
        }
        if let Some(v) = self.builder_url {
            cfg.builder_url = v;
        }
        if let Some(v) = self.channel {
            cfg.channel = v.trim().trim_start_matches(':').to_string();
        }
        if let Some(v) = self.binds {
            cfg.binds = v.into_vec();
        }
        if let Some(v) = self.binding_mode {
            cfg.binding_mode = v.parse()?;
        }
        if let Some(v) = self.service_group {
            cfg.service_group = v;
        }
        if let Some(v) = self.shutdown_timeout_secs {
            cfg.shutdown_timeout_secs = v;
        }
        if let Some(v) = self.health_check_interval_secs {
            cfg.health_check_interval_secs = v;
        }
        if let Some(v) = self.remote_sup {
            cfg.remote_sup = v;
        }
        if let Some(v) = self.remote_sup_http {
            cfg.remote_sup_http = v;
        }
        Ok(cfg)
    }
}

/// Load a declaration from a YAML or JSON file.
pub fn load(path: &Path) -> Result<Declaration> {
    let content = std::fs::read_to_string(path).map_err(|source| ConvergeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse a declaration from a YAML or JSON string.
pub fn parse(content: &str) -> Result<Declaration> {
    if content.trim().is_empty() {
        return Ok(Declaration::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConvergeError::Declaration(e.to_string()))
}

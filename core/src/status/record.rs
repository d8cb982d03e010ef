//! Typed view of one entry in the supervisor's `/services` listing.
//!
//! Every field is optional and deserialized leniently: a field that is
//! missing, null, or of the wrong JSON type becomes `None` instead of failing
//! the whole listing. Defaults are applied later, in `normalize`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ServiceRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub pkg: Option<PkgInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub process: Option<ProcessInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub update_strategy: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub topology: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bldr_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub binds: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub binding_mode: Option<String>,
    /// Dotted `name.group`; only the last segment is the group.
    #[serde(default, deserialize_with = "lenient")]
    pub service_group: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub health_check_interval: Option<IntervalInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PkgInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub origin: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub shutdown_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProcessInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct IntervalInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub secs: Option<u64>,
}

impl ServiceRecord {
    /// `origin/name` of the record, if both halves are present.
    pub fn origin_name(&self) -> Option<String> {
        let pkg = self.pkg.as_ref()?;
        match (&pkg.origin, &pkg.name) {
            (Some(origin), Some(name)) => Some(format!("{}/{}", origin, name)),
            _ => None,
        }
    }
}

/// Parse a `/services` body into records.
pub fn parse_listing(body: &str) -> Result<Vec<ServiceRecord>, serde_json::Error> {
    serde_json::from_str(body)
}

/// Deserialize `T`, turning a type mismatch into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

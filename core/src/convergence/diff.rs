//! Differ: compares a declaration against a probed snapshot.
//!
//! The differ is stateless: it takes the desired config and the current
//! snapshot and returns which of the nine reloadable fields disagree. It is
//! only meaningful for a service the supervisor already lists; callers
//! handle the absent case (that is a plain load, not a forced one).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DesiredConfig, ServiceSnapshot};

/// The fields whose drift forces a reload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Strategy,
    Topology,
    BuilderUrl,
    Channel,
    Binds,
    BindingMode,
    ServiceGroup,
    ShutdownTimeout,
    HealthCheckInterval,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Strategy,
        Field::Topology,
        Field::BuilderUrl,
        Field::Channel,
        Field::Binds,
        Field::BindingMode,
        Field::ServiceGroup,
        Field::ShutdownTimeout,
        Field::HealthCheckInterval,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Strategy => "strategy",
            Field::Topology => "topology",
            Field::BuilderUrl => "builder_url",
            Field::Channel => "channel",
            Field::Binds => "binds",
            Field::BindingMode => "binding_mode",
            Field::ServiceGroup => "service_group",
            Field::ShutdownTimeout => "shutdown_timeout",
            Field::HealthCheckInterval => "health_check_interval",
        }
    }

    /// Render this field's value on each side, for comparison and reporting.
    fn values(&self, desired: &DesiredConfig, current: &ServiceSnapshot) -> (String, String) {
        match self {
            Field::Strategy => (current.strategy.to_string(), desired.strategy.to_string()),
            Field::Topology => (current.topology.to_string(), desired.topology.to_string()),
            Field::BuilderUrl => (current.builder_url.clone(), desired.builder_url.clone()),
            Field::Channel => (current.channel.clone(), desired.channel.clone()),
            Field::Binds => (render_list(&current.binds), render_list(&desired.binds)),
            Field::BindingMode => (
                current.binding_mode.to_string(),
                desired.binding_mode.to_string(),
            ),
            Field::ServiceGroup => (current.service_group.clone(), desired.service_group.clone()),
            Field::ShutdownTimeout => (
                current.shutdown_timeout_secs.to_string(),
                desired.shutdown_timeout_secs.to_string(),
            ),
            Field::HealthCheckInterval => (
                current.health_check_interval_secs.to_string(),
                desired.health_check_interval_secs.to_string(),
            ),
        }
    }

    fn differs(&self, desired: &DesiredConfig, current: &ServiceSnapshot) -> bool {
        match self {
            Field::Strategy => desired.strategy != current.strategy,
            Field::Topology => desired.topology != current.topology,
            Field::BuilderUrl => desired.builder_url != current.builder_url,
            Field::Channel => desired.channel != current.channel,
            Field::Binds => desired.binds != current.binds,
            Field::BindingMode => desired.binding_mode != current.binding_mode,
            Field::ServiceGroup => desired.service_group != current.service_group,
            Field::ShutdownTimeout => desired.shutdown_timeout_secs != current.shutdown_timeout_secs,
            Field::HealthCheckInterval => {
                desired.health_check_interval_secs != current.health_check_interval_secs
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn render_list(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// One drifted field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    pub field: Field,
    pub current: String,
    pub desired: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.current, self.desired)
    }
}

/// The drifted fields, in `Field::ALL` order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// A load against a service that already exists with drift must be forced.
    pub fn requires_reload(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    pub fn fields(&self) -> Vec<Field> {
        self.changes.iter().map(|c| c.field).collect()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.changes.iter().any(|c| c.field == field)
    }
}

/// Compare every reloadable field of `desired` against `current`.
pub fn diff(desired: &DesiredConfig, current: &ServiceSnapshot) -> ChangeSet {
    let changes = Field::ALL
        .iter()
        .filter(|field| field.differs(desired, current))
        .map(|field| {
            let (was, want) = field.values(desired, current);
            FieldChange {
                field: *field,
                current: was,
                desired: want,
            }
        })
        .collect();
    ChangeSet { changes }
}

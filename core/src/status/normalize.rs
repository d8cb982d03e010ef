//! Turn a raw probe into a fully-populated `ServiceSnapshot`.
//!
//! Each field is extracted independently; anything absent (or, for the
//! enumerated fields, unrecognised) falls back to its default. A partially
//! populated record is normal supervisor output, not an error.

use std::str::FromStr;

use tracing::debug;

use super::record::ServiceRecord;
use super::Probe;
use crate::types::ServiceSnapshot;

/// Build a snapshot from one probe result.
pub fn normalize(probe: &Probe) -> ServiceSnapshot {
    match probe {
        Probe::Unknown => ServiceSnapshot::absent(),
        Probe::Record(record) => from_record(record),
    }
}

fn from_record(record: &ServiceRecord) -> ServiceSnapshot {
    let defaults = ServiceSnapshot::absent();
    let pkg = record.pkg.as_ref();

    let running = record
        .process
        .as_ref()
        .and_then(|p| p.state.as_deref())
        .map(|state| state == "up")
        .unwrap_or(false);

    ServiceSnapshot {
        exists: true,
        running,
        strategy: parsed("update_strategy", record.update_strategy.as_deref(), defaults.strategy),
        topology: parsed("topology", record.topology.as_deref(), defaults.topology),
        builder_url: or_default("bldr_url", record.bldr_url.clone(), defaults.builder_url),
        channel: or_default("channel", record.channel.clone(), defaults.channel),
        binds: or_default("binds", record.binds.clone(), defaults.binds),
        binding_mode: parsed("binding_mode", record.binding_mode.as_deref(), defaults.binding_mode),
        service_group: or_default(
            "service_group",
            record.service_group.as_deref().map(last_segment),
            defaults.service_group,
        ),
        shutdown_timeout_secs: or_default(
            "pkg.shutdown_timeout",
            pkg.and_then(|p| p.shutdown_timeout),
            defaults.shutdown_timeout_secs,
        ),
        health_check_interval_secs: or_default(
            "health_check_interval.secs",
            record.health_check_interval.as_ref().and_then(|h| h.secs),
            defaults.health_check_interval_secs,
        ),
    }
}

/// `redis.prod` -> `prod`
fn last_segment(dotted: &str) -> String {
    dotted.rsplit('.').next().unwrap_or(dotted).to_string()
}

fn or_default<T>(path: &str, value: Option<T>, default: T) -> T {
    match value {
        Some(v) => v,
        None => {
            debug!("{} not reported by the supervisor, using default", path);
            default
        }
    }
}

fn parsed<T: FromStr>(path: &str, value: Option<&str>, default: T) -> T {
    match value {
        Some(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                debug!("{} reported as unrecognised '{}', using default", path, raw);
                default
            }
        },
        None => or_default(path, None, default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::record::{parse_listing, IntervalInfo, PkgInfo, ProcessInfo};
    use crate::types::{BindingMode, Strategy, Topology};

    fn record_from(json: &str) -> Probe {
        let mut records = parse_listing(&format!("[{}]", json)).unwrap();
        Probe::Record(records.remove(0))
    }

    #[test]
    fn unknown_is_absent_with_defaults() {
        let snap = normalize(&Probe::Unknown);
        assert!(!snap.exists);
        assert!(!snap.running);
        assert_eq!(snap, ServiceSnapshot::absent());
        assert_eq!(snap.strategy, Strategy::None);
        assert_eq!(snap.topology, Topology::Standalone);
        assert_eq!(snap.builder_url, "https://bldr.habitat.sh");
        assert_eq!(snap.channel, "stable");
        assert!(snap.binds.is_empty());
        assert_eq!(snap.binding_mode, BindingMode::Strict);
        assert_eq!(snap.service_group, "default");
        assert_eq!(snap.shutdown_timeout_secs, 8);
        assert_eq!(snap.health_check_interval_secs, 30);
    }

    #[test]
    fn full_record_is_read_field_by_field() {
        let probe = Probe::Record(ServiceRecord {
            pkg: Some(PkgInfo {
                origin: Some("core".into()),
                name: Some("redis".into()),
                shutdown_timeout: Some(20),
            }),
            process: Some(ProcessInfo {
                state: Some("up".into()),
            }),
            update_strategy: Some("rolling".into()),
            topology: Some("leader".into()),
            bldr_url: Some("https://bldr.example.com".into()),
            channel: Some("unstable".into()),
            binds: Some(vec!["db:postgresql.default".into()]),
            binding_mode: Some("relaxed".into()),
            service_group: Some("redis.prod".into()),
            health_check_interval: Some(IntervalInfo { secs: Some(5) }),
        });
        let snap = normalize(&probe);
        assert!(snap.exists);
        assert!(snap.running);
        assert_eq!(snap.strategy, Strategy::Rolling);
        assert_eq!(snap.topology, Topology::Leader);
        assert_eq!(snap.builder_url, "https://bldr.example.com");
        assert_eq!(snap.channel, "unstable");
        assert_eq!(snap.binds, vec!["db:postgresql.default".to_string()]);
        assert_eq!(snap.binding_mode, BindingMode::Relaxed);
        assert_eq!(snap.service_group, "prod");
        assert_eq!(snap.shutdown_timeout_secs, 20);
        assert_eq!(snap.health_check_interval_secs, 5);
    }

    #[test]
    fn bare_record_exists_but_is_not_running() {
        let snap = normalize(&record_from(r#"{"pkg": {"origin": "core", "name": "redis"}}"#));
        assert!(snap.exists);
        assert!(!snap.running);
        let expected = ServiceSnapshot {
            exists: true,
            ..ServiceSnapshot::absent()
        };
        assert_eq!(snap, expected);
    }

    #[test]
    fn only_literal_up_counts_as_running() {
        for state in ["down", "Up", "starting", ""] {
            let json = format!(r#"{{"process": {{"state": "{}"}}}}"#, state);
            assert!(!normalize(&record_from(&json)).running, "state {:?}", state);
        }
        assert!(normalize(&record_from(r#"{"process": {"state": "up"}}"#)).running);
        assert!(!normalize(&record_from(r#"{"process": {}}"#)).running);
    }

    #[test]
    fn service_group_keeps_last_segment() {
        let snap = normalize(&record_from(r#"{"service_group": "redis.default"}"#));
        assert_eq!(snap.service_group, "default");
        let snap = normalize(&record_from(r#"{"service_group": "a.b.staging"}"#));
        assert_eq!(snap.service_group, "staging");
        let snap = normalize(&record_from(r#"{"service_group": "nodots"}"#));
        assert_eq!(snap.service_group, "nodots");
    }

    #[test]
    fn unrecognised_enum_values_fall_back() {
        let snap = normalize(&record_from(
            r#"{"update_strategy": "sometimes", "topology": "mesh", "binding_mode": 7}"#,
        ));
        assert_eq!(snap.strategy, Strategy::None);
        assert_eq!(snap.topology, Topology::Standalone);
        assert_eq!(snap.binding_mode, BindingMode::Strict);
    }
}

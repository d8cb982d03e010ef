use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConvergeError;

/// A package coordinate `origin/name[/version[/release]]`.
///
/// The full identifier is what gets passed to the control binary; the
/// supervisor's service listing is keyed by `origin/name` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ServiceIdent {
    origin: String,
    name: String,
    version: Option<String>,
    release: Option<String>,
}

impl ServiceIdent {
    pub fn parse(raw: &str) -> Result<ServiceIdent, ConvergeError> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('/').collect();
        if !(2..=4).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(ConvergeError::InvalidIdent(raw.to_string()));
        }
        Ok(ServiceIdent {
            origin: parts[0].to_string(),
            name: parts[1].to_string(),
            version: parts.get(2).map(|s| s.to_string()),
            release: parts.get(3).map(|s| s.to_string()),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }

    /// `origin/name`, with version and release dropped.
    pub fn short(&self) -> String {
        format!("{}/{}", self.origin, self.name)
    }
}

impl fmt::Display for ServiceIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.origin, self.name)?;
        if let Some(ref v) = self.version {
            write!(f, "/{}", v)?;
        }
        if let Some(ref r) = self.release {
            write!(f, "/{}", r)?;
        }
        Ok(())
    }
}

impl FromStr for ServiceIdent {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceIdent::parse(s)
    }
}

impl TryFrom<String> for ServiceIdent {
    type Error = ConvergeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ServiceIdent::parse(&s)
    }
}

impl From<ServiceIdent> for String {
    fn from(ident: ServiceIdent) -> String {
        ident.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origin_and_name() {
        let ident = ServiceIdent::parse("core/redis").unwrap();
        assert_eq!(ident.origin(), "core");
        assert_eq!(ident.name(), "redis");
        assert_eq!(ident.version(), None);
        assert_eq!(ident.short(), "core/redis");
        assert_eq!(ident.to_string(), "core/redis");
    }

    #[test]
    fn parse_fully_qualified() {
        let ident = ServiceIdent::parse("core/redis/4.0.14/20190319155852").unwrap();
        assert_eq!(ident.version(), Some("4.0.14"));
        assert_eq!(ident.release(), Some("20190319155852"));
        assert_eq!(ident.short(), "core/redis");
        assert_eq!(ident.to_string(), "core/redis/4.0.14/20190319155852");
    }

    #[test]
    fn rejects_bad_shapes() {
        for bad in ["redis", "core/", "/redis", "a/b/c/d/e", "core//1.0", ""] {
            assert!(
                matches!(ServiceIdent::parse(bad), Err(ConvergeError::InvalidIdent(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn serde_as_plain_string() {
        let ident = ServiceIdent::parse("core/nginx/1.15.2").unwrap();
        let json = serde_json::to_string(&ident).unwrap();
        assert_eq!(json, "\"core/nginx/1.15.2\"");
        let back: ServiceIdent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ident);
        assert!(serde_json::from_str::<ServiceIdent>("\"nginx\"").is_err());
    }
}

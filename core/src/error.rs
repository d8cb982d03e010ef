use std::path::PathBuf;

use crate::command::runner::RunError;
use crate::convergence::poller::WaitCondition;

// ---------------------------------------------------------------------------
// Converge errors
// ---------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ConvergeError {
    /// The service identifier is not `origin/name[/version[/release]]`.
    #[error("invalid service identifier '{0}': expected origin/name[/version[/release]]")]
    InvalidIdent(String),

    /// A declared value falls outside the field's accepted set.
    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },

    /// The declaration document could not be parsed.
    #[error("invalid declaration: {0}")]
    Declaration(String),

    /// The declaration file could not be read.
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// start/stop requested for a service the supervisor does not know.
    #[error("no service named {service} is loaded on the supervisor")]
    NotLoaded { service: String },

    /// The poller ran out of attempts before the condition held.
    #[error("{service} still {} after {attempts} attempts", .condition.pending())]
    ConvergenceTimeout {
        service: String,
        condition: WaitCondition,
        attempts: u32,
    },

    /// The control binary failed.
    #[error("`{command}` failed for {service}: {source}")]
    Dispatch {
        service: String,
        command: String,
        #[source]
        source: RunError,
    },
}

pub type Result<T> = std::result::Result<T, ConvergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_messages_name_the_service() {
        let not_loaded = ConvergeError::NotLoaded {
            service: "core/redis".into(),
        };
        assert!(not_loaded.to_string().contains("core/redis"));

        let timeout = ConvergeError::ConvergenceTimeout {
            service: "core/redis/7.0.1".into(),
            condition: WaitCondition::NotLoaded,
            attempts: 9,
        };
        let msg = timeout.to_string();
        assert!(msg.contains("core/redis/7.0.1"));
        assert!(msg.contains("still loaded"));
        assert!(msg.contains("9 attempts"));

        let dispatch = ConvergeError::Dispatch {
            service: "core/redis".into(),
            command: "hab svc start core/redis".into(),
            source: RunError::Exit {
                code: Some(1),
                stderr: "boom".into(),
            },
        };
        let msg = dispatch.to_string();
        assert!(msg.contains("core/redis"));
        assert!(msg.contains("hab svc start"));
    }

    #[test]
    fn invalid_value_names_field() {
        let err = ConvergeError::InvalidValue {
            field: "topology",
            value: "mesh".into(),
        };
        assert_eq!(err.to_string(), "invalid value 'mesh' for topology");
    }
}

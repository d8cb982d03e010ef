use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::canonical;
use crate::error::ConvergeError;

/// The lifecycle actions exposed to the host orchestrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Load,
    Unload,
    Start,
    Stop,
    Restart,
    Reload,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Load,
        Action::Unload,
        Action::Start,
        Action::Stop,
        Action::Restart,
        Action::Reload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Load => "load",
            Action::Unload => "unload",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
            Action::Reload => "reload",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = canonical(s);
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == c)
            .ok_or_else(|| ConvergeError::InvalidValue {
                field: "action",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_actions() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert_eq!(":reload".parse::<Action>().unwrap(), Action::Reload);
        assert!("bounce".parse::<Action>().is_err());
    }
}

//! Argument construction for `<tool> svc <action>`.
//!
//! Only the flags an action accepts are emitted, always in the same order:
//!
//! | action        | flags                                                   |
//! |---------------|---------------------------------------------------------|
//! | load          | `--bind`*, `--binding-mode`, `--url`, `--channel`,      |
//! |               | `--group`, `--strategy`, `--topology`,                  |
//! |               | `--health-check-interval`, `--shutdown-timeout`,        |
//! |               | `--remote-sup`, then `--force` when forcing             |
//! | unload, stop  | `--shutdown-timeout`, `--remote-sup`                    |
//! | anything else | `--remote-sup`                                          |
//!
//! Flag and value are joined and re-split on whitespace, so every token the
//! control binary sees is a separate argv entry.

use super::CommandLine;
use crate::types::{Action, DesiredConfig};

pub const FORCE_FLAG: &str = "--force";

pub struct CommandBuilder {
    program: String,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        CommandBuilder {
            program: program.into(),
        }
    }

    /// Option tokens for `action`, without the `svc <action> <ident>` prefix.
    pub fn args(action: Action, cfg: &DesiredConfig) -> Vec<String> {
        let mut opts: Vec<String> = Vec::new();

        match action {
            Action::Load => {
                opts.extend(cfg.binds.iter().map(|b| format!("--bind {}", b)));
                opts.push(format!("--binding-mode {}", cfg.binding_mode));
                push_if_set(&mut opts, "--url", &cfg.builder_url);
                push_if_set(&mut opts, "--channel", &cfg.channel);
                push_if_set(&mut opts, "--group", &cfg.service_group);
                opts.push(format!("--strategy {}", cfg.strategy));
                opts.push(format!("--topology {}", cfg.topology));
                opts.push(format!(
                    "--health-check-interval {}",
                    cfg.health_check_interval_secs
                ));
                opts.push(format!("--shutdown-timeout {}", cfg.shutdown_timeout_secs));
            }
            Action::Unload | Action::Stop => {
                opts.push(format!("--shutdown-timeout {}", cfg.shutdown_timeout_secs));
            }
            Action::Start | Action::Restart | Action::Reload => {}
        }

        opts.push(format!("--remote-sup {}", cfg.remote_sup));

        opts.iter()
            .flat_map(|o| o.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    /// Load tokens, with `--force` appended last when `force` is set.
    pub fn load_args(cfg: &DesiredConfig, force: bool) -> Vec<String> {
        let mut args = Self::args(Action::Load, cfg);
        if force {
            args.push(FORCE_FLAG.to_string());
        }
        args
    }

    /// `<program> svc <action> <ident> <args...>`
    pub fn command(&self, action: Action, cfg: &DesiredConfig, force: bool) -> CommandLine {
        let opts = match action {
            Action::Load => Self::load_args(cfg, force),
            _ => Self::args(action, cfg),
        };
        let mut args = vec![
            "svc".to_string(),
            action.as_str().to_string(),
            cfg.service.to_string(),
        ];
        args.extend(opts);
        CommandLine::new(self.program.clone(), args)
    }
}

fn push_if_set(opts: &mut Vec<String>, flag: &str, value: &str) {
    if !value.trim().is_empty() {
        opts.push(format!("{} {}", flag, value));
    }
}

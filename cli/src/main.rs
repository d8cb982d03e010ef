//! svc-converge: converge one supervised service to its declaration.
//!
//! # Usage
//!
//! ```text
//! svc-converge load core/redis --topology leader --bind db:postgresql.default
//! svc-converge reload --file redis.yaml
//! svc-converge status core/redis --json
//! ```
//!
//! Exit status is 0 when the service converged (whether or not a command was
//! needed), 1 on a fatal error, 2 on a usage error.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use svc_converge_core::data::declaration::{self, Binds, Declaration};
use svc_converge_core::{
    Action, ConvergeError, DesiredConfig, HttpStatusClient, Outcome, ProcessRunner, Reconciler,
};

#[derive(Debug, Parser)]
#[command(name = "svc-converge", version, about = "Converge a supervised service to its declared state")]
struct Cli {
    /// Lifecycle action to converge, or `status` to only report.
    #[arg(value_enum)]
    verb: Verb,

    /// Service identifier, origin/name[/version[/release]].
    service: Option<String>,

    /// YAML or JSON declaration file; flags override its values.
    #[arg(long, short)]
    file: Option<PathBuf>,

    #[arg(long)]
    strategy: Option<String>,

    #[arg(long)]
    topology: Option<String>,

    /// Builder URL.
    #[arg(long = "url")]
    builder_url: Option<String>,

    #[arg(long)]
    channel: Option<String>,

    /// Repeat for several binds.
    #[arg(long = "bind")]
    binds: Vec<String>,

    #[arg(long)]
    binding_mode: Option<String>,

    #[arg(long = "group")]
    service_group: Option<String>,

    /// Seconds; also sizes the restart/reload wait.
    #[arg(long)]
    shutdown_timeout: Option<u64>,

    /// Seconds.
    #[arg(long)]
    health_check_interval: Option<u64>,

    /// Supervisor control gateway, host:port.
    #[arg(long)]
    remote_sup: Option<String>,

    /// Supervisor HTTP status gateway, host:port.
    #[arg(long)]
    remote_sup_http: Option<String>,

    /// Control binary.
    #[arg(long, default_value = "hab")]
    hab_bin: String,

    /// Seconds between probes while waiting inside restart/reload.
    #[arg(long, default_value_t = 1)]
    poll_delay: u64,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// -v for info, -vv for debug. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Verb {
    Load,
    Unload,
    Start,
    Stop,
    Restart,
    Reload,
    Status,
}

impl Verb {
    fn action(self) -> Option<Action> {
        match self {
            Verb::Load => Some(Action::Load),
            Verb::Unload => Some(Action::Unload),
            Verb::Start => Some(Action::Start),
            Verb::Stop => Some(Action::Stop),
            Verb::Restart => Some(Action::Restart),
            Verb::Reload => Some(Action::Reload),
            Verb::Status => None,
        }
    }
}

impl Cli {
    /// Flag values as a declaration overlay.
    fn flags(&self) -> Declaration {
        Declaration {
            service: self.service.clone(),
            strategy: self.strategy.clone(),
            topology: self.topology.clone(),
            builder_url: self.builder_url.clone(),
            channel: self.channel.clone(),
            binds: if self.binds.is_empty() {
                None
            } else {
                Some(Binds::Many(self.binds.clone()))
            },
            binding_mode: self.binding_mode.clone(),
            service_group: self.service_group.clone(),
            shutdown_timeout_secs: self.shutdown_timeout,
            health_check_interval_secs: self.health_check_interval,
            remote_sup: self.remote_sup.clone(),
            remote_sup_http: self.remote_sup_http.clone(),
        }
    }

    fn desired(&self) -> Result<DesiredConfig, ConvergeError> {
        let base = match self.file {
            Some(ref path) => declaration::load(path)?,
            None => Declaration::default(),
        };
        base.overlay(self.flags()).into_config()
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = match cli.desired() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("svc-converge: {}", e);
            process::exit(2);
        }
    };

    let status = HttpStatusClient::new();
    let runner = ProcessRunner;
    let reconciler = Reconciler::new(&status, &runner)
        .with_program(cli.hab_bin.clone())
        .with_poll_delay(Duration::from_secs(cli.poll_delay));

    let Some(action) = cli.verb.action() else {
        report_status(&reconciler, &cfg, cli.json);
        return;
    };

    match reconciler.reconcile(action, &cfg) {
        Ok(outcome) => report_outcome(&outcome, cli.json),
        Err(e) => {
            if cli.json {
                println!("{}", json!({ "service": cfg.service, "action": action, "error": e.to_string() }));
            } else {
                eprintln!("svc-converge: {}", e);
            }
            process::exit(1);
        }
    }
}

fn report_status(
    reconciler: &Reconciler<'_, HttpStatusClient, ProcessRunner>,
    cfg: &DesiredConfig,
    as_json: bool,
) {
    let (snapshot, changes) = reconciler.inspect(cfg);
    if as_json {
        println!(
            "{}",
            json!({ "service": cfg.service, "snapshot": snapshot, "changes": changes })
        );
        return;
    }
    println!("service: {}", cfg.service);
    println!("loaded: {}", snapshot.exists);
    println!("running: {}", snapshot.running);
    if !snapshot.exists {
        return;
    }
    if changes.is_empty() {
        println!("configuration: matches declaration");
    } else {
        println!("configuration: drifted ({} fields)", changes.len());
        for change in changes.changes() {
            println!("  {}", change);
        }
    }
}

fn report_outcome(outcome: &Outcome, as_json: bool) {
    if as_json {
        match serde_json::to_string(outcome) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("svc-converge: cannot encode outcome: {}", e),
        }
        return;
    }
    if outcome.is_noop() {
        println!("{} {}: up to date", outcome.action, outcome.service);
        return;
    }
    for change in outcome.changes.changes() {
        println!("  {}", change);
    }
    if let Some(poll) = outcome.poll {
        println!("  waited {} probe(s)", poll.attempts());
    }
    for line in &outcome.dispatched {
        println!("ran: {}", line);
    }
}

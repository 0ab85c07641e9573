use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kstatus_core::{
    build_references, component_references, NotFoundPolicy, ObjectIdentity, Readiness, ReadinessCheck, READY_CONDITION,
};
use kstatus_kubehub::{DynamicResource, KubeStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};

mod wait;

use wait::{wait_for, PollOptions, WaitOutcome, WaitReport};

#[derive(Parser, Debug)]
#[command(name = "kstatusctl", version, about = "Check and wait for resource readiness")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Kubernetes namespace of the tracked objects
    #[arg(long = "ns", global = true, env = "KSTATUS_NAMESPACE", default_value = "flux-system")]
    namespace: String,

    /// What a missing object means: stop with an error, or keep polling
    #[arg(long = "not-found", value_enum, global = true, default_value_t = NotFound::Fail)]
    not_found: NotFound,

    /// Log filter directives
    #[arg(long = "log", global = true, env = "KSTATUS_LOG", default_value = "info")]
    log: String,

    /// Serve Prometheus metrics on host:port
    #[arg(long = "metrics-addr", global = true, env = "KSTATUS_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    command: Commands,
}

/// Deployments report availability rather than readiness.
const COMPONENT_CONDITION: &str = "Available";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum NotFound { Fail, Retry }

impl From<NotFound> for NotFoundPolicy {
    fn from(v: NotFound) -> Self {
        match v {
            NotFound::Fail => NotFoundPolicy::Fail,
            NotFound::Retry => NotFoundPolicy::Retry,
        }
    }
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Resource kind, e.g. "Kustomization"
    kind: String,
    /// API group, e.g. "kustomize.toolkit.fluxcd.io" (empty for the core group)
    #[arg(long = "group", default_value = "")]
    group: String,
}

#[derive(clap::Args, Debug)]
struct Watched {
    /// Condition type that signals readiness
    #[arg(long = "condition", default_value = READY_CONDITION)]
    condition: String,
}

#[derive(clap::Args, Debug)]
struct Polling {
    /// Give up after this many seconds
    #[arg(long = "timeout", env = "KSTATUS_TIMEOUT_SECS", default_value_t = 300)]
    timeout_secs: u64,
    /// Delay between evaluations in milliseconds
    #[arg(long = "interval", env = "KSTATUS_INTERVAL_MS", default_value_t = 2000)]
    interval_ms: u64,
}

impl Polling {
    fn options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.interval_ms.max(1)),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate readiness of one object once
    Check {
        #[command(flatten)]
        target: Target,
        name: String,
        #[command(flatten)]
        watched: Watched,
    },
    /// Poll objects until all are ready, one fails, or the timeout hits
    Wait {
        #[command(flatten)]
        target: Target,
        #[arg(required = true)]
        names: Vec<String>,
        #[command(flatten)]
        watched: Watched,
        #[command(flatten)]
        polling: Polling,
    },
    /// Wait for controller deployments to become available
    Components {
        #[arg(required = true)]
        names: Vec<String>,
        /// Condition type that signals the deployment is up
        #[arg(long = "condition", default_value = COMPONENT_CONDITION)]
        condition: String,
        #[command(flatten)]
        polling: Polling,
    },
    /// Print the identities that would be tracked
    Refs {
        #[command(flatten)]
        target: Target,
        names: Vec<String>,
    },
}

fn init_tracing(directives: &str) {
    let filter = tracing_subscriber::EnvFilter::from_str(directives).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn init_metrics(addr: Option<SocketAddr>) {
    let Some(addr) = addr else { return };
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(%addr, error = %e, "metrics exporter not installed");
        return;
    }
    info!(%addr, "serving Prometheus metrics");
}

fn readiness_check(condition: &str, not_found: NotFound) -> ReadinessCheck {
    ReadinessCheck::new().condition_type(condition).not_found(not_found.into())
}

async fn wait_all(store: &KubeStore, check: &ReadinessCheck, refs: &[ObjectIdentity], opts: PollOptions, output: Output) -> Result<()> {
    let mut objects: Vec<DynamicResource> = refs.iter().map(DynamicResource::new).collect();
    let outcomes = futures::future::join_all(
        refs.iter().zip(objects.iter_mut()).map(|(id, obj)| wait_for(check, store, id, obj, opts)),
    )
    .await;

    let reports: Vec<WaitReport> = refs.iter().zip(outcomes.iter()).map(|(id, o)| WaitReport::new(id, o)).collect();
    match output {
        Output::Human => {
            for r in &reports {
                match &r.message {
                    None => println!("✔ {} ready", r.object),
                    Some(msg) => println!("✗ {}: {}", r.object, msg),
                }
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    let pending = outcomes.iter().filter(|o| !o.is_ready()).count();
    if pending > 0 {
        return Err(anyhow!("{} of {} objects not ready", pending, refs.len()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);
    init_metrics(cli.metrics_addr);

    match cli.command {
        Commands::Check { target, name, watched } => {
            let check = readiness_check(&watched.condition, cli.not_found);
            let id = ObjectIdentity::new(cli.namespace.as_str(), name, target.group, target.kind);
            info!(object = %id, "check invoked");
            let store = KubeStore::try_default().await?;
            let mut obj = DynamicResource::new(&id);
            match check.check(&store, &id, &mut obj).await {
                Ok(readiness) => match cli.output {
                    Output::Human => match readiness {
                        Readiness::Ready => println!("✔ {} ready", id),
                        Readiness::Pending(p) => println!("… {} not ready: {}", id, wait::describe_pending(&p)),
                    },
                    Output::Json => println!("{}", serde_json::to_string_pretty(&readiness)?),
                },
                Err(e) => {
                    error!(object = %id, error = %e, "check failed");
                    return Err(e.into());
                }
            }
        }
        Commands::Wait { target, names, watched, polling } => {
            let check = readiness_check(&watched.condition, cli.not_found);
            let refs = build_references(&names, &cli.namespace, &target.group, &target.kind);
            info!(count = refs.len(), kind = %target.kind, ns = %cli.namespace, "wait invoked");
            let store = KubeStore::try_default().await?;
            wait_all(&store, &check, &refs, polling.options(), cli.output).await?;
        }
        Commands::Components { names, condition, polling } => {
            let check = readiness_check(&condition, cli.not_found);
            let refs = component_references(&names, &cli.namespace);
            info!(count = refs.len(), ns = %cli.namespace, condition = %condition, "components wait invoked");
            let store = KubeStore::try_default().await?;
            wait_all(&store, &check, &refs, polling.options(), cli.output).await?;
        }
        Commands::Refs { target, names } => {
            let refs = build_references(&names, &cli.namespace, &target.group, &target.kind);
            match cli.output {
                Output::Human => {
                    for r in &refs {
                        println!("{}", r);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&refs)?),
            }
        }
    }
    Ok(())
}

//! cluster-harvester - snapshot every reachable Kubernetes cluster to disk

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cluster_harvester::config::{DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_ROOT, DEFAULT_TIMEOUT_SECS};
use cluster_harvester::harvest::{self, RunError};
use cluster_harvester::{HarvestConfig, NamespaceScope, ResourceKind};

mod exit_codes;

#[derive(Parser, Debug)]
#[command(name = "cluster-harvester")]
#[command(version)]
#[command(about = "Snapshot pods, config maps, services and CRDs of every cluster found in a kubeconfig directory", long_about = None)]
struct Cli {
    /// Directory scanned recursively for *.kubeconfig files [default: $HOME/.kube/]
    #[arg(long = "kc", env = "HARVEST_KUBECONFIG_DIR", value_name = "DIR")]
    kubeconfig_dir: Option<PathBuf>,

    /// Output root directory
    #[arg(short = 'o', env = "HARVEST_OUTPUT", value_name = "DIR", default_value = DEFAULT_OUTPUT_ROOT)]
    output: PathBuf,

    /// Do not extract pods (also skips cluster-info and logs)
    #[arg(long)]
    no_pod: bool,

    /// Do not extract config maps
    #[arg(long)]
    no_cm: bool,

    /// Do not extract services
    #[arg(long)]
    no_svc: bool,

    /// Do not extract CRDs and their instances
    #[arg(long)]
    no_crd: bool,

    /// Do not fetch pod logs
    #[arg(long)]
    no_logs: bool,

    /// Write diffs against existing artifacts instead of timestamped copies
    #[arg(long)]
    diff: bool,

    /// Restrict namespaced queries to one namespace
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Per-task timeout in seconds (0 = no timeout)
    #[arg(long, env = "HARVEST_TIMEOUT", value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Maximum number of extraction tasks running at once
    #[arg(long, env = "HARVEST_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// kubectl binary
    #[arg(long, env = "KUBECTL", default_value = "kubectl")]
    kubectl: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn kinds(&self) -> Vec<ResourceKind> {
        let disabled = [
            (ResourceKind::Pods, self.no_pod),
            (ResourceKind::ConfigMaps, self.no_cm),
            (ResourceKind::Services, self.no_svc),
            (ResourceKind::CustomResourceDefinitions, self.no_crd),
        ];
        disabled
            .into_iter()
            .filter(|(_, off)| !off)
            .map(|(kind, _)| kind)
            .collect()
    }

    fn into_config(self) -> HarvestConfig {
        let kinds = self.kinds();
        HarvestConfig {
            kubeconfig_dir: self
                .kubeconfig_dir
                .unwrap_or_else(HarvestConfig::default_kubeconfig_dir),
            output_root: self.output,
            kinds,
            diff_mode: self.diff,
            collect_logs: !self.no_logs,
            namespace: self
                .namespace
                .map(NamespaceScope::Only)
                .unwrap_or_default(),
            task_timeout_secs: self.timeout,
            concurrency: self.concurrency,
            kubectl: self.kubectl,
        }
    }
}

/// Initialize tracing on stderr
fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::USAGE_ERROR,
            };
            if err.print().is_err() {
                // stdout gone (help/version piped into a closed reader)
                eprintln!("{}", err.render());
            }
            return ExitCode::from(code);
        }
    };

    init_logger(if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    });

    let config = cli.into_config();
    debug!("Resolved configuration:\n{}", config.to_yaml());

    if config.kinds.is_empty() {
        info!("All resource kinds disabled, nothing to do");
        return ExitCode::from(exit_codes::SUCCESS);
    }

    match harvest::harvest(&config).await {
        Ok(stats) => {
            info!(
                artifacts = stats.artifacts,
                "Snapshot written to {}",
                config.output_root.display()
            );
            ExitCode::from(exit_codes::SUCCESS)
        }
        Err(err @ RunError::Tasks { .. }) => {
            error!("{}", err);
            ExitCode::from(exit_codes::PARTIAL_FAILURE)
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::from(exit_codes::FATAL_ERROR)
        }
    }
}

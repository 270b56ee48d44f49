//! Resolved run configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::model::{NamespaceScope, ResourceKind};

pub const DEFAULT_OUTPUT_ROOT: &str = "/cluster-logs/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Everything a harvest run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Directory scanned recursively for `*.kubeconfig` files
    pub kubeconfig_dir: PathBuf,

    /// Root of the snapshot tree; each cluster gets a subdirectory
    pub output_root: PathBuf,

    /// Resource kinds extracted for every cluster
    pub kinds: Vec<ResourceKind>,

    /// Write `.diff` files instead of timestamped copies when an artifact exists
    pub diff_mode: bool,

    pub collect_logs: bool,
    pub namespace: NamespaceScope,

    /// Per-task timeout in seconds; `0` disables it
    pub task_timeout_secs: u64,

    pub concurrency: usize,
    pub kubectl: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            kubeconfig_dir: Self::default_kubeconfig_dir(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            kinds: ResourceKind::ALL.to_vec(),
            diff_mode: false,
            collect_logs: true,
            namespace: NamespaceScope::All,
            task_timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            kubectl: PathBuf::from("kubectl"),
        }
    }
}

impl HarvestConfig {
    /// `$HOME/.kube/`, or `.kube/` relative to the working directory if there is no home.
    pub fn default_kubeconfig_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".kube"))
            .unwrap_or_else(|| PathBuf::from(".kube"))
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }

    /// YAML rendering for debug logs.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_else(|e| format!("<unserializable config: {}>", e))
    }
}

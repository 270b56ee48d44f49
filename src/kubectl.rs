//! `kubectl`-backed implementation of [`ClusterAccess`].
//!
//! Every call shells out to `kubectl --kubeconfig=<path> ...`. Child processes
//! are killed when the calling future is dropped, so a task that hits its
//! timeout does not leave `kubectl` running behind it.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::model::{ClusterTarget, NamespaceScope};
use crate::traits::{AccessConnector, AccessError, ClusterAccess};

/// The subset of a kubeconfig file we check before talking to a cluster.
#[derive(Debug, Deserialize)]
struct KubeconfigFile {
    #[serde(default)]
    clusters: Vec<serde_yaml::Value>,
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
}

/// Connects to clusters through a `kubectl` binary.
#[derive(Debug, Clone)]
pub struct KubectlConnector {
    binary: PathBuf,
}

impl KubectlConnector {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for KubectlConnector {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl AccessConnector for KubectlConnector {
    type Access = Kubectl;

    /// Validates the kubeconfig and binds a [`Kubectl`] handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidKubeconfig`] if the file is not YAML or
    /// defines no clusters, and [`AccessError::IoError`] if it cannot be read.
    fn connect(&self, target: &ClusterTarget) -> Result<Kubectl, AccessError> {
        let raw = std::fs::read_to_string(&target.kubeconfig)?;
        let invalid = |reason: String| AccessError::InvalidKubeconfig {
            path: target.kubeconfig.display().to_string(),
            reason,
        };

        let parsed: KubeconfigFile = serde_yaml::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
        if parsed.clusters.is_empty() {
            return Err(invalid("no clusters defined".to_string()));
        }

        Ok(Kubectl {
            binary: self.binary.clone(),
            kubeconfig: target.kubeconfig.clone(),
            cluster: target.name.clone(),
            context: parsed.current_context,
        })
    }
}

/// Handle on one cluster, backed by `kubectl`.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    kubeconfig: PathBuf,
    cluster: String,
    context: Option<String>,
}

impl Kubectl {
    /// `current-context` of the kubeconfig, if it sets one.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn base_args(&self) -> Vec<String> {
        vec![format!("--kubeconfig={}", self.kubeconfig.display())]
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut parts = vec![self.binary.display().to_string()];
        parts.extend(self.base_args());
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }

    async fn run(&self, args: Vec<String>) -> Result<String, AccessError> {
        let command = self.command_line(&args);
        debug!(cluster = %self.cluster, command = %command, "Executing command");

        let output = Command::new(&self.binary)
            .args(self.base_args())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AccessError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(cluster = %self.cluster, command = %command, "Command failed: {}", stderr);
            return Err(AccessError::CommandFailed {
                command,
                status: output.status.to_string(),
                output: stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn scope_args(scope: &NamespaceScope) -> Vec<String> {
    match scope {
        NamespaceScope::All => vec!["--all-namespaces".to_string()],
        NamespaceScope::Only(ns) => vec!["-n".to_string(), ns.clone()],
    }
}

#[async_trait]
impl ClusterAccess for Kubectl {
    fn cluster(&self) -> &str {
        &self.cluster
    }

    async fn list_pods(&self, scope: &NamespaceScope) -> Result<String, AccessError> {
        let mut args = vec!["get".to_string(), "pods".to_string()];
        args.extend(scope_args(scope));
        args.extend(["-o".to_string(), "wide".to_string()]);
        self.run(args).await
    }

    async fn describe(
        &self,
        resource: &str,
        scope: &NamespaceScope,
    ) -> Result<String, AccessError> {
        let mut args = vec!["describe".to_string(), resource.to_string()];
        args.extend(scope_args(scope));
        self.run(args).await
    }

    async fn logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
        previous: bool,
    ) -> Result<String, AccessError> {
        let mut args = vec![
            "logs".to_string(),
            "-n".to_string(),
            namespace.to_string(),
            pod.to_string(),
        ];
        if let Some(container) = container {
            args.extend(["-c".to_string(), container.to_string()]);
        }
        if previous {
            args.push("-p".to_string());
        }
        self.run(args).await
    }

    async fn dump_cluster_info(
        &self,
        output_dir: &Path,
        scope: &NamespaceScope,
    ) -> Result<(), AccessError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let mut args = vec!["cluster-info".to_string(), "dump".to_string()];
        match scope {
            NamespaceScope::All => args.push("--all-namespaces".to_string()),
            NamespaceScope::Only(ns) => args.extend(["--namespaces".to_string(), ns.clone()]),
        }
        args.extend([
            "--output-directory".to_string(),
            output_dir.display().to_string(),
        ]);
        self.run(args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target_with(content: &str) -> (TempDir, ClusterTarget) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.kubeconfig");
        std::fs::write(&path, content).unwrap();
        let target = ClusterTarget::new(path, Path::new("/out"));
        (dir, target)
    }

    #[test]
    fn test_connect_reads_current_context() {
        let (_dir, target) = target_with(
            "apiVersion: v1\nkind: Config\ncurrent-context: dev\nclusters:\n- name: dev\n  cluster:\n    server: https://127.0.0.1:6443\n",
        );

        let kubectl = KubectlConnector::default().connect(&target).unwrap();
        assert_eq!(kubectl.cluster(), "dev.kubeconfig");
        assert_eq!(kubectl.context(), Some("dev"));
    }

    #[test]
    fn test_connect_rejects_config_without_clusters() {
        let (_dir, target) = target_with("apiVersion: v1\nkind: Config\nclusters: []\n");

        let err = KubectlConnector::default().connect(&target).unwrap_err();
        assert!(matches!(err, AccessError::InvalidKubeconfig { .. }));
        assert!(err.to_string().contains("no clusters defined"));
    }

    #[test]
    fn test_connect_rejects_non_yaml_mapping() {
        let (_dir, target) = target_with("just a string");

        let err = KubectlConnector::default().connect(&target).unwrap_err();
        assert!(matches!(err, AccessError::InvalidKubeconfig { .. }));
    }

    #[test]
    fn test_connect_missing_file_is_io_error() {
        let target = ClusterTarget::new("/nonexistent/gone.kubeconfig", Path::new("/out"));

        let err = KubectlConnector::default().connect(&target).unwrap_err();
        assert!(matches!(err, AccessError::IoError(_)));
    }

    #[test]
    fn test_command_line_includes_kubeconfig() {
        let (_dir, target) = target_with("clusters:\n- name: dev\n");
        let kubectl = KubectlConnector::new("/usr/bin/kubectl")
            .connect(&target)
            .unwrap();

        let line = kubectl.command_line(&["describe".to_string(), "pods".to_string()]);
        assert!(line.starts_with("/usr/bin/kubectl --kubeconfig="));
        assert!(line.ends_with("dev.kubeconfig describe pods"));
    }

    #[test]
    fn test_scope_args() {
        assert_eq!(scope_args(&NamespaceScope::All), vec!["--all-namespaces"]);
        assert_eq!(
            scope_args(&NamespaceScope::Only("kube-system".to_string())),
            vec!["-n", "kube-system"]
        );
    }
}

use crate::model::{ClusterTarget, NamespaceScope};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Invalid kubeconfig {path}: {reason}")]
    InvalidKubeconfig { path: String, reason: String },
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Read-only view of one cluster, as needed to snapshot it.
#[async_trait]
pub trait ClusterAccess: Send + Sync {
    /// Name of the cluster this handle is bound to.
    fn cluster(&self) -> &str;

    /// Flat, human-readable pod listing.
    async fn list_pods(&self, scope: &NamespaceScope) -> Result<String, AccessError>;

    /// Multi-object `describe` dump for a resource (`pods`, `configmaps`, a CRD name, ...).
    async fn describe(&self, resource: &str, scope: &NamespaceScope)
        -> Result<String, AccessError>;

    /// Logs of one pod. Pods with several containers fail unless `container` is set;
    /// the error text then lists the container names in brackets.
    async fn logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
        previous: bool,
    ) -> Result<String, AccessError>;

    /// Writes a raw cluster state dump into `output_dir`.
    async fn dump_cluster_info(
        &self,
        output_dir: &Path,
        scope: &NamespaceScope,
    ) -> Result<(), AccessError>;
}

/// Builds a [`ClusterAccess`] for a discovered cluster.
pub trait AccessConnector: Send + Sync {
    type Access: ClusterAccess + 'static;

    fn connect(&self, target: &ClusterTarget) -> Result<Self::Access, AccessError>;
}

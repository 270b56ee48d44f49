//! In-memory cluster access for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::harvest::traits::{DescribeParser, ExtractionContext};
use crate::model::{ClusterTarget, NamespaceScope};
use crate::snapshot::SnapshotWriter;
use crate::traits::{AccessConnector, AccessError, ClusterAccess};

fn failure(message: &str) -> AccessError {
    AccessError::CommandFailed {
        command: "mock".to_string(),
        status: "exit status: 1".to_string(),
        output: message.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockAccess {
    cluster: String,
    pods_listing: String,
    describes: HashMap<String, Result<String, String>>,
    logs: HashMap<(String, Option<String>), Result<String, String>>,
    delay: Option<Duration>,
}

impl MockAccess {
    pub fn new(cluster: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            pods_listing: "NAMESPACE   NAME\n".to_string(),
            ..Default::default()
        }
    }

    pub fn with_describe(mut self, resource: &str, dump: &str) -> Self {
        self.describes
            .insert(resource.to_string(), Ok(dump.to_string()));
        self
    }

    pub fn failing_describe(mut self, resource: &str, message: &str) -> Self {
        self.describes
            .insert(resource.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_logs(mut self, pod: &str, container: Option<&str>, text: &str) -> Self {
        self.logs.insert(
            (pod.to_string(), container.map(str::to_string)),
            Ok(text.to_string()),
        );
        self
    }

    pub fn failing_logs(mut self, pod: &str, container: Option<&str>, message: &str) -> Self {
        self.logs.insert(
            (pod.to_string(), container.map(str::to_string)),
            Err(message.to_string()),
        );
        self
    }

    /// Every describe call sleeps this long first.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn into_context(self, output_dir: &Path, diff_mode: bool) -> ExtractionContext {
        ExtractionContext {
            access: Arc::new(self),
            writer: SnapshotWriter::new(diff_mode),
            output_dir: output_dir.to_path_buf(),
            scope: NamespaceScope::All,
            parser: Arc::new(DescribeParser),
        }
    }
}

#[async_trait]
impl ClusterAccess for MockAccess {
    fn cluster(&self) -> &str {
        &self.cluster
    }

    async fn list_pods(&self, _scope: &NamespaceScope) -> Result<String, AccessError> {
        Ok(self.pods_listing.clone())
    }

    async fn describe(
        &self,
        resource: &str,
        _scope: &NamespaceScope,
    ) -> Result<String, AccessError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.describes.get(resource) {
            Some(Ok(dump)) => Ok(dump.clone()),
            Some(Err(message)) => Err(failure(message)),
            None => Ok(String::new()),
        }
    }

    async fn logs(
        &self,
        _namespace: &str,
        pod: &str,
        container: Option<&str>,
        _previous: bool,
    ) -> Result<String, AccessError> {
        let key = (pod.to_string(), container.map(str::to_string));
        match self.logs.get(&key) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(failure(message)),
            None => Ok(format!("{} started\n", pod)),
        }
    }

    async fn dump_cluster_info(
        &self,
        output_dir: &Path,
        _scope: &NamespaceScope,
    ) -> Result<(), AccessError> {
        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::write(output_dir.join("nodes.json"), "{}").await?;
        Ok(())
    }
}

/// Hands out pre-built [`MockAccess`] handles by cluster name.
#[derive(Debug, Default)]
pub struct MockConnector {
    clusters: HashMap<String, MockAccess>,
}

impl MockConnector {
    pub fn with(mut self, access: MockAccess) -> Self {
        self.clusters.insert(access.cluster.clone(), access);
        self
    }
}

impl AccessConnector for MockConnector {
    type Access = MockAccess;

    fn connect(&self, target: &ClusterTarget) -> Result<MockAccess, AccessError> {
        self.clusters
            .get(&target.name)
            .cloned()
            .ok_or_else(|| AccessError::InvalidKubeconfig {
                path: target.kubeconfig.display().to_string(),
                reason: "no clusters defined".to_string(),
            })
    }
}

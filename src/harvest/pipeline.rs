//! Multi-cluster harvest orchestrator.
//!
//! This module provides the [`HarvestPipeline`] coordinator that fans out one
//! extraction task per (cluster, resource kind) pair with:
//! - Async execution via `tokio`, bounded by [`HarvesterExecutor`]
//! - Configurable per-task timeouts
//! - Structured logging via `tracing`
//! - Partial-failure aggregation: a failing task never cancels its siblings

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::config::HarvestConfig;
use crate::discovery::{self, DiscoveryError};
use crate::executor::{HarvesterExecutor, TaskError};
use crate::harvest::kinds::{extractor_for, ExtractOptions};
use crate::harvest::traits::{DescribeParser, DumpParser, ExtractStats, ExtractionContext};
use crate::kubectl::KubectlConnector;
use crate::model::{ClusterTarget, NamespaceScope, ResourceKind};
use crate::snapshot::SnapshotWriter;
use crate::traits::{AccessConnector, AccessError, ClusterAccess};

// ============================================================================
// Pipeline Types
// ============================================================================

/// One unit of work: a resource kind on a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTask {
    pub cluster: String,
    pub kind: ResourceKind,
}

impl fmt::Display for ExtractionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.kind)
    }
}

/// A task that did not succeed, with the context needed to diagnose it.
#[derive(Debug)]
pub struct TaskFailure {
    pub task: ExtractionTask,
    pub error: TaskError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.task, self.error)
    }
}

/// Every task failure of a run, reported once all tasks have finished.
#[derive(Debug, Default)]
pub struct AggregateError {
    failures: Vec<TaskFailure>,
}

impl AggregateError {
    pub fn push(&mut self, failure: TaskFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} extraction task(s) failed:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n\t{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Statistics about a harvest run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestStats {
    /// Number of clusters harvested
    pub clusters: usize,

    /// Number of extraction tasks launched
    pub tasks: usize,

    /// Number of tasks that failed or timed out
    pub failed_tasks: usize,

    /// Records parsed by successful tasks
    pub records: usize,

    /// Files written by successful tasks
    pub artifacts: usize,

    /// Wall-clock time of the whole run (milliseconds)
    pub total_duration_ms: u64,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors that end a harvest run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    /// Kubeconfig discovery failed; nothing was attempted
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A cluster handle could not be built; nothing was attempted
    #[error("Failed to build cluster access for {cluster}: {source}")]
    Connect {
        cluster: String,
        #[source]
        source: AccessError,
    },

    /// Every task ran, some failed; the rest of the snapshot was written
    #[error("{errors}")]
    Tasks {
        stats: HarvestStats,
        errors: AggregateError,
    },
}

impl RunError {
    /// `true` when the run stopped before any extraction was attempted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RunError::Tasks { .. })
    }
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Fans extraction out over clusters and resource kinds.
///
/// Every cluster is connected before any task starts; a connector failure
/// aborts the run. After that, every task runs to completion (or timeout)
/// regardless of what its siblings do, and failures are collected into one
/// [`AggregateError`].
///
/// # Example
///
/// ```ignore
/// let pipeline = HarvestPipeline::new(KubectlConnector::default())
///     .with_timeout(Some(Duration::from_secs(120)))
///     .with_diff_mode(true);
///
/// let stats = pipeline.run(&targets).await?;
/// println!("Wrote {} artifacts", stats.artifacts);
/// ```
pub struct HarvestPipeline<C>
where
    C: AccessConnector,
{
    connector: C,

    /// Kinds extracted for every cluster
    kinds: Vec<ResourceKind>,

    writer: SnapshotWriter,
    scope: NamespaceScope,
    options: ExtractOptions,
    parser: Arc<dyn DumpParser>,

    /// Timeout for each task (default: 5 minutes)
    task_timeout: Option<Duration>,

    /// Tasks allowed to run at once
    concurrency: usize,
}

impl<C> HarvestPipeline<C>
where
    C: AccessConnector,
{
    /// Creates a pipeline over all resource kinds.
    ///
    /// Default configuration:
    /// - Timeout: 5 minutes per task
    /// - Concurrency: 8 tasks
    /// - Diff mode: off, pod logs: on, all namespaces
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            kinds: ResourceKind::ALL.to_vec(),
            writer: SnapshotWriter::default(),
            scope: NamespaceScope::All,
            options: ExtractOptions::default(),
            parser: Arc::new(DescribeParser),
            task_timeout: Some(Duration::from_secs(300)),
            concurrency: 8,
        }
    }

    /// Pipeline configured from a resolved [`HarvestConfig`].
    pub fn from_config(connector: C, config: &HarvestConfig) -> Self {
        Self::new(connector)
            .with_kinds(config.kinds.clone())
            .with_diff_mode(config.diff_mode)
            .with_scope(config.namespace.clone())
            .with_logs(config.collect_logs)
            .with_timeout(config.task_timeout())
            .with_concurrency(config.concurrency)
    }

    pub fn with_kinds(mut self, kinds: Vec<ResourceKind>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_diff_mode(mut self, diff_mode: bool) -> Self {
        self.writer = SnapshotWriter::new(diff_mode);
        self
    }

    pub fn with_scope(mut self, scope: NamespaceScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_logs(mut self, collect_logs: bool) -> Self {
        self.options.collect_logs = collect_logs;
        self
    }

    /// Replaces the `describe` text parser.
    pub fn with_parser(mut self, parser: Arc<dyn DumpParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Sets the per-task timeout; `None` lets tasks run indefinitely.
    pub fn with_timeout(mut self, task_timeout: Option<Duration>) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Harvests every target and waits for all tasks before reporting.
    ///
    /// # Errors
    ///
    /// - [`RunError::Connect`] if any cluster handle cannot be built; no task is started
    /// - [`RunError::Tasks`] if one or more tasks failed; all others have written their output
    #[instrument(skip_all, fields(clusters = targets.len()))]
    pub async fn run(&self, targets: &[ClusterTarget]) -> Result<HarvestStats, RunError> {
        let start = Instant::now();

        // ====================================================================
        // Stage 1: Connect
        // ====================================================================

        let mut connected: Vec<(&ClusterTarget, Arc<dyn ClusterAccess>)> =
            Vec::with_capacity(targets.len());
        for target in targets {
            let access = self
                .connector
                .connect(target)
                .map_err(|source| RunError::Connect {
                    cluster: target.name.clone(),
                    source,
                })?;
            info!(cluster = %target.name, kubeconfig = %target.kubeconfig.display(), "Connected");
            let access: Arc<dyn ClusterAccess> = Arc::new(access);
            connected.push((target, access));
        }

        // ====================================================================
        // Stage 2: Fan out
        // ====================================================================

        let executor = Arc::new(
            HarvesterExecutor::new(self.concurrency).with_timeout(self.task_timeout),
        );
        let mut handles = Vec::with_capacity(connected.len() * self.kinds.len());

        for (target, access) in &connected {
            for kind in &self.kinds {
                let task = ExtractionTask {
                    cluster: target.name.clone(),
                    kind: *kind,
                };
                let ctx = ExtractionContext {
                    access: access.clone(),
                    writer: self.writer,
                    output_dir: target.output_dir.clone(),
                    scope: self.scope.clone(),
                    parser: self.parser.clone(),
                };
                let extractor = extractor_for(*kind, self.options);
                let executor = executor.clone();
                let label = task.to_string();

                let handle = tokio::spawn(async move {
                    executor
                        .execute(&label, async move { extractor.extract(&ctx).await })
                        .await
                });
                handles.push((task, handle));
            }
        }

        info!(tasks = handles.len(), "Launched extraction tasks");

        // ====================================================================
        // Stage 3: Barrier and aggregation
        // ====================================================================

        let mut stats = HarvestStats {
            clusters: connected.len(),
            tasks: handles.len(),
            ..Default::default()
        };
        let mut errors = AggregateError::default();

        for (task, handle) in handles {
            let outcome: Result<ExtractStats, TaskError> = handle
                .await
                .unwrap_or_else(|e| Err(TaskError::Aborted(e.to_string())));

            match outcome {
                Ok(task_stats) => {
                    stats.records += task_stats.records;
                    stats.artifacts += task_stats.artifacts;
                }
                Err(error) => {
                    warn!(task = %task, "Extraction failed: {}", error);
                    errors.push(TaskFailure { task, error });
                }
            }
        }

        stats.failed_tasks = errors.failures().len();
        stats.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            clusters = stats.clusters,
            tasks = stats.tasks,
            failed = stats.failed_tasks,
            artifacts = stats.artifacts,
            duration_ms = stats.total_duration_ms,
            "Harvest completed"
        );

        if errors.is_empty() {
            Ok(stats)
        } else {
            Err(RunError::Tasks { stats, errors })
        }
    }
}

/// Discovers kubeconfigs under `config.kubeconfig_dir` and harvests them all
/// through `kubectl`.
pub async fn harvest(config: &HarvestConfig) -> Result<HarvestStats, RunError> {
    let targets = discovery::discover_targets(&config.kubeconfig_dir, &config.output_root)?;
    HarvestPipeline::from_config(KubectlConnector::new(&config.kubectl), config)
        .run(&targets)
        .await
}

// ============================================================================
// Tests
// ============================================================================

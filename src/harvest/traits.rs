//! Core traits and types for resource extraction.
//!
//! - Extraction abstraction via [`ResourceExtractor`]
//! - Dump parsing via [`DumpParser`], with [`DescribeParser`] for `kubectl describe` text
//! - Per-task inputs via [`ExtractionContext`]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{NamespaceScope, ResourceRecord};
use crate::snapshot::{SnapshotError, SnapshotWriter, WriteOutcome};
use crate::traits::{AccessError, ClusterAccess};

/// Marker printed by `kubectl` when a query matched nothing.
pub const NO_RESOURCES: &str = "No resources found";

/// Records in a `describe` dump start with this label at the beginning of a line.
pub const NAME_LABEL: &str = "Name:";
const NAMESPACE_LABEL: &str = "Namespace:";

// ============================================================================
// Extractor Trait
// ============================================================================

/// Snapshots one kind of cluster object.
///
/// Implementations fetch a dump through [`ExtractionContext::access`], split
/// it into records and persist each through [`ExtractionContext::writer`].
/// An empty result is a successful no-op.
#[async_trait]
pub trait ResourceExtractor: Send + Sync {
    /// Short label used in logs and failure reports.
    fn kind(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the cluster query or a write fails.
    /// Extractors that fan out over many objects attempt all of them and
    /// report [`ExtractionError::Partial`].
    async fn extract(&self, ctx: &ExtractionContext) -> Result<ExtractStats, ExtractionError>;
}

/// Everything one extraction task needs, owned so the task can be spawned.
#[derive(Clone)]
pub struct ExtractionContext {
    pub access: Arc<dyn ClusterAccess>,
    pub writer: SnapshotWriter,
    /// Snapshot folder of the cluster (`<output root>/<cluster name>`).
    pub output_dir: PathBuf,
    pub scope: NamespaceScope,
    pub parser: Arc<dyn DumpParser>,
}

/// Counters reported by an extractor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub records: usize,
    pub artifacts: usize,
}

impl ExtractStats {
    pub fn record(&mut self, outcome: &WriteOutcome) {
        if outcome.wrote() {
            self.artifacts += 1;
        }
    }

    pub fn merge(&mut self, other: ExtractStats) {
        self.records += other.records;
        self.artifacts += other.artifacts;
    }
}

// ============================================================================
// Dump Parsing
// ============================================================================

/// Turns a multi-object text dump into records.
pub trait DumpParser: Send + Sync {
    fn parse(&self, kind: &str, dump: &str) -> Vec<ResourceRecord>;
}

/// Parser for `kubectl describe` output.
///
/// Records are separated by a newline followed by `Name:`. The separator is
/// consumed by the split, so every record but the first gets the label back.
#[derive(Debug, Default, Clone, Copy)]
pub struct DescribeParser;

impl DescribeParser {
    /// `true` for the dumps `kubectl` produces when nothing matched.
    pub fn is_empty_dump(dump: &str) -> bool {
        let dump = dump.trim();
        dump.is_empty() || dump.starts_with(NO_RESOURCES)
    }
}

fn first_line_name(body: &str) -> String {
    let line = body.split('\n').next().unwrap_or_default();
    line.strip_prefix(NAME_LABEL).unwrap_or(line).trim().to_string()
}

fn top_level_field(body: &str, label: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl DumpParser for DescribeParser {
    fn parse(&self, kind: &str, dump: &str) -> Vec<ResourceRecord> {
        if Self::is_empty_dump(dump) {
            return Vec::new();
        }

        let delimiter = format!("\n{}", NAME_LABEL);
        dump.split(delimiter.as_str())
            .enumerate()
            .map(|(i, chunk)| {
                let body = if i == 0 {
                    chunk.to_string()
                } else {
                    format!("{}{}", NAME_LABEL, chunk)
                };
                ResourceRecord {
                    name: first_line_name(&body),
                    namespace: top_level_field(&body, NAMESPACE_LABEL),
                    kind: kind.to_string(),
                    body,
                }
            })
            .collect()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while extracting one resource kind.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The cluster query failed
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Persisting an artifact failed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Some objects of a fan-out could not be extracted; the rest were written
    #[error("{} of {attempted} {what} failed: {}", failures.len(), failures.join("; "))]
    Partial {
        what: &'static str,
        attempted: usize,
        failures: Vec<String>,
    },
}

// ============================================================================
// Tests
// ============================================================================

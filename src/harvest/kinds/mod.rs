//! Resource kind implementations of [`ResourceExtractor`].
//!
//! - [`DescribeExtractor`] - config maps and services (describe, split, write)
//! - [`PodExtractor`] - cluster-info dump, pod listing, descriptions and logs
//! - [`CrdExtractor`] - CRD descriptions plus their instances via [`CustomResourceExtractor`]

mod crds;
mod describe;
mod logs;
mod pods;

pub use crds::{CrdExtractor, CustomResourceExtractor, INSTANCES_DIR};
pub use describe::DescribeExtractor;
pub use logs::{collect_pod_logs, container_names, LOGS_DIR};
pub use pods::{PodExtractor, CLUSTER_INFO_DIR, POD_LISTING};

use std::path::Path;
use std::sync::Arc;

use crate::harvest::traits::{ExtractStats, ExtractionContext, ExtractionError, ResourceExtractor};
use crate::model::{ResourceKind, ResourceRecord};
use crate::snapshot::YAML;

/// Knobs that change what an extractor does beyond its kind.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub collect_logs: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { collect_logs: true }
    }
}

/// The extractor responsible for `kind`.
pub fn extractor_for(kind: ResourceKind, options: ExtractOptions) -> Arc<dyn ResourceExtractor> {
    match kind {
        ResourceKind::Pods => Arc::new(PodExtractor {
            collect_logs: options.collect_logs,
        }),
        ResourceKind::ConfigMaps | ResourceKind::Services => Arc::new(DescribeExtractor::new(kind)),
        ResourceKind::CustomResourceDefinitions => Arc::new(CrdExtractor),
    }
}

/// Describes `resource` and splits the dump into records.
pub(crate) async fn fetch_records(
    ctx: &ExtractionContext,
    resource: &str,
    kind: &str,
) -> Result<Vec<ResourceRecord>, ExtractionError> {
    let dump = ctx.access.describe(resource, &ctx.scope).await?;
    Ok(ctx.parser.parse(kind, &dump))
}

/// Writes one YAML artifact per record into `dir`, named after the record.
pub(crate) async fn write_records(
    ctx: &ExtractionContext,
    dir: &Path,
    records: &[ResourceRecord],
) -> Result<ExtractStats, ExtractionError> {
    let mut stats = ExtractStats {
        records: records.len(),
        artifacts: 0,
    };
    for (i, record) in records.iter().enumerate() {
        let outcome = ctx
            .writer
            .write(dir, &record.file_stem(i), &record.body, YAML)
            .await?;
        stats.record(&outcome);
    }
    Ok(stats)
}

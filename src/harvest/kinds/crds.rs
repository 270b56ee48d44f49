use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{fetch_records, write_records};
use crate::harvest::traits::{ExtractStats, ExtractionContext, ExtractionError, ResourceExtractor};
use crate::model::ResourceKind;
use crate::snapshot::YAML;

pub const INSTANCES_DIR: &str = "instances";

/// Custom resource definitions, each in its own folder next to its instances:
/// `crd/<name>/<name>.yaml` and `crd/<name>/instances/<instance>.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrdExtractor;

#[async_trait]
impl ResourceExtractor for CrdExtractor {
    fn kind(&self) -> &'static str {
        ResourceKind::CustomResourceDefinitions.api_resource()
    }

    async fn extract(&self, ctx: &ExtractionContext) -> Result<ExtractStats, ExtractionError> {
        let records = fetch_records(
            ctx,
            ResourceKind::CustomResourceDefinitions.api_resource(),
            self.kind(),
        )
        .await?;
        if records.is_empty() {
            debug!(cluster = ctx.access.cluster(), "No CRDs found");
            return Ok(ExtractStats::default());
        }

        let root = ctx
            .output_dir
            .join(ResourceKind::CustomResourceDefinitions.output_subdir());
        let mut stats = ExtractStats {
            records: records.len(),
            artifacts: 0,
        };
        let mut failures = Vec::new();

        for (i, crd) in records.iter().enumerate() {
            let stem = crd.file_stem(i);
            let dir = root.join(&stem);
            stats.record(&ctx.writer.write(&dir, &stem, &crd.body, YAML).await?);

            let instances = CustomResourceExtractor {
                crd: crd.name.clone(),
                crd_dir: dir,
            };
            match instances.extract(ctx).await {
                Ok(instance_stats) => stats.merge(instance_stats),
                Err(e) => {
                    warn!(cluster = ctx.access.cluster(), crd = %crd.name, "Instance extraction failed: {}", e);
                    failures.push(format!("{}: {}", crd.name, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(stats)
        } else {
            Err(ExtractionError::Partial {
                what: "custom resource extractions",
                attempted: records.len(),
                failures,
            })
        }
    }
}

/// Instances of one CRD, written under `<crd_dir>/instances/`.
#[derive(Debug, Clone)]
pub struct CustomResourceExtractor {
    pub crd: String,
    pub crd_dir: PathBuf,
}

#[async_trait]
impl ResourceExtractor for CustomResourceExtractor {
    fn kind(&self) -> &'static str {
        "custom-resources"
    }

    async fn extract(&self, ctx: &ExtractionContext) -> Result<ExtractStats, ExtractionError> {
        if self.crd.is_empty() {
            return Ok(ExtractStats::default());
        }
        let records = fetch_records(ctx, &self.crd, &self.crd).await?;
        if records.is_empty() {
            return Ok(ExtractStats::default());
        }
        write_records(ctx, &self.crd_dir.join(INSTANCES_DIR), &records).await
    }
}

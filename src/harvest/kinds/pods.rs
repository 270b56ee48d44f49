use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{collect_pod_logs, fetch_records, write_records};
use crate::harvest::traits::{ExtractStats, ExtractionContext, ExtractionError, ResourceExtractor};
use crate::model::ResourceKind;
use crate::snapshot::OUT;

pub const CLUSTER_INFO_DIR: &str = "cluster-info";
pub const POD_LISTING: &str = "pods";

/// Pods, plus the general cluster state that comes with them.
///
/// In order: a `cluster-info` dump, the flat pod listing (`pods.out`), one
/// description per pod under `pods-describe/`, and, when enabled, pod logs
/// under `pods-logs/`.
#[derive(Debug, Clone, Copy)]
pub struct PodExtractor {
    pub collect_logs: bool,
}

#[async_trait]
impl ResourceExtractor for PodExtractor {
    fn kind(&self) -> &'static str {
        ResourceKind::Pods.api_resource()
    }

    #[instrument(skip_all, fields(cluster = ctx.access.cluster()))]
    async fn extract(&self, ctx: &ExtractionContext) -> Result<ExtractStats, ExtractionError> {
        let mut stats = ExtractStats::default();

        let info_dir = ctx.writer.fresh_dir(&ctx.output_dir, CLUSTER_INFO_DIR).await?;
        ctx.access.dump_cluster_info(&info_dir, &ctx.scope).await?;
        debug!(path = %info_dir.display(), "Cluster info dumped");

        let listing = ctx.access.list_pods(&ctx.scope).await?;
        stats.record(
            &ctx.writer
                .write(&ctx.output_dir, POD_LISTING, &listing, OUT)
                .await?,
        );

        let records = fetch_records(ctx, ResourceKind::Pods.api_resource(), self.kind()).await?;
        if records.is_empty() {
            debug!("No pods found");
            return Ok(stats);
        }

        let dir = ctx.output_dir.join(ResourceKind::Pods.output_subdir());
        stats.merge(write_records(ctx, &dir, &records).await?);

        if self.collect_logs {
            stats.merge(collect_pod_logs(ctx, &records).await?);
        }
        Ok(stats)
    }
}

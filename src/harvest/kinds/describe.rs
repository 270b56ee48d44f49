use async_trait::async_trait;
use tracing::debug;

use super::{fetch_records, write_records};
use crate::harvest::traits::{ExtractStats, ExtractionContext, ExtractionError, ResourceExtractor};
use crate::model::ResourceKind;

/// Describe-split-write for kinds with no extra steps (config maps, services).
#[derive(Debug, Clone, Copy)]
pub struct DescribeExtractor {
    kind: ResourceKind,
}

impl DescribeExtractor {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl ResourceExtractor for DescribeExtractor {
    fn kind(&self) -> &'static str {
        self.kind.api_resource()
    }

    async fn extract(&self, ctx: &ExtractionContext) -> Result<ExtractStats, ExtractionError> {
        let records = fetch_records(ctx, self.kind.api_resource(), self.kind()).await?;
        if records.is_empty() {
            debug!(cluster = ctx.access.cluster(), kind = self.kind(), "No resources found");
            return Ok(ExtractStats::default());
        }

        let dir = ctx.output_dir.join(self.kind.output_subdir());
        write_records(ctx, &dir, &records).await
    }
}

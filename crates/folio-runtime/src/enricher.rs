//! The enrichment collaborator interface.

use async_trait::async_trait;
use thiserror::Error;

use folio_core::{BlockAnnotation, EnrichmentHints, EnrichmentRequest};

/// Errors an enricher reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnricherError {
    #[error("Enrichment call failed: {0}")]
    CallFailed(String),

    #[error("Enricher returned an annotation for block {0}, which was not in the batch")]
    UnexpectedBlock(String),

    #[error("Malformed enrichment response: {0}")]
    Malformed(String),
}

/// Something that attaches structured fields to blocks.
///
/// # Contract
/// - Receives at most one batch of requests per call
/// - Returns annotations only for block ids in that batch
/// - Never sees or returns core-computed fields
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Stable name, part of the cache key.
    fn name(&self) -> &str;

    /// Annotate one batch of blocks.
    async fn enrich(
        &self,
        batch: &[EnrichmentRequest],
        hints: &EnrichmentHints,
    ) -> Result<Vec<BlockAnnotation>, EnricherError>;
}

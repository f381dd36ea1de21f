//! Enrichment runner.
//!
//! Sends blocks to an [`Enricher`] in bounded batches and merges the
//! annotations back by block id. Each batch is guarded by:
//! - the annotation cache (cached blocks are never re-sent)
//! - the circuit for this enricher and domain
//! - a per-batch timeout
//!
//! Batch failures and circuit trips are returned to the caller, never
//! swallowed.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use folio_core::enrichment::{batches, merge_annotations};
use folio_core::{
    Block, BlockAnnotation, EnrichedBlock, EnrichmentHints, EnrichmentRequest, PipelineWarning,
};

use crate::cache::{AnnotationCache, CacheKey};
use crate::config::EnrichmentConfig;
use crate::enricher::{Enricher, EnricherError};
use crate::resilience::{CircuitBreaker, CircuitKey, CircuitTrip};
use crate::RuntimeError;

/// A batch that produced no annotations.
#[derive(Debug)]
pub struct BatchFailure {
    /// Blocks in the failed batch, in order
    pub block_ids: Vec<String>,
    pub error: RuntimeError,
}

/// Result of enriching a document's blocks.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    /// Every input block, in order, with whatever enrichment it received
    pub blocks: Vec<EnrichedBlock>,

    pub failures: Vec<BatchFailure>,

    /// One per circuit trip during this run
    pub warnings: Vec<PipelineWarning>,

    /// Blocks served from the cache
    pub cache_hits: usize,
}

impl EnrichmentOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs an enricher over blocks.
pub struct EnrichmentRunner {
    enricher: Arc<dyn Enricher>,
    config: EnrichmentConfig,
    circuit_breaker: CircuitBreaker,
    cache: AnnotationCache,
}

impl EnrichmentRunner {
    pub fn new(enricher: Arc<dyn Enricher>, config: EnrichmentConfig) -> Self {
        let circuit_breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        let cache = AnnotationCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            enricher,
            config,
            circuit_breaker,
            cache,
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub fn cache(&self) -> &AnnotationCache {
        &self.cache
    }

    /// Enrich blocks. Errors only when the merge itself fails; batch
    /// failures are reported in the outcome.
    pub async fn enrich(
        &self,
        blocks: &[Block],
        hints: &EnrichmentHints,
    ) -> Result<EnrichmentOutcome, RuntimeError> {
        let name = self.enricher.name().to_string();
        let circuit = CircuitKey::new(name.as_str(), hints.domain);
        let mut annotations = Vec::new();
        let mut pending = Vec::new();

        for block in blocks {
            match self.cache.get(&CacheKey::new(name.as_str(), block.id.as_str())).await {
                Some(annotation) => annotations.push(annotation),
                None => pending.push(block.clone()),
            }
        }
        let cache_hits = annotations.len();

        let work = batches(&pending, self.config.effective_batch_size());
        let circuit = &circuit;
        let results: Vec<(Vec<String>, BatchRun)> = stream::iter(work)
            .map(|batch| async move {
                let ids = batch.iter().map(|r| r.block_id.clone()).collect();
                (ids, self.run_batch(circuit, &batch, hints).await)
            })
            .buffered(self.config.max_concurrent_batches.max(1))
            .collect()
            .await;

        let mut failures = Vec::new();
        let mut warnings = Vec::new();
        for (block_ids, run) in results {
            if let Some(trip) = &run.trip {
                warnings.push(PipelineWarning::from(trip));
            }
            match run.result {
                Ok(batch_annotations) => {
                    for annotation in &batch_annotations {
                        self.cache
                            .insert(
                                CacheKey::new(name.as_str(), annotation.block_id.as_str()),
                                annotation.clone(),
                            )
                            .await;
                    }
                    annotations.extend(batch_annotations);
                }
                Err(error) => {
                    tracing::debug!(
                        circuit = %circuit,
                        blocks = block_ids.len(),
                        error = %error,
                        "Enrichment batch failed"
                    );
                    failures.push(BatchFailure { block_ids, error });
                }
            }
        }

        let blocks = merge_annotations(blocks, &annotations)?;

        Ok(EnrichmentOutcome {
            blocks,
            failures,
            warnings,
            cache_hits,
        })
    }

    /// One batch under its circuit and the timeout. Annotations for the
    /// same block are folded into one, later fields winning.
    async fn run_batch(
        &self,
        circuit: &CircuitKey,
        batch: &[EnrichmentRequest],
        hints: &EnrichmentHints,
    ) -> BatchRun {
        if let Err(retry_in) = self.circuit_breaker.admit(circuit) {
            return BatchRun {
                result: Err(RuntimeError::CircuitOpen {
                    circuit: circuit.clone(),
                    retry_in,
                }),
                trip: None,
            };
        }

        let timeout = self.config.batch_timeout;
        let result = match tokio::time::timeout(timeout, self.enricher.enrich(batch, hints)).await
        {
            Ok(Ok(annotations)) => check_batch(batch, annotations).map_err(RuntimeError::from),
            Ok(Err(e)) => Err(RuntimeError::from(e)),
            Err(_) => Err(RuntimeError::Timeout(timeout)),
        };

        let trip = match &result {
            Ok(_) => {
                self.circuit_breaker.record_success(circuit);
                None
            }
            Err(_) => self.circuit_breaker.record_failure(circuit),
        };
        BatchRun { result, trip }
    }
}

struct BatchRun {
    result: Result<Vec<BlockAnnotation>, RuntimeError>,
    trip: Option<CircuitTrip>,
}

/// Block fields computed by the core; enrichers may not return them.
const CORE_FIELDS: &[&str] = &[
    "id",
    "raw_source",
    "clean_text",
    "confidence",
    "warnings",
    "line_number",
    "structural",
];

/// Reject annotations that are malformed or name blocks outside the batch,
/// and fold repeats.
fn check_batch(
    batch: &[EnrichmentRequest],
    annotations: Vec<BlockAnnotation>,
) -> Result<Vec<BlockAnnotation>, EnricherError> {
    let ids: HashSet<&str> = batch.iter().map(|r| r.block_id.as_str()).collect();
    let mut folded: Vec<BlockAnnotation> = Vec::new();

    for annotation in annotations {
        if annotation.block_id.trim().is_empty() {
            return Err(EnricherError::Malformed(
                "annotation without a block id".to_string(),
            ));
        }
        if let Some(field) = annotation
            .fields
            .keys()
            .find(|k| CORE_FIELDS.contains(&k.as_str()))
        {
            return Err(EnricherError::Malformed(format!(
                "annotation for block {} sets core field '{}'",
                annotation.block_id, field
            )));
        }
        if !ids.contains(annotation.block_id.as_str()) {
            return Err(EnricherError::UnexpectedBlock(annotation.block_id));
        }
        match folded.iter_mut().find(|a| a.block_id == annotation.block_id) {
            Some(existing) => existing.fields.extend(annotation.fields),
            None => folded.push(annotation),
        }
    }

    Ok(folded)
}

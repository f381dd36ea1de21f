//! Contract with the enrichment collaborator.
//!
//! Enrichment runs outside the core. The core only decides what is sent
//! (requests in bounded batches) and how results come back (annotations
//! merged by block id). Merging never touches core-computed fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Block, Domain};

/// Blocks per enrichment batch.
pub const ENRICHMENT_BATCH_SIZE: usize = 5;

/// Errors from merging annotations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Annotation references unknown block: {0}")]
    UnknownBlock(String),
}

/// One block as the enricher sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichmentRequest {
    pub block_id: String,
    pub line_number: usize,
    pub clean_text: String,
}

impl From<&Block> for EnrichmentRequest {
    fn from(block: &Block) -> Self {
        Self {
            block_id: block.id.clone(),
            line_number: block.line_number,
            clean_text: block.clean_text.clone(),
        }
    }
}

/// Document-level hints sent alongside every batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichmentHints {
    pub domain: Domain,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

/// Structured fields an enricher attached to one block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockAnnotation {
    pub block_id: String,

    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl BlockAnnotation {
    pub fn new(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A block with whatever enrichment it received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedBlock {
    #[serde(flatten)]
    pub block: Block,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub enrichment: Map<String, Value>,
}

/// Split blocks into request batches of at most `size`, in order.
pub fn batches(blocks: &[Block], size: usize) -> Vec<Vec<EnrichmentRequest>> {
    blocks
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().map(EnrichmentRequest::from).collect())
        .collect()
}

/// Merge annotations into blocks by id.
///
/// Block order and core fields are preserved. Several annotations for the
/// same block merge field by field, later values winning.
pub fn merge_annotations(
    blocks: &[Block],
    annotations: &[BlockAnnotation],
) -> Result<Vec<EnrichedBlock>, MergeError> {
    let index: HashMap<&str, usize> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.id.as_str(), i))
        .collect();

    let mut merged: Vec<EnrichedBlock> = blocks
        .iter()
        .map(|block| EnrichedBlock {
            block: block.clone(),
            enrichment: Map::new(),
        })
        .collect();

    for annotation in annotations {
        let position = index
            .get(annotation.block_id.as_str())
            .ok_or_else(|| MergeError::UnknownBlock(annotation.block_id.clone()))?;
        let target = &mut merged[*position].enrichment;
        for (key, value) in &annotation.fields {
            target.insert(key.clone(), value.clone());
        }
    }

    Ok(merged)
}

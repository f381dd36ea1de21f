//! Content-addressed document envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hasher;
use crate::profile::Profile;
use crate::types::{Block, Domain, SourceMetadata};

/// Version stamped into every envelope.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the envelope was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingMetadata {
    pub profile: Profile,
    pub domain: Domain,

    /// Output-only; never feeds any id
    pub timestamp: DateTime<Utc>,

    /// Always true for envelopes built by this crate
    pub deterministic: bool,

    pub engine_version: String,
}

/// Ordered blocks plus the document id derived from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentEnvelope {
    /// Hash of the concatenated block ids, in order
    pub document_id: String,

    #[serde(default)]
    pub source: SourceMetadata,

    pub processing: ProcessingMetadata,

    pub blocks: Vec<Block>,
}

/// Why an envelope failed verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeMismatch {
    /// A block's id does not match its content
    #[error("block {index} id mismatch: expected {expected}, found {actual}")]
    Block {
        index: usize,
        expected: String,
        actual: String,
    },

    /// The document id does not match the block id sequence
    #[error("document id mismatch: expected {expected}, found {actual}")]
    Document { expected: String, actual: String },
}

impl DocumentEnvelope {
    /// Assemble an envelope, deriving the document id from the blocks.
    pub fn assemble(
        blocks: Vec<Block>,
        source: SourceMetadata,
        profile: Profile,
        domain: Domain,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let document_id = Self::compute_document_id(&blocks);
        Self {
            document_id,
            source,
            processing: ProcessingMetadata {
                profile,
                domain,
                timestamp,
                deterministic: true,
                engine_version: ENGINE_VERSION.to_string(),
            },
            blocks,
        }
    }

    /// Document id for a block sequence.
    pub fn compute_document_id(blocks: &[Block]) -> String {
        hasher::document_id(blocks.iter().map(|b| b.id.as_str()))
    }

    /// Recompute every block id and the document id.
    ///
    /// Returns every mismatch found, block mismatches first.
    pub fn verify(&self) -> Result<(), Vec<EnvelopeMismatch>> {
        let mut mismatches: Vec<EnvelopeMismatch> = self
            .blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| {
                let expected = hasher::block_id(&block.raw_source, block.line_number);
                (expected != block.id).then(|| EnvelopeMismatch::Block {
                    index,
                    expected,
                    actual: block.id.clone(),
                })
            })
            .collect();

        let expected = Self::compute_document_id(&self.blocks);
        if expected != self.document_id {
            mismatches.push(EnvelopeMismatch::Document {
                expected,
                actual: self.document_id.clone(),
            });
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(mismatches)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn block(raw: &str, line_number: usize) -> Block {
        Block {
            id: hasher::block_id(raw, line_number),
            raw_source: raw.to_string(),
            clean_text: raw.to_string(),
            confidence: 0.5,
            warnings: vec![],
            line_number,
            structural: None,
        }
    }

    fn envelope() -> DocumentEnvelope {
        DocumentEnvelope::assemble(
            vec![block("line one", 0), block("line two", 1)],
            SourceMetadata::default(),
            Profile::Standard,
            Domain::Linguistic,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_document_id_vector() {
        let env = envelope();
        assert_eq!(env.blocks[0].id, "035ca48205e677");
        assert_eq!(env.blocks[1].id, "0022e0c336cfeb");
        assert_eq!(env.document_id, "0a7386286054dc");
        assert!(env.processing.deterministic);
        assert_eq!(env.processing.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn test_verify_accepts_untouched_envelope() {
        assert!(envelope().verify().is_ok());
    }

    #[test]
    fn test_edited_block_invalidates_envelope() {
        let mut env = envelope();
        env.blocks[1].raw_source = "line 2".to_string();
        let mismatches = env.verify().unwrap_err();
        assert!(matches!(mismatches[0], EnvelopeMismatch::Block { index: 1, .. }));
    }

    #[test]
    fn test_mismatch_messages() {
        let mut env = envelope();
        env.document_id = "00000000000000".to_string();
        let mismatches = env.verify().unwrap_err();
        assert_eq!(
            mismatches[0].to_string(),
            format!(
                "document id mismatch: expected {}, found 00000000000000",
                DocumentEnvelope::compute_document_id(&env.blocks)
            )
        );

        let err = EnvelopeMismatch::Block {
            index: 2,
            expected: "a".to_string(),
            actual: "b".to_string(),
        };
        assert_eq!(err.to_string(), "block 2 id mismatch: expected a, found b");
    }

    #[test]
    fn test_reordered_blocks_invalidate_document_id() {
        let mut env = envelope();
        env.blocks.swap(0, 1);
        let mismatches = env.verify().unwrap_err();
        assert_eq!(mismatches.len(), 1);
        assert!(matches!(mismatches[0], EnvelopeMismatch::Document { .. }));
    }

    #[test]
    fn test_empty_envelope() {
        let env = DocumentEnvelope::assemble(
            vec![],
            SourceMetadata::default(),
            Profile::Standard,
            Domain::Legal,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(env.document_id, "0bdcb81aee8d83");
        assert!(env.is_valid());
    }
}

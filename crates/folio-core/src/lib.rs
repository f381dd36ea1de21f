//! # folio-core
//!
//! Deterministic document analysis for legal pleadings and interlinear
//! linguistic transcripts.
//!
//! A run turns raw text into:
//! - confidence-scored, structurally classified blocks in a
//!   content-addressed envelope
//! - a tier assessment saying whether specialized handling is warranted
//! - custom rule extractions
//! - for legal input, a consistency report of dates, references and
//!   signatures with any violations
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces the same ids, scores and violations
//! 2. **Never fails on input**: The worst case is a report with zero blocks
//! 3. **Traceable**: Every violation carries the facts and spans behind it
//! 4. **Pure**: No I/O outside the explicit config loaders
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_core::{parse_document, Domain, ParseOptions};
//!
//! let options = ParseOptions::new(Domain::Legal);
//! let report = parse_document("WHEREFORE, plaintiff demands judgment", &options);
//!
//! for block in report.blocks() {
//!     println!("{} {:.2} {}", block.id, block.confidence, block.clean_text);
//! }
//! if let Some(legal) = &report.legal {
//!     println!("{} critical violations", legal.critical_count);
//! }
//! ```

pub mod config;
pub mod enrichment;
pub mod envelope;
pub mod evidence;
pub mod hasher;
pub mod heuristics;
pub mod legal;
pub mod pipeline;
pub mod profile;
pub mod rules;
pub mod text;
pub mod types;

// Re-export main types at crate root
pub use config::{ConfigError, PipelineConfig};
pub use enrichment::{
    BlockAnnotation, EnrichedBlock, EnrichmentHints, EnrichmentRequest, MergeError,
    ENRICHMENT_BATCH_SIZE,
};
pub use envelope::{DocumentEnvelope, EnvelopeMismatch, ProcessingMetadata};
pub use evidence::Evidence;
pub use heuristics::{DomainStrategy, LegalStrategy, LineScore, LinguisticStrategy};
pub use legal::{
    CaseDocument, DocumentGraph, DocumentReference, ExtractedDate, LegalAnalysisResult,
    Severity, Signature, Violation,
};
pub use pipeline::{parse_document, ParseOptions, Pipeline};
pub use profile::Profile;
pub use rules::{CustomExtraction, CustomRule, PatternError, RuleEngine};
pub use types::{
    Block, ClauseType, Domain, EvidenceSource, ParseReport, ParseStats, PdfTextDiagnostics,
    PipelineWarning, SourceMetadata, Span, StructuralAnalysis, TierAssessment, TierSignal,
};

/// Parse text with a loaded pipeline config.
pub fn parse_with_config(text: &str, config: &PipelineConfig) -> ParseReport {
    parse_document(text, &ParseOptions::from(config.clone()))
}

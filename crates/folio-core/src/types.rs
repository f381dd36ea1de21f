//! Shared data model for the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::envelope::DocumentEnvelope;
use crate::legal::LegalAnalysisResult;
use crate::profile::Profile;
use crate::rules::CustomExtraction;

/// The document domain. Every domain-specific heuristic branches on this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Pleadings, contracts, affidavits
    Legal,
    /// Interlinear-glossed transcripts
    Linguistic,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Legal => "legal",
            Domain::Linguistic => "linguistic",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legal" => Ok(Domain::Legal),
            "linguistic" => Ok(Domain::Linguistic),
            other => Err(format!("unknown domain: {}", other)),
        }
    }
}

/// Byte range into the normalized document text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Structural clause label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    Simple,
    Fragment,
    Compound,
    ChainClause,
    ComplexEmbedded,
}

/// Output of the structural clause classifier for one line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuralAnalysis {
    /// Syntactic complexity in [0, 0.99]
    pub complexity_score: f64,

    pub clause_type: ClauseType,

    pub token_count: usize,

    /// Mean token length in characters
    pub avg_token_length: f64,
}

/// One retained, scored unit of extracted text.
///
/// Fields are fixed once the pipeline creates the block. Enrichment attaches
/// data by `id` in a separate structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Content address: `hash(raw_source + line_number)`
    pub id: String,

    /// The trimmed source line, enumerator prefix included
    pub raw_source: String,

    /// The line with any enumerator prefix removed
    pub clean_text: String,

    /// Heuristic confidence in [0, 1]
    pub confidence: f64,

    #[serde(default)]
    pub warnings: Vec<String>,

    /// Zero-based index of the line in the normalized text
    pub line_number: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural: Option<StructuralAnalysis>,
}

/// A signal that fired during tier assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierSignal {
    pub feature: String,
    pub weight: f64,
    pub description: String,
}

/// Document-level judgment of whether specialized handling is warranted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierAssessment {
    pub requires_special_handling: bool,

    /// Sum of fired signal weights, capped at 0.99
    pub confidence: f64,

    pub signals: Vec<TierSignal>,

    pub recommended_action: String,
}

/// Layout diagnostics reported by the PDF/OCR extraction collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PdfTextDiagnostics {
    pub total_lines: usize,
    pub fragmented_line_ratio: f64,
    pub avg_line_length: f64,
    pub hyphen_break_count: usize,
    pub is_ocr: bool,
}

/// Caller-supplied description of the source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// e.g. "pdf", "ocr", "transcript"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,

    /// e.g. "Lease Agreement", "Affidavit"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

/// Line accounting for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseStats {
    /// Raw line count of the normalized input
    pub total_lines: usize,

    /// Number of retained blocks
    pub extracted_lines: usize,

    /// Mean block confidence, 0 when nothing was retained
    pub average_confidence: f64,
}

/// A non-fatal problem encountered during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineWarning {
    /// What raised it, e.g. "custom_rule:R1"
    pub source: String,
    pub message: String,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseReport {
    /// Content-addressed envelope carrying the ordered blocks
    pub envelope: DocumentEnvelope,

    /// Clean text of retained blocks joined with newlines
    pub clean_text: String,

    pub tier: TierAssessment,

    pub stats: ParseStats,

    #[serde(default)]
    pub custom_extractions: Vec<CustomExtraction>,

    #[serde(default)]
    pub warnings: Vec<PipelineWarning>,

    /// Present only for legal-domain input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal: Option<LegalAnalysisResult>,
}

impl ParseReport {
    /// The retained blocks in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.envelope.blocks
    }

    pub fn document_id(&self) -> &str {
        &self.envelope.document_id
    }

    pub fn profile(&self) -> Profile {
        self.envelope.processing.profile
    }
}

/// Where a piece of evidence points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// The normalized document text
    Text,
    /// A sibling document in the case corpus
    Corpus,
    /// Caller-supplied source metadata
    Metadata,
}

//! Legal consistency analysis.
//!
//! Runs over the full normalized text of a legal document and flags fact
//! patterns that cannot be true: a jurat sworn after the filing it
//! supports, a hearing noticed too late, a lease nobody signed.
//!
//! | Stage | Extractor | Checker |
//! |-------|-----------|---------|
//! | Dates | [`DateExtractor`] | [`ConstraintChecker`] |
//! | References | [`ReferenceExtractor`] | [`IntegrityChecker`] |
//! | Signatures | [`SignatureExtractor`] | [`CompletenessChecker`] |
//!
//! [`LegalAnalyzer`] runs the stages in that order.

pub mod analyzer;
pub mod constraints;
pub mod dates;
pub mod graph;
pub mod references;
pub mod signatures;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;

pub use analyzer::LegalAnalyzer;
pub use constraints::ConstraintChecker;
pub use dates::{DateExtraction, DateExtractor, DateType, ExtractedDate, SkippedDate};
pub use graph::{CaseDocument, DocumentGraph, IntegrityChecker};
pub use references::{DocumentReference, ReferenceExtractor};
pub use signatures::{CompletenessChecker, Signature, SignatureExtractor};

/// How serious a violation is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A broken consistency rule, with the facts that broke it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    /// Named constraint, e.g. "jurat_before_filing"
    pub constraint_id: String,

    pub severity: Severity,

    pub description: String,

    /// Dates that produced the violation (empty for non-temporal checks)
    #[serde(default)]
    pub dates: Vec<ExtractedDate>,

    /// Pointers to every fact involved
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// Everything the legal analyzer found in one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalAnalysisResult {
    /// Valid dates, chronologically ascending
    pub dates: Vec<ExtractedDate>,

    pub references: Vec<DocumentReference>,

    pub signatures: Vec<Signature>,

    pub violations: Vec<Violation>,

    pub critical_count: usize,

    /// Date-shaped text that failed calendar validation
    #[serde(default)]
    pub skipped_dates: Vec<SkippedDate>,

    pub timestamp: DateTime<Utc>,
}

impl LegalAnalysisResult {
    pub fn has_critical(&self) -> bool {
        self.critical_count > 0
    }

    /// Violations for one constraint id.
    pub fn violations_for<'a>(&'a self, constraint_id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations
            .iter()
            .filter(move |v| v.constraint_id == constraint_id)
    }
}

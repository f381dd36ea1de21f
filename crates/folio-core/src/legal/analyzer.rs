//! Runs the legal stages and aggregates their violations.

use chrono::{DateTime, Utc};

use crate::legal::{
    CompletenessChecker, ConstraintChecker, DateExtractor, DocumentGraph, IntegrityChecker,
    LegalAnalysisResult, ReferenceExtractor, Severity, SignatureExtractor,
};

/// What the analyzer needs besides the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegalContext<'a> {
    /// Caller-declared type, e.g. "Lease Agreement"
    pub document_type: Option<&'a str>,

    /// Sibling documents; `None` skips the integrity check
    pub corpus: Option<&'a DocumentGraph>,
}

/// Coordinates the extractors and checkers.
pub struct LegalAnalyzer {
    dates: DateExtractor,
    constraints: ConstraintChecker,
    references: ReferenceExtractor,
    integrity: IntegrityChecker,
    signatures: SignatureExtractor,
    completeness: CompletenessChecker,
}

impl LegalAnalyzer {
    pub fn new() -> Self {
        Self {
            dates: DateExtractor::new(),
            constraints: ConstraintChecker::new(),
            references: ReferenceExtractor::new(),
            integrity: IntegrityChecker::new(),
            signatures: SignatureExtractor::new(),
            completeness: CompletenessChecker::new(),
        }
    }

    /// Analyze normalized text, stamping the result with `timestamp`.
    pub fn analyze(
        &self,
        text: &str,
        context: LegalContext<'_>,
        timestamp: DateTime<Utc>,
    ) -> LegalAnalysisResult {
        let mut violations = Vec::new();

        let extraction = self.dates.extract(text);
        violations.extend(self.constraints.check(&extraction.dates));

        let references = self.references.extract(text);
        match context.corpus {
            Some(corpus) => violations.extend(self.integrity.check(&references, corpus)),
            None => tracing::debug!("No case corpus supplied, skipping reference integrity"),
        }

        let signatures = self.signatures.extract(text);
        violations.extend(self.completeness.check(context.document_type, &signatures));

        let critical_count = violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
            .count();

        tracing::debug!(
            dates = extraction.dates.len(),
            references = references.len(),
            signatures = signatures.len(),
            violations = violations.len(),
            critical_count,
            "Legal analysis complete"
        );

        LegalAnalysisResult {
            dates: extraction.dates,
            references,
            signatures,
            violations,
            critical_count,
            skipped_dates: extraction.skipped,
            timestamp,
        }
    }
}

impl Default for LegalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

//! Evidence pointers for violations.
//!
//! Every violation must be traceable to the facts that produced it. Dates
//! carry their own spans; evidence extends that to references, signatures
//! and metadata-driven checks.

use serde::{Deserialize, Serialize};

use crate::types::{EvidenceSource, Span};

/// A piece of evidence supporting a violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    /// What this evidence supports
    pub claim: String,

    /// Where the evidence comes from
    pub source: EvidenceSource,

    /// Pointer to the location (e.g., "text[47:72]")
    pub pointer: String,
}

impl Evidence {
    /// Evidence located in the normalized document text.
    pub fn from_text(claim: impl Into<String>, span: Span) -> Self {
        Self {
            claim: claim.into(),
            source: EvidenceSource::Text,
            pointer: format!("text[{}:{}]", span.start, span.end),
        }
    }

    /// Evidence about the case corpus as a whole or one of its documents.
    pub fn from_corpus(claim: impl Into<String>, document_id: Option<&str>) -> Self {
        let pointer = match document_id {
            Some(id) => format!("corpus[{}]", id),
            None => "corpus".to_string(),
        };
        Self {
            claim: claim.into(),
            source: EvidenceSource::Corpus,
            pointer,
        }
    }

    /// Evidence drawn from caller-supplied source metadata.
    pub fn from_metadata(claim: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            source: EvidenceSource::Metadata,
            pointer: format!("metadata.{}", key.into()),
        }
    }

    /// Resolve a `text[start:end]` pointer back to its span.
    pub fn text_span(&self) -> Option<Span> {
        if self.source != EvidenceSource::Text {
            return None;
        }
        let inner = self.pointer.strip_prefix("text[")?.strip_suffix(']')?;
        let (start, end) = inner.split_once(':')?;
        Some(Span::new(start.parse().ok()?, end.parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_from_text() {
        let evidence = Evidence::from_text("Jurat date", Span::new(42, 68));
        assert_eq!(evidence.source, EvidenceSource::Text);
        assert_eq!(evidence.pointer, "text[42:68]");
        assert_eq!(evidence.text_span(), Some(Span::new(42, 68)));
    }

    #[test]
    fn test_evidence_from_corpus() {
        let evidence = Evidence::from_corpus("Searched corpus", None);
        assert_eq!(evidence.pointer, "corpus");
        let evidence = Evidence::from_corpus("Candidate", Some("doc-7"));
        assert_eq!(evidence.pointer, "corpus[doc-7]");
        assert_eq!(evidence.text_span(), None);
    }

    #[test]
    fn test_evidence_from_metadata() {
        let evidence = Evidence::from_metadata("Lease type", "document_type");
        assert_eq!(evidence.source, EvidenceSource::Metadata);
        assert_eq!(evidence.pointer, "metadata.document_type");
    }
}

//! Signature extraction and completeness.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::legal::dates::parse_numeric_date;
use crate::legal::{Severity, Violation};
use crate::types::Span;

/// How far past a signature line to look for its date, in characters.
pub const SIGNATURE_DATE_LOOKAHEAD: usize = 200;

/// Document type words that imply the document must be signed.
const SIGNED_DOCUMENT_KINDS: &[&str] = &["lease", "contract", "agreement"];

lazy_static! {
    static ref SIGNATURE_LINE: Regex = Regex::new(
        r"(?:Signed by|Signature of|/s/|By:)[ \t]+([A-Z][A-Za-z.'-]*(?:[ \t]+[A-Z][A-Za-z.'-]*){0,4})"
    ).unwrap();
}

/// A signature and the date associated with it, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    pub party: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    pub location: Span,
}

/// Finds signature lines.
pub struct SignatureExtractor;

impl SignatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Vec<Signature> {
        SIGNATURE_LINE
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let party = caps.get(1)?.as_str().trim_end_matches(['.', '-']).to_string();
                let lookahead_end = text[whole.end()..]
                    .char_indices()
                    .nth(SIGNATURE_DATE_LOOKAHEAD)
                    .map(|(i, _)| whole.end() + i)
                    .unwrap_or(text.len());

                Some(Signature {
                    party,
                    date: parse_numeric_date(&text[whole.end()..lookahead_end]),
                    location: Span::new(whole.start(), whole.end()),
                })
            })
            .collect()
    }
}

impl Default for SignatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Flags documents that must be signed but carry no signature.
pub struct CompletenessChecker;

impl CompletenessChecker {
    pub fn new() -> Self {
        Self
    }

    /// Whether a document type requires a signature.
    pub fn requires_signature(document_type: &str) -> bool {
        let lowered = document_type.to_lowercase();
        SIGNED_DOCUMENT_KINDS.iter().any(|k| lowered.contains(k))
    }

    pub fn check(&self, document_type: Option<&str>, signatures: &[Signature]) -> Vec<Violation> {
        let Some(document_type) = document_type else {
            return vec![];
        };
        if !Self::requires_signature(document_type) || !signatures.is_empty() {
            return vec![];
        }

        vec![Violation {
            constraint_id: "missing_signature".to_string(),
            severity: Severity::High,
            description: format!("{} has no signature", document_type),
            dates: vec![],
            evidence: vec![Evidence::from_metadata(
                format!("Document type \"{}\" requires a signature", document_type),
                "document_type",
            )],
        }]
    }
}

impl Default for CompletenessChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_with_date() {
        let text = "By: Jane Q. Smith, Landlord\nDate: 03/04/2021";
        let sigs = SignatureExtractor::new().extract(text);
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].party, "Jane Q. Smith");
        assert_eq!(sigs[0].date, NaiveDate::from_ymd_opt(2021, 3, 4));
        assert_eq!(sigs[0].location.start, 0);
    }

    #[test]
    fn test_signature_forms() {
        let text = "/s/ Robert Lane\nSigned by Maria Ortiz\nSignature of Tenant";
        let parties: Vec<String> = SignatureExtractor::new()
            .extract(text)
            .into_iter()
            .map(|s| s.party)
            .collect();
        assert_eq!(parties, vec!["Robert Lane", "Maria Ortiz", "Tenant"]);
    }

    #[test]
    fn test_date_beyond_lookahead_is_ignored() {
        let text = format!("Signed by Ann Lee {} 01/01/2020", "x".repeat(250));
        let sigs = SignatureExtractor::new().extract(&text);
        assert_eq!(sigs[0].date, None);
    }

    #[test]
    fn test_invalid_date_does_not_hide_a_later_one() {
        let text = "Signed by Ann Lee on 13/45/2020, dated 06/15/2020";
        let sigs = SignatureExtractor::new().extract(text);
        assert_eq!(sigs[0].date, NaiveDate::from_ymd_opt(2020, 6, 15));
    }

    #[test]
    fn test_blank_signature_line_is_not_a_signature() {
        assert!(SignatureExtractor::new().extract("By: ____________").is_empty());
    }

    #[test]
    fn test_unsigned_lease_is_flagged() {
        let violations = CompletenessChecker::new().check(Some("Lease Agreement"), &[]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint_id, "missing_signature");
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(violations[0].evidence[0].pointer, "metadata.document_type");
    }

    #[test]
    fn test_signed_lease_passes() {
        let sig = Signature {
            party: "Jane Smith".to_string(),
            date: None,
            location: Span::new(0, 10),
        };
        assert!(CompletenessChecker::new()
            .check(Some("Lease Agreement"), &[sig])
            .is_empty());
    }

    #[test]
    fn test_other_document_types_are_not_checked() {
        assert!(CompletenessChecker::new().check(Some("Affidavit"), &[]).is_empty());
        assert!(CompletenessChecker::new().check(None, &[]).is_empty());
    }
}

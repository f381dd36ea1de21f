//! Cross-document reference extraction.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::types::Span;

/// Document types a reference can name.
pub const DOCUMENT_TYPES: &[&str] = &[
    "Agreement",
    "Contract",
    "Notice",
    "Order",
    "Lease",
    "Amendment",
    "Addendum",
    "Affidavit",
    "Complaint",
    "Motion",
    "Stipulation",
    "Summons",
];

/// Type recorded for exhibit-style references.
pub const EXHIBIT_TYPE: &str = "Exhibit";

lazy_static! {
    // "2019 Master Lease Agreement"
    static ref YEAR_TITLED: Regex = Regex::new(
        r"\b((?:19|20)\d{2})\s+(?:[A-Z][A-Za-z'-]*\s+)*(Agreement|Contract|Notice|Order|Lease)\b"
    ).unwrap();

    // "Purchase Agreement dated March 1, 2019"
    static ref DATED_TITLE: Regex = Regex::new(
        r"\b((?:[A-Z][A-Za-z'-]*\s+)+)dated\s+[^\n.;]{0,40}?\b((?:19|20)\d{2})\b"
    ).unwrap();

    // "Exhibit A", "Appendix 3-1"
    static ref EXHIBIT: Regex = Regex::new(
        r"\b(?:Exhibit|Attachment|Appendix)\s+[A-Z0-9]{1,3}(?:-\d{1,3})?\b"
    ).unwrap();
}

/// A mention of another document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentReference {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,

    pub location: Span,
}

impl DocumentReference {
    /// Whether the reference says enough to be resolved against a corpus.
    pub fn is_resolvable(&self) -> bool {
        self.year.is_some()
            || self
                .document_type
                .as_deref()
                .is_some_and(|t| t != EXHIBIT_TYPE)
    }
}

/// Last vocabulary word in a title ("Lease Agreement" is an Agreement).
fn document_type_in(title: &str) -> Option<String> {
    title
        .split_whitespace()
        .rev()
        .find_map(|word| DOCUMENT_TYPES.iter().find(|t| **t == word))
        .map(|t| t.to_string())
}

struct ReferenceFamily {
    regex: &'static Regex,
    build: fn(&Captures<'_>) -> (Option<i32>, Option<String>),
}

fn year_titled(caps: &Captures<'_>) -> (Option<i32>, Option<String>) {
    (caps[1].parse().ok(), Some(caps[2].to_string()))
}

fn dated_title(caps: &Captures<'_>) -> (Option<i32>, Option<String>) {
    (caps[2].parse().ok(), document_type_in(&caps[1]))
}

fn exhibit(_caps: &Captures<'_>) -> (Option<i32>, Option<String>) {
    (None, Some(EXHIBIT_TYPE.to_string()))
}

/// Finds references to other documents.
///
/// Families run in order; a later match overlapping an earlier one is
/// dropped.
pub struct ReferenceExtractor {
    families: Vec<ReferenceFamily>,
}

impl ReferenceExtractor {
    pub fn new() -> Self {
        Self {
            families: vec![
                ReferenceFamily {
                    regex: &YEAR_TITLED,
                    build: year_titled,
                },
                ReferenceFamily {
                    regex: &DATED_TITLE,
                    build: dated_title,
                },
                ReferenceFamily {
                    regex: &EXHIBIT,
                    build: exhibit,
                },
            ],
        }
    }

    pub fn extract(&self, text: &str) -> Vec<DocumentReference> {
        let mut references: Vec<DocumentReference> = Vec::new();

        for family in &self.families {
            for caps in family.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let location = Span::new(whole.start(), whole.end());
                if references.iter().any(|r| r.location.overlaps(&location)) {
                    continue;
                }

                let (year, document_type) = (family.build)(&caps);
                references.push(DocumentReference {
                    text: whole.as_str().trim().to_string(),
                    year,
                    document_type,
                    location,
                });
            }
        }

        references.sort_by_key(|r| r.location.start);
        references
    }
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

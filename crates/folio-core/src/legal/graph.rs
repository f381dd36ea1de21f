//! Case corpus index and reference integrity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::legal::references::DocumentReference;
use crate::legal::{Severity, Violation};

/// A sibling document in the same case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseDocument {
    pub id: String,
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl CaseDocument {
    /// Whether this document mentions any detail the reference carries:
    /// its year (field, title or content) or its document type.
    fn satisfies(&self, reference: &DocumentReference) -> bool {
        let title = self.title.to_lowercase();
        let content = self.content.to_lowercase();
        let mentions = |needle: &str| title.contains(needle) || content.contains(needle);

        let year_found = reference.year.is_some_and(|year| {
            self.year == Some(year) || mentions(&year.to_string())
        });
        let type_found = reference
            .document_type
            .as_deref()
            .is_some_and(|t| mentions(&t.to_lowercase()));

        year_found || type_found
    }
}

/// Read-only index of case documents, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CaseDocument>", into = "Vec<CaseDocument>")]
pub struct DocumentGraph {
    nodes: BTreeMap<String, CaseDocument>,
}

impl From<Vec<CaseDocument>> for DocumentGraph {
    fn from(documents: Vec<CaseDocument>) -> Self {
        Self::from_documents(documents)
    }
}

impl From<DocumentGraph> for Vec<CaseDocument> {
    fn from(graph: DocumentGraph) -> Self {
        graph.nodes.into_values().collect()
    }
}

impl DocumentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from documents; a later document replaces an earlier one with
    /// the same id.
    pub fn from_documents(documents: impl IntoIterator<Item = CaseDocument>) -> Self {
        let mut graph = Self::new();
        for document in documents {
            graph.insert(document);
        }
        graph
    }

    pub fn insert(&mut self, document: CaseDocument) {
        self.nodes.insert(document.id.clone(), document);
    }

    pub fn get(&self, id: &str) -> Option<&CaseDocument> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &CaseDocument> {
        self.nodes.values()
    }

    /// First document, by id, matching the reference.
    pub fn resolve(&self, reference: &DocumentReference) -> Option<&CaseDocument> {
        self.nodes.values().find(|doc| doc.satisfies(reference))
    }
}

/// Flags references that no corpus document accounts for.
pub struct IntegrityChecker;

impl IntegrityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check resolvable references against the corpus. References with
    /// neither a year nor a specific type are never flagged.
    pub fn check(&self, references: &[DocumentReference], graph: &DocumentGraph) -> Vec<Violation> {
        references
            .iter()
            .filter(|r| r.is_resolvable())
            .filter(|r| graph.resolve(r).is_none())
            .map(|r| Violation {
                constraint_id: "reference_not_found".to_string(),
                severity: Severity::Medium,
                description: format!("No case document matches reference \"{}\"", r.text),
                dates: vec![],
                evidence: vec![
                    Evidence::from_text(format!("Reference \"{}\"", r.text), r.location),
                    Evidence::from_corpus(
                        format!("Searched {} case documents", graph.len()),
                        None,
                    ),
                ],
            })
            .collect()
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

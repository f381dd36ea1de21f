//! Pipeline configuration.
//!
//! Configs are YAML or JSON documents validated against an embedded JSON
//! Schema, then checked semantically. Case corpora are JSON arrays of
//! [`CaseDocument`](crate::legal::CaseDocument).

mod parser;
mod schema;

pub use parser::{load_corpus, parse_corpus, ConfigError, PipelineConfig};
pub use schema::{schema_source, validate_config_schema};

//! # folio-runtime
//!
//! Optional async host for block enrichment.
//!
//! The core in `folio-core` is synchronous and deterministic; it never calls
//! out to anything. Enrichment (speaker tags, glosses, clause summaries from
//! an external service) happens here, behind an [`Enricher`] the caller
//! supplies.
//!
//! ## Important
//!
//! This crate is OPTIONAL. Enrichment never changes a block's core fields;
//! it only attaches extra fields keyed by block id.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_core::{parse_document, Domain, EnrichmentHints, ParseOptions};
//! use folio_runtime::{EnrichmentConfig, EnrichmentRunner};
//!
//! let report = parse_document(&text, &ParseOptions::new(Domain::Linguistic));
//! let runner = EnrichmentRunner::new(Arc::new(my_enricher), EnrichmentConfig::default());
//! let hints = EnrichmentHints { domain: Domain::Linguistic, document_type: None };
//!
//! let outcome = runner.enrich(report.blocks(), &hints).await?;
//! for failure in &outcome.failures {
//!     eprintln!("batch failed: {}", failure.error);
//! }
//! for warning in &outcome.warnings {
//!     eprintln!("{}: {}", warning.source, warning.message);
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

use folio_core::MergeError;

pub mod cache;
pub mod config;
pub mod enricher;
pub mod resilience;
pub mod runner;

pub use cache::{AnnotationCache, CacheKey};
pub use config::EnrichmentConfig;
pub use enricher::{Enricher, EnricherError};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitKey, CircuitState, CircuitTrip};
pub use runner::{BatchFailure, EnrichmentOutcome, EnrichmentRunner};

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Enricher error: {0}")]
    Enricher(#[from] EnricherError),

    #[error("Enrichment batch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Enrichment circuit {circuit} is open; retry in {retry_in:?}")]
    CircuitOpen {
        circuit: CircuitKey,
        retry_in: Duration,
    },

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Domain;

    #[test]
    fn test_error_messages() {
        let err = RuntimeError::CircuitOpen {
            circuit: CircuitKey::new("gloss", Domain::Legal),
            retry_in: Duration::from_secs(5),
        };
        assert_eq!(
            err.to_string(),
            "Enrichment circuit gloss/legal is open; retry in 5s"
        );

        let err = RuntimeError::from(MergeError::UnknownBlock("abc".to_string()));
        assert!(err.to_string().contains("abc"));
    }
}

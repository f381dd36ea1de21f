//! Line-level and document-level heuristics.
//!
//! Legal and linguistic logic share the same shape: score a line, classify
//! it, decide whether to keep it. Each domain supplies a [`DomainStrategy`]
//! and the pipeline only talks to the trait.
//!
//! | Heuristic | Shape |
//! |-----------|-------|
//! | [`scorer`] | independent additive signals |
//! | [`classifier`] | ordered priority chain, first match wins |
//! | [`tier`] | independent weighted signals, no partial credit |

pub mod classifier;
pub mod patterns;
pub mod scorer;
pub mod tier;

use crate::profile::Profile;
use crate::types::{Domain, StructuralAnalysis};

pub use scorer::LineScore;

/// Domain-specific scoring and classification.
pub trait DomainStrategy: Send + Sync {
    /// The domain this strategy handles.
    fn domain(&self) -> Domain;

    /// Minimum score for a line to be retained as a block.
    fn threshold(&self) -> f64;

    /// Score a clean (enumerator-stripped) line.
    fn score(&self, line: &str, profile: Profile) -> LineScore;

    /// Classify a clean line.
    fn classify(&self, line: &str) -> StructuralAnalysis {
        classifier::classify(line, self.domain())
    }

    /// Whether a scored line becomes a block.
    fn retains(&self, score: &LineScore) -> bool {
        !score.is_empty_line() && score.score >= self.threshold()
    }
}

/// Pleadings and contracts.
pub struct LegalStrategy;

impl DomainStrategy for LegalStrategy {
    fn domain(&self) -> Domain {
        Domain::Legal
    }

    fn threshold(&self) -> f64 {
        scorer::LEGAL_THRESHOLD
    }

    fn score(&self, line: &str, _profile: Profile) -> LineScore {
        scorer::score_legal(line)
    }
}

/// Interlinear transcripts.
pub struct LinguisticStrategy;

impl DomainStrategy for LinguisticStrategy {
    fn domain(&self) -> Domain {
        Domain::Linguistic
    }

    fn threshold(&self) -> f64 {
        scorer::LINGUISTIC_THRESHOLD
    }

    fn score(&self, line: &str, profile: Profile) -> LineScore {
        scorer::score_linguistic(line, profile)
    }
}

static LEGAL: LegalStrategy = LegalStrategy;
static LINGUISTIC: LinguisticStrategy = LinguisticStrategy;

impl Domain {
    /// The strategy implementing this domain's heuristics.
    pub fn strategy(&self) -> &'static dyn DomainStrategy {
        match self {
            Domain::Legal => &LEGAL,
            Domain::Linguistic => &LINGUISTIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_matches_domain() {
        assert_eq!(Domain::Legal.strategy().domain(), Domain::Legal);
        assert_eq!(Domain::Linguistic.strategy().domain(), Domain::Linguistic);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(Domain::Legal.strategy().threshold(), 0.35);
        assert_eq!(Domain::Linguistic.strategy().threshold(), 0.45);
    }

    #[test]
    fn test_retains_respects_threshold() {
        let legal = Domain::Legal.strategy();
        assert!(legal.retains(&LineScore { score: 0.35, warnings: vec![] }));
        assert!(!legal.retains(&LineScore { score: 0.34, warnings: vec![] }));
        assert!(!legal.retains(&LineScore::empty()));
    }

    #[test]
    fn test_page_number_is_dropped() {
        let legal = Domain::Legal.strategy();
        let score = legal.score("3", Profile::Standard);
        assert!(!legal.retains(&score));
    }
}

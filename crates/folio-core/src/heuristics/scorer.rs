//! Confidence scorer.
//!
//! Scores are a 0.5 baseline plus independent additive adjustments. The
//! adjustments never depend on each other, so their order does not matter.

use serde::{Deserialize, Serialize};

use crate::heuristics::patterns::{
    bare_token, in_set, ADVERSARIAL, COURT_CAPTION, DOCKET_NUMBER, ENUMERATOR_PREFIX,
    FUNCTION_WORDS, GLOSS_TAG, LEGAL_KEYWORDS, MORPHOLOGY_MARKER, RECITALS_OPENER,
    STRONG_NATIVE_SCRIPT,
};
use crate::profile::Profile;

pub const BASELINE: f64 = 0.5;

/// Legal scores never reach certainty.
pub const LEGAL_CAP: f64 = 0.99;

pub const LEGAL_THRESHOLD: f64 = 0.35;
pub const LINGUISTIC_THRESHOLD: f64 = 0.45;

/// Gloss-tag share of non-whitespace characters above which a line is
/// treated as a gloss line rather than vernacular text.
const GLOSS_DENSITY_LIMIT: f64 = 0.15;

pub const WARN_EMPTY: &str = "Empty";
pub const WARN_PAGE_NUMBER: &str = "Possible page number artifact";
pub const WARN_GLOSS_DENSITY: &str = "High gloss density; likely a gloss line";
pub const WARN_FUNCTION_WORD: &str = "Starts with a common function word; likely a translation line";

/// Score and warnings for one line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineScore {
    pub score: f64,
    pub warnings: Vec<String>,
}

impl LineScore {
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            warnings: vec![WARN_EMPTY.to_string()],
        }
    }

    pub fn is_empty_line(&self) -> bool {
        self.score == 0.0 && self.warnings.iter().any(|w| w == WARN_EMPTY)
    }
}

/// Remove a leading enumerator ("12.", "a)", "(iv)") from a trimmed line.
///
/// A lone letter and period before a capitalised word is read as an
/// initial ("J. Smith signed"), not an enumerator, and is kept.
pub fn strip_enumerator(line: &str) -> &str {
    let trimmed = line.trim();
    match ENUMERATOR_PREFIX.find(trimmed) {
        Some(m) => {
            let rest = trimmed[m.end()..].trim();
            if is_initial(m.as_str().trim_end(), rest) {
                trimmed
            } else {
                rest
            }
        }
        None => trimmed,
    }
}

fn is_initial(prefix: &str, rest: &str) -> bool {
    let mut chars = prefix.chars();
    let lone_letter = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_alphabetic()
    );
    lone_letter && rest.chars().next().is_some_and(char::is_uppercase)
}

/// Score a clean legal line.
pub fn score_legal(clean: &str) -> LineScore {
    if clean.is_empty() {
        return LineScore::empty();
    }

    let mut score = BASELINE;
    let mut warnings = Vec::new();
    let upper = clean.to_uppercase();

    if LEGAL_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        score += 0.4;
    }

    if COURT_CAPTION.is_match(clean) || DOCKET_NUMBER.is_match(clean) {
        score += 0.45;
    }

    if ADVERSARIAL.is_match(clean) {
        score += 0.35;
    }

    if RECITALS_OPENER.is_match(clean) {
        score += 0.4;
    }

    if clean.chars().count() < 4 && clean.chars().all(|c| c.is_ascii_digit()) {
        score -= 0.4;
        warnings.push(WARN_PAGE_NUMBER.to_string());
    }

    if clean.chars().count() > 50 {
        score += 0.1;
    }

    LineScore {
        score: score.clamp(0.0, LEGAL_CAP),
        warnings,
    }
}

/// Score a clean linguistic line under a profile.
pub fn score_linguistic(clean: &str, profile: Profile) -> LineScore {
    if clean.is_empty() {
        return LineScore::empty();
    }

    let mut score = BASELINE;
    let mut warnings = Vec::new();

    if STRONG_NATIVE_SCRIPT.is_match(clean) {
        score += 0.35;
    }

    if profile == Profile::MorphologicalDense && MORPHOLOGY_MARKER.is_match(clean) {
        score += 0.15;
    }

    if gloss_density(clean) > GLOSS_DENSITY_LIMIT && profile != Profile::Polysynthetic {
        score -= 0.35;
        warnings.push(WARN_GLOSS_DENSITY.to_string());
    }

    let opens_with_function_word = clean
        .split_whitespace()
        .next()
        .map(|first| in_set(&bare_token(first), FUNCTION_WORDS))
        .unwrap_or(false);
    if opens_with_function_word {
        score -= 0.3;
        warnings.push(WARN_FUNCTION_WORD.to_string());
    }

    LineScore {
        score: score.clamp(0.0, 1.0),
        warnings,
    }
}

/// Share of non-whitespace characters that belong to gloss tags.
pub fn gloss_density(line: &str) -> f64 {
    let visible = line.chars().filter(|c| !c.is_whitespace()).count();
    if visible == 0 {
        return 0.0;
    }
    let tagged: usize = GLOSS_TAG
        .find_iter(line)
        .map(|m| m.as_str().chars().count())
        .sum();
    tagged as f64 / visible as f64
}

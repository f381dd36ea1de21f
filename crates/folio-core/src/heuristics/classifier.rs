//! Structural clause classifier.
//!
//! Classification is a priority chain: the first rule that matches decides
//! the clause type and complexity. Legal overrides run after the chain and
//! may replace its result.

use crate::heuristics::patterns::{
    bare_token, in_set, AUXILIARIES, CITATION, CONDITIONAL_OPENER, COORDINATORS,
    RELATIVE_PRONOUNS, SUBORDINATORS,
};
use crate::types::{ClauseType, Domain, StructuralAnalysis};

pub const MAX_COMPLEXITY: f64 = 0.99;

/// How far (in tokens) a coordinator may trail a comma and still join clauses.
const COORDINATOR_WINDOW: usize = 3;

/// Per-line features the rules inspect.
struct LineFeatures<'a> {
    text: &'a str,
    raw_tokens: Vec<&'a str>,
    tokens: Vec<String>,
    commas: usize,
}

impl<'a> LineFeatures<'a> {
    fn new(text: &'a str) -> Self {
        let raw_tokens: Vec<&str> = text.split_whitespace().collect();
        let tokens = raw_tokens.iter().map(|t| bare_token(t)).collect();
        Self {
            text,
            raw_tokens,
            tokens,
            commas: text.matches(',').count(),
        }
    }

    fn token_count(&self) -> usize {
        self.raw_tokens.len()
    }

    fn avg_token_length(&self) -> f64 {
        if self.raw_tokens.is_empty() {
            return 0.0;
        }
        let total: usize = self.raw_tokens.iter().map(|t| t.chars().count()).sum();
        total as f64 / self.raw_tokens.len() as f64
    }

    fn has_terminal_punctuation(&self) -> bool {
        self.text
            .trim_end()
            .trim_end_matches(['"', '\'', ')', '\u{201d}', '\u{2019}'])
            .ends_with(['.', '?', '!'])
    }

    fn has_any(&self, set: &[&str]) -> bool {
        self.tokens.iter().any(|t| in_set(t, set))
    }

    fn bracket_markers(&self) -> usize {
        let openers = self.text.chars().filter(|c| matches!(c, '(' | '[' | '{')).count();
        let closers = self.text.chars().filter(|c| matches!(c, ')' | ']' | '}')).count();
        openers.max(closers)
    }

    fn strong_separators(&self) -> usize {
        let punct = self
            .text
            .chars()
            .filter(|c| matches!(c, ':' | ';' | '\u{2014}' | '|'))
            .count();
        punct + self.text.matches(" - ").count()
    }

    /// A coordinator within `COORDINATOR_WINDOW` tokens after a comma.
    fn coordinator_follows_comma(&self) -> bool {
        let comma_positions: Vec<usize> = self
            .raw_tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.ends_with(','))
            .map(|(i, _)| i)
            .collect();

        self.tokens.iter().enumerate().any(|(j, t)| {
            in_set(t, COORDINATORS)
                && comma_positions
                    .iter()
                    .any(|&i| i < j && j - i <= COORDINATOR_WINDOW)
        })
    }
}

/// Classify a line into a clause type with a complexity score.
pub fn classify(text: &str, domain: Domain) -> StructuralAnalysis {
    let features = LineFeatures::new(text);
    let (clause_type, complexity) = base_classification(&features);

    let (clause_type, complexity) = match domain {
        Domain::Legal => apply_legal_overrides(&features, clause_type, complexity),
        Domain::Linguistic => (clause_type, complexity),
    };

    StructuralAnalysis {
        complexity_score: complexity.clamp(0.0, MAX_COMPLEXITY),
        clause_type,
        token_count: features.token_count(),
        avg_token_length: features.avg_token_length(),
    }
}

fn base_classification(f: &LineFeatures<'_>) -> (ClauseType, f64) {
    // 1. Short line that is not a complete auxiliary-bearing sentence
    if f.token_count() < 4 && !(f.has_terminal_punctuation() && f.has_any(AUXILIARIES)) {
        return (ClauseType::Fragment, 0.1);
    }

    // 2. Parenthetical or bracketed material
    let markers = f.bracket_markers();
    if markers > 0 {
        return (ClauseType::ComplexEmbedded, 0.8 + 0.05 * markers as f64);
    }

    // 3. Strong separators
    match f.strong_separators() {
        0 => {}
        1 => return (ClauseType::Compound, 0.6),
        n => return (ClauseType::ChainClause, 0.7 + 0.1 * n as f64),
    }

    // 4. Conjunctions and commas
    let has_coordinator = f.has_any(COORDINATORS);

    if f.has_any(SUBORDINATORS) || CONDITIONAL_OPENER.is_match(f.text) {
        return (ClauseType::ComplexEmbedded, 0.85);
    }
    if f.has_any(RELATIVE_PRONOUNS) && f.commas >= 1 {
        return (ClauseType::ComplexEmbedded, 0.7);
    }
    if has_coordinator && f.commas >= 1 && f.coordinator_follows_comma() {
        return (ClauseType::Compound, 0.6);
    }
    if (1..=3).contains(&f.commas) {
        return (ClauseType::Simple, 0.4);
    }
    if f.commas > 2 && !has_coordinator {
        return (ClauseType::ChainClause, 0.5);
    }

    let length_bonus = (0.015 * f.token_count() as f64).min(0.3);
    (ClauseType::Simple, 0.2 + length_bonus)
}

fn apply_legal_overrides(
    f: &LineFeatures<'_>,
    mut clause_type: ClauseType,
    mut complexity: f64,
) -> (ClauseType, f64) {
    let opener = f
        .raw_tokens
        .first()
        .map(|t| bare_token(t).to_uppercase())
        .unwrap_or_default();

    if opener == "WHEREFORE" {
        clause_type = ClauseType::ChainClause;
        complexity = 0.9;
    } else if opener == "WHEREAS" {
        clause_type = ClauseType::ComplexEmbedded;
        complexity = 0.85;
    }

    if CITATION.is_match(f.text) && complexity > 0.3 {
        complexity = (complexity - 0.2).max(0.3);
    }

    if CONDITIONAL_OPENER.is_match(f.text) {
        clause_type = ClauseType::ComplexEmbedded;
        complexity = complexity.max(0.8);
    }

    (clause_type, complexity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str, domain: Domain) -> ClauseType {
        classify(text, domain).clause_type
    }

    #[test]
    fn test_yes_is_fragment() {
        let a = classify("Yes.", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::Fragment);
        assert_eq!(a.complexity_score, 0.1);
        assert_eq!(a.token_count, 1);
    }

    #[test]
    fn test_short_sentence_with_auxiliary_is_not_fragment() {
        assert_eq!(kind("It is done.", Domain::Linguistic), ClauseType::Simple);
    }

    #[test]
    fn test_short_line_without_punctuation_is_fragment() {
        assert_eq!(kind("He is here", Domain::Linguistic), ClauseType::Fragment);
    }

    #[test]
    fn test_parenthetical_is_complex_embedded() {
        let a = classify("The tenant (as defined below) shall pay rent.", Domain::Legal);
        assert_eq!(a.clause_type, ClauseType::ComplexEmbedded);
        assert!((a.complexity_score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_separators() {
        let one = classify("The rule is simple; obey it now", Domain::Linguistic);
        assert_eq!(one.clause_type, ClauseType::Compound);
        assert_eq!(one.complexity_score, 0.6);

        let two = classify("First part: second part; third part here", Domain::Linguistic);
        assert_eq!(two.clause_type, ClauseType::ChainClause);
        assert!((two.complexity_score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_separator_complexity_is_clamped() {
        let a = classify("a: b; c | d: e; f", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::ChainClause);
        assert_eq!(a.complexity_score, MAX_COMPLEXITY);
    }

    #[test]
    fn test_subordination() {
        let a = classify("The court ruled because the facts were clear", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::ComplexEmbedded);
        assert_eq!(a.complexity_score, 0.85);
    }

    #[test]
    fn test_relative_pronoun_with_comma() {
        let a = classify("The witness, who arrived late, testified today", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::ComplexEmbedded);
        assert_eq!(a.complexity_score, 0.7);
    }

    #[test]
    fn test_coordinator_after_comma() {
        let a = classify("She opened the door, and the dog ran outside", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::Compound);
        assert_eq!(a.complexity_score, 0.6);
    }

    #[test]
    fn test_comma_enumeration_is_simple() {
        let a = classify("We bought apples, pears, plums at the market", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::Simple);
        assert_eq!(a.complexity_score, 0.4);
    }

    #[test]
    fn test_long_comma_chain() {
        let a = classify("red, green, blue, yellow, violet colours everywhere", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::ChainClause);
        assert_eq!(a.complexity_score, 0.5);
    }

    #[test]
    fn test_default_simple_scales_with_length() {
        let a = classify("The cat sat on the mat today", Domain::Linguistic);
        assert_eq!(a.clause_type, ClauseType::Simple);
        assert!((a.complexity_score - (0.2 + 0.015 * 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_wherefore_forces_chain() {
        let a = classify("WHEREFORE, plaintiff demands judgment", Domain::Legal);
        assert_eq!(a.clause_type, ClauseType::ChainClause);
        assert_eq!(a.complexity_score, 0.9);
    }

    #[test]
    fn test_whereas_forces_complex_embedded() {
        let a = classify("WHEREAS the parties wish to enter a lease", Domain::Legal);
        assert_eq!(a.clause_type, ClauseType::ComplexEmbedded);
        assert_eq!(a.complexity_score, 0.85);
    }

    #[test]
    fn test_citation_reduces_complexity() {
        let legal = classify("See Roe v. Wade, 410 U.S. 113 at page two", Domain::Legal);
        let plain = classify("See Roe v. Wade, 410 U.S. 113 at page two", Domain::Linguistic);
        assert_eq!(plain.complexity_score, 0.4);
        assert!((legal.complexity_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_conditional_opener_in_legal() {
        let a = classify("If the tenant defaults, the landlord may re-enter", Domain::Legal);
        assert_eq!(a.clause_type, ClauseType::ComplexEmbedded);
        assert!(a.complexity_score >= 0.8);
    }

    #[test]
    fn test_avg_token_length() {
        let a = classify("ab abcd", Domain::Linguistic);
        assert_eq!(a.avg_token_length, 3.0);
    }
}

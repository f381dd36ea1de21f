//! Shared detection patterns for the heuristics.
//!
//! The scorer, classifier and tier assessor look for overlapping legal and
//! linguistic cues. Keeping the patterns here gives each cue one definition.

use lazy_static::lazy_static;
use regex::Regex;

// =========================================================================
// LEGAL VOCABULARY
// =========================================================================

/// Keywords that mark operative pleading language (matched upper-cased).
pub const LEGAL_KEYWORDS: &[&str] = &[
    "WHEREFORE",
    "PLEASE TAKE NOTICE",
    "AFFIDAVIT",
    "SWORN TO",
    "ORDERED",
    "ADJUDGED",
    "DECREED",
];

// =========================================================================
// LINGUISTIC VOCABULARY
// =========================================================================

/// Closed set of function words that typically open a free translation line
/// rather than a vernacular line.
pub const FUNCTION_WORDS: &[&str] = &[
    "the", "a", "an", "and", "of", "to", "in", "is", "it", "this", "that", "el", "la", "los",
    "las", "un", "una", "le", "les", "et", "des", "der", "die", "das", "und", "il", "lo",
];

// =========================================================================
// CLAUSE VOCABULARY
// =========================================================================

pub const AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];

pub const COORDINATORS: &[&str] = &["and", "but", "or", "nor", "for", "yet", "so"];

pub const SUBORDINATORS: &[&str] = &[
    "because", "although", "though", "since", "unless", "whereas", "while", "until", "whenever",
    "provided", "notwithstanding", "whether",
];

pub const RELATIVE_PRONOUNS: &[&str] = &["who", "whom", "whose", "which", "that", "where"];

lazy_static! {
    // =========================================================================
    // LINE SHAPE
    // =========================================================================

    /// Leading enumerator such as "12.", "a)", "(iv)" followed by whitespace or end.
    pub static ref ENUMERATOR_PREFIX: Regex = Regex::new(
        r"^\(?(?:\d{1,3}|[A-Za-z]|[ivxlcdmIVXLCDM]{1,6})[.)](?:\s+|$)"
    ).unwrap();

    /// Opening clause that makes the rest of the sentence conditional.
    pub static ref CONDITIONAL_OPENER: Regex = Regex::new(
        r"(?i)^\s*(?:if|unless|provided(?:\s+that)?|when|whenever|in\s+the\s+event|in\s+case)\b"
    ).unwrap();

    // =========================================================================
    // LEGAL PATTERNS
    // =========================================================================

    /// Court caption ("SUPREME COURT OF THE STATE OF NEW YORK").
    pub static ref COURT_CAPTION: Regex = Regex::new(
        r"(?i)\b(?:supreme|district|superior|circuit|family|county|civil|criminal|housing|bankruptcy|appellate|surrogate'?s)\s+court\b|\bcourt\s+of\s+(?:appeals|claims|common\s+pleas)\b"
    ).unwrap();

    /// Docket or index number ("Index No: 12345/2024", "Case No. 2:24-cv-001").
    pub static ref DOCKET_NUMBER: Regex = Regex::new(
        r"(?i)\b(?:index|docket|case|file|civil\s+action)\s*(?:no\.?|number|#)\s*:?\s*[A-Za-z0-9][\w\-/.:]*"
    ).unwrap();

    /// Index or docket label only; used for the document-level signal.
    pub static ref INDEX_LABEL: Regex = Regex::new(
        r"(?i)\b(?:index|docket)\s*(?:no\.?|number|#)"
    ).unwrap();

    /// Adversarial party marker ("v.", "vs.", "against").
    pub static ref ADVERSARIAL: Regex = Regex::new(
        r"(?i)\b(?:v|vs)\.(?:\s|$)|\bvs\s|\bagainst\b"
    ).unwrap();

    /// Two capitalized parties around "v." ("Smith v. Jones").
    pub static ref PARTY_VERSUS_PARTY: Regex = Regex::new(
        r"\b[A-Z][\w.'&-]*\s+(?:v|vs)\.?\s+[A-Z]"
    ).unwrap();

    /// Contract recital or definitions opener.
    pub static ref RECITALS_OPENER: Regex = Regex::new(
        r"(?i)^\s*(?:whereas\b|now,?\s+therefore\b|recitals\b|definitions\b|in\s+witness\s+whereof\b|this\s+(?:agreement|lease|contract)\b|\d+(?:\.\d+)*\.?\s+definitions\b)"
    ).unwrap();

    /// Contract header anywhere in the document.
    pub static ref CONTRACT_HEADER: Regex = Regex::new(
        r"(?i)\bthis\s+(?:lease|contract|agreement)\b|\b(?:lease|purchase|service|employment|rental)\s+agreement\b|\bby\s+and\s+between\b|\bhereinafter\s+(?:referred\s+to\s+as|called)\b"
    ).unwrap();

    /// Reporter citation ("410 U.S. 113") or a bare "v.".
    pub static ref CITATION: Regex = Regex::new(
        r"\b\d+\s+U\.?\s?S\.?\s*\d+|\bv\.(?:\s|$)"
    ).unwrap();

    // =========================================================================
    // LINGUISTIC PATTERNS
    // =========================================================================

    /// Characters outside plain ASCII that vernacular transcriptions rely on:
    /// Latin-1 letters, Latin Extended A/B, IPA, spacing modifiers, combining
    /// diacritics, Greek, Cyrillic, Hebrew, Arabic, Devanagari, Latin Extended
    /// Additional, Kana, CJK and Hangul.
    pub static ref STRONG_NATIVE_SCRIPT: Regex = Regex::new(
        r"[\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{024F}\x{0250}-\x{02FF}\x{0300}-\x{036F}\x{0370}-\x{03FF}\x{0400}-\x{04FF}\x{0590}-\x{05FF}\x{0600}-\x{06FF}\x{0900}-\x{097F}\x{1E00}-\x{1EFF}\x{3040}-\x{30FF}\x{4E00}-\x{9FFF}\x{AC00}-\x{D7AF}]"
    ).unwrap();

    /// Morpheme boundary inside a word ("ni-ka=ta", "walk~walk").
    pub static ref MORPHOLOGY_MARKER: Regex = Regex::new(
        r"\w[-=~]\w"
    ).unwrap();

    /// Leipzig-style gloss tag ("3SG", "NOM.PL", "PST").
    pub static ref GLOSS_TAG: Regex = Regex::new(
        r"\b(?:[123](?:SG|PL|DU)|[A-Z]{2,}[0-9]?)(?:[.:][A-Z0-9]+)*\b"
    ).unwrap();
}

/// Lower-cased token with surrounding punctuation removed.
pub fn bare_token(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

/// Check whether a bare token belongs to a closed word set.
pub fn in_set(token: &str, set: &[&str]) -> bool {
    set.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerator_prefix() {
        assert!(ENUMERATOR_PREFIX.is_match("12. The plaintiff"));
        assert!(ENUMERATOR_PREFIX.is_match("a) first"));
        assert!(ENUMERATOR_PREFIX.is_match("(iv) fourth"));
        assert!(ENUMERATOR_PREFIX.is_match("12."));
        assert!(!ENUMERATOR_PREFIX.is_match("e.g. this"));
        assert!(!ENUMERATOR_PREFIX.is_match("3.5 percent"));
    }

    #[test]
    fn test_docket_and_caption() {
        assert!(DOCKET_NUMBER.is_match("Index No: 12345/2024"));
        assert!(DOCKET_NUMBER.is_match("Case No. 2:24-cv-00123"));
        assert!(COURT_CAPTION.is_match("SUPREME COURT OF THE STATE OF NEW YORK"));
        assert!(!COURT_CAPTION.is_match("The court reporter arrived"));
    }

    #[test]
    fn test_adversarial() {
        assert!(ADVERSARIAL.is_match("Smith v. Jones"));
        assert!(ADVERSARIAL.is_match("Smith vs Jones"));
        assert!(ADVERSARIAL.is_match("claims against defendant"));
        assert!(!ADVERSARIAL.is_match("Rev. Smith"));
        assert!(PARTY_VERSUS_PARTY.is_match("Smith v. Jones"));
    }

    #[test]
    fn test_citation() {
        assert!(CITATION.is_match("Roe v. Wade, 410 U.S. 113 (1973)"));
        assert!(CITATION.is_match("see 410 US 113"));
        assert!(!CITATION.is_match("United States Code"));
    }

    #[test]
    fn test_strong_native_script() {
        assert!(STRONG_NATIVE_SCRIPT.is_match("ŋa"));
        assert!(STRONG_NATIVE_SCRIPT.is_match("καλημέρα"));
        assert!(STRONG_NATIVE_SCRIPT.is_match("ʔa"));
        assert!(!STRONG_NATIVE_SCRIPT.is_match("plain ascii"));
    }

    #[test]
    fn test_gloss_tag() {
        let tags: Vec<&str> = GLOSS_TAG
            .find_iter("dog-NOM.PL see-PST 3SG")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tags, vec!["NOM.PL", "PST", "3SG"]);
        assert!(!GLOSS_TAG.is_match("The dog ran."));
    }

    #[test]
    fn test_bare_token() {
        assert_eq!(bare_token("\"Shall,"), "shall");
        assert_eq!(bare_token("(who)"), "who");
    }
}

//! Tier assessment.
//!
//! Decides whether a whole document warrants a more specialized profile or
//! parser. Each signal contributes its full weight when its detector fires;
//! there is no partial credit.

use unicode_segmentation::UnicodeSegmentation;

use crate::heuristics::patterns::{CONTRACT_HEADER, COURT_CAPTION, INDEX_LABEL, PARTY_VERSUS_PARTY};
use crate::types::{Domain, PdfTextDiagnostics, TierAssessment, TierSignal};

pub const SPECIAL_HANDLING_THRESHOLD: f64 = 0.40;
pub const MAX_TIER_CONFIDENCE: f64 = 0.99;

const FRAGMENTATION_LIMIT: f64 = 0.3;
const GRAPHEME_SAMPLE_CHARS: usize = 2000;
const COMPLEX_GRAPHEME_LIMIT: usize = 5;
const NON_LATIN_LIMIT: f64 = 0.3;
const WORD_SAMPLE: usize = 100;
const LONG_WORD_CHARS: usize = 18;
const LONG_WORD_SHARE: f64 = 0.05;

pub const LEGAL_ACTION: &str =
    "Switch to the legal pleading profile with caption and docket-aware segmentation";
pub const LINGUISTIC_ACTION: &str =
    "Switch to the interlinear gloss parser with script-aware tokenization";
pub const STANDARD_ACTION: &str = "Standard line extraction is sufficient";

/// What the detectors look at.
pub struct TierInput<'a> {
    pub text: &'a str,
    pub diagnostics: Option<&'a PdfTextDiagnostics>,
}

struct Signal {
    feature: &'static str,
    weight: f64,
    description: &'static str,
    detect: fn(&TierInput<'_>) -> bool,
}

const SHARED_SIGNALS: &[Signal] = &[Signal {
    feature: "pdf_fragmentation",
    weight: 0.20,
    description: "More than 30% of extracted PDF lines are fragmented",
    detect: detect_fragmentation,
}];

const LEGAL_SIGNALS: &[Signal] = &[
    Signal {
        feature: "index_number",
        weight: 0.40,
        description: "Index or docket number present",
        detect: detect_index_number,
    },
    Signal {
        feature: "adversarial_caption",
        weight: 0.30,
        description: "Adversarial party caption (\"X v. Y\") present",
        detect: detect_adversarial_caption,
    },
    Signal {
        feature: "court_caption",
        weight: 0.30,
        description: "Court caption present",
        detect: detect_court_caption,
    },
    Signal {
        feature: "contract_header",
        weight: 0.50,
        description: "Contract or lease header present",
        detect: detect_contract_header,
    },
];

const LINGUISTIC_SIGNALS: &[Signal] = &[
    Signal {
        feature: "complex_graphemes",
        weight: 0.40,
        description: "Dense multi-codepoint grapheme clusters in the opening sample",
        detect: detect_complex_graphemes,
    },
    Signal {
        feature: "non_latin_script",
        weight: 0.30,
        description: "More than 30% of letters are outside the Latin script",
        detect: detect_non_latin_script,
    },
    Signal {
        feature: "long_words",
        weight: 0.30,
        description: "At least 5% of sampled words exceed 18 characters",
        detect: detect_long_words,
    },
];

fn detect_fragmentation(input: &TierInput<'_>) -> bool {
    input
        .diagnostics
        .map(|d| d.fragmented_line_ratio > FRAGMENTATION_LIMIT)
        .unwrap_or(false)
}

fn detect_index_number(input: &TierInput<'_>) -> bool {
    INDEX_LABEL.is_match(input.text)
}

fn detect_adversarial_caption(input: &TierInput<'_>) -> bool {
    PARTY_VERSUS_PARTY.is_match(input.text)
}

fn detect_court_caption(input: &TierInput<'_>) -> bool {
    COURT_CAPTION.is_match(input.text)
}

fn detect_contract_header(input: &TierInput<'_>) -> bool {
    CONTRACT_HEADER.is_match(input.text)
}

fn detect_complex_graphemes(input: &TierInput<'_>) -> bool {
    complex_grapheme_count(input.text) > COMPLEX_GRAPHEME_LIMIT
}

fn detect_non_latin_script(input: &TierInput<'_>) -> bool {
    non_latin_share(input.text) > NON_LATIN_LIMIT
}

fn detect_long_words(input: &TierInput<'_>) -> bool {
    long_word_share(input.text) >= LONG_WORD_SHARE
}

/// Assess a normalized document.
pub fn assess(
    text: &str,
    domain: Domain,
    diagnostics: Option<&PdfTextDiagnostics>,
) -> TierAssessment {
    let input = TierInput { text, diagnostics };
    let domain_signals = match domain {
        Domain::Legal => LEGAL_SIGNALS,
        Domain::Linguistic => LINGUISTIC_SIGNALS,
    };

    let signals: Vec<TierSignal> = SHARED_SIGNALS
        .iter()
        .chain(domain_signals.iter())
        .filter(|s| (s.detect)(&input))
        .map(|s| TierSignal {
            feature: s.feature.to_string(),
            weight: s.weight,
            description: s.description.to_string(),
        })
        .collect();

    let total: f64 = signals.iter().map(|s| s.weight).sum();
    let confidence = total.min(MAX_TIER_CONFIDENCE);
    let requires_special_handling = confidence >= SPECIAL_HANDLING_THRESHOLD;

    let recommended_action = match (requires_special_handling, domain) {
        (false, _) => STANDARD_ACTION,
        (true, Domain::Legal) => LEGAL_ACTION,
        (true, Domain::Linguistic) => LINGUISTIC_ACTION,
    };

    TierAssessment {
        requires_special_handling,
        confidence,
        signals,
        recommended_action: recommended_action.to_string(),
    }
}

/// Grapheme clusters made of more than one code point (base + combining
/// marks) within the opening sample.
pub fn complex_grapheme_count(text: &str) -> usize {
    let sample_end = text
        .char_indices()
        .nth(GRAPHEME_SAMPLE_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..sample_end]
        .graphemes(true)
        .filter(|g| g.chars().count() > 1 && !g.chars().all(char::is_whitespace))
        .count()
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
        || matches!(c as u32, 0x00C0..=0x024F | 0x0250..=0x02AF | 0x1E00..=0x1EFF)
}

/// Share of alphabetic characters outside the Latin script.
pub fn non_latin_share(text: &str) -> f64 {
    let (letters, non_latin) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(all, other), c| {
            (all + 1, other + usize::from(!is_latin_letter(c)))
        });
    if letters == 0 {
        return 0.0;
    }
    non_latin as f64 / letters as f64
}

/// Share of the first 100 words longer than 18 characters.
pub fn long_word_share(text: &str) -> f64 {
    let sample: Vec<&str> = text.split_whitespace().take(WORD_SAMPLE).collect();
    if sample.is_empty() {
        return 0.0;
    }
    let long = sample
        .iter()
        .filter(|w| w.chars().count() > LONG_WORD_CHARS)
        .count();
    long as f64 / sample.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_document_requires_special_handling() {
        let text = "SUPREME COURT OF THE STATE OF NEW YORK\nIndex No: 12345/2024\nSmith v. Jones";
        let tier = assess(text, Domain::Legal, None);
        assert!(tier.requires_special_handling);
        assert_eq!(tier.confidence, MAX_TIER_CONFIDENCE);
        let features: Vec<&str> = tier.signals.iter().map(|s| s.feature.as_str()).collect();
        assert_eq!(features, vec!["index_number", "adversarial_caption", "court_caption"]);
        assert_eq!(tier.recommended_action, LEGAL_ACTION);
    }

    #[test]
    fn test_plain_text_does_not_require_special_handling() {
        let tier = assess("The parties met for lunch.", Domain::Legal, None);
        assert!(!tier.requires_special_handling);
        assert!(tier.signals.is_empty());
        assert_eq!(tier.confidence, 0.0);
        assert_eq!(tier.recommended_action, STANDARD_ACTION);
    }

    #[test]
    fn test_fragmentation_alone_is_below_threshold() {
        let diagnostics = PdfTextDiagnostics {
            fragmented_line_ratio: 0.5,
            ..Default::default()
        };
        let tier = assess("plain text", Domain::Linguistic, Some(&diagnostics));
        assert_eq!(tier.signals.len(), 1);
        assert!((tier.confidence - 0.2).abs() < 1e-9);
        assert!(!tier.requires_special_handling);
    }

    #[test]
    fn test_contract_header_alone_suffices() {
        let tier = assess("THIS LEASE AGREEMENT is made", Domain::Legal, None);
        assert!(tier.requires_special_handling);
        assert!((tier.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_latin_script_signal() {
        let tier = assess("Здравствуйте мир друзья", Domain::Linguistic, None);
        assert!(tier.signals.iter().any(|s| s.feature == "non_latin_script"));
    }

    #[test]
    fn test_complex_graphemes() {
        // Each "a\u{0301}" is a single grapheme built from two code points
        let text = "a\u{0301} ".repeat(6);
        assert_eq!(complex_grapheme_count(&text), 6);
        let tier = assess(&text, Domain::Linguistic, None);
        assert!(tier.signals.iter().any(|s| s.feature == "complex_graphemes"));
    }

    #[test]
    fn test_long_word_share() {
        let mut words = vec!["short"; 19];
        words.push("tusaanngitsuusaartuaannarsiinnaanngivipputit");
        let text = words.join(" ");
        assert!((long_word_share(&text) - 0.05).abs() < 1e-9);
        let tier = assess(&text, Domain::Linguistic, None);
        assert!(tier.signals.iter().any(|s| s.feature == "long_words"));
    }
}

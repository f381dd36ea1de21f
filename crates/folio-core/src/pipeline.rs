//! Segmentation and orchestration of a single run.
//!
//! A run normalizes the input, scores and classifies every line with the
//! domain's strategy, keeps the lines that clear the threshold, and then
//! runs the whole-text stages: tier assessment, custom rules and (for legal
//! input) the legal analyzer.

use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;
use crate::envelope::DocumentEnvelope;
use crate::hasher;
use crate::heuristics::{scorer, tier};
use crate::legal::analyzer::LegalContext;
use crate::legal::{DocumentGraph, LegalAnalyzer};
use crate::profile::{resolve_profile, Profile};
use crate::rules::{CustomRule, RuleEngine};
use crate::text::normalize;
use crate::types::{Block, Domain, ParseReport, ParseStats, PdfTextDiagnostics, SourceMetadata};

/// Inputs to a run besides the text itself.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub domain: Domain,

    /// Explicit profile; wins over `language`
    pub profile: Option<Profile>,

    /// ISO 639-3 code used when no profile is given
    pub language: Option<String>,

    pub source: SourceMetadata,

    pub custom_rules: Vec<CustomRule>,

    pub diagnostics: Option<PdfTextDiagnostics>,

    /// Case corpus for reference integrity (legal only)
    pub corpus: Option<DocumentGraph>,

    /// Pin the output timestamp; defaults to the current time
    pub timestamp: Option<DateTime<Utc>>,
}

impl ParseOptions {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            profile: None,
            language: None,
            source: SourceMetadata::default(),
            custom_rules: Vec::new(),
            diagnostics: None,
            corpus: None,
            timestamp: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_source(mut self, source: SourceMetadata) -> Self {
        self.source = source;
        self
    }

    pub fn with_rules(mut self, rules: Vec<CustomRule>) -> Self {
        self.custom_rules = rules;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: PdfTextDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn with_corpus(mut self, corpus: DocumentGraph) -> Self {
        self.corpus = Some(corpus);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The profile this run uses.
    pub fn resolved_profile(&self) -> Profile {
        resolve_profile(self.profile, self.language.as_deref())
    }
}

impl From<PipelineConfig> for ParseOptions {
    fn from(config: PipelineConfig) -> Self {
        Self {
            domain: config.domain,
            profile: config.profile,
            language: config.language,
            source: config.source,
            custom_rules: config.custom_rules,
            diagnostics: None,
            corpus: None,
            timestamp: None,
        }
    }
}

/// A reusable pipeline.
///
/// Holds compiled custom rules between runs; everything else is
/// recomputed from the inputs.
#[derive(Default)]
pub struct Pipeline {
    rules: RuleEngine,
    legal: LegalAnalyzer,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pipeline over raw text. Never fails: the worst case is a
    /// report with no blocks.
    pub fn run(&mut self, text: &str, options: &ParseOptions) -> ParseReport {
        let domain = options.domain;
        let profile = options.resolved_profile();
        let strategy = domain.strategy();
        let timestamp = options.timestamp.unwrap_or_else(Utc::now);

        let normalized = normalize(text);
        let mut total_lines = 0;
        let mut blocks = Vec::new();

        for (line_number, line) in normalized.lines().enumerate() {
            total_lines += 1;

            let raw = line.trim();
            let clean = scorer::strip_enumerator(raw);
            let score = strategy.score(clean, profile);
            if !strategy.retains(&score) {
                continue;
            }

            blocks.push(Block {
                id: hasher::block_id(raw, line_number),
                raw_source: raw.to_string(),
                clean_text: clean.to_string(),
                confidence: score.score,
                warnings: score.warnings,
                line_number,
                structural: Some(strategy.classify(clean)),
            });
        }

        let clean_text = blocks
            .iter()
            .map(|b| b.clean_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let average_confidence = if blocks.is_empty() {
            0.0
        } else {
            blocks.iter().map(|b| b.confidence).sum::<f64>() / blocks.len() as f64
        };

        let stats = ParseStats {
            total_lines,
            extracted_lines: blocks.len(),
            average_confidence,
        };

        let tier = tier::assess(&normalized, domain, options.diagnostics.as_ref());
        let rule_run = self.rules.apply(&options.custom_rules, &normalized);

        let legal = match domain {
            Domain::Legal => Some(self.legal.analyze(
                &normalized,
                LegalContext {
                    document_type: options.source.document_type.as_deref(),
                    corpus: options.corpus.as_ref(),
                },
                timestamp,
            )),
            Domain::Linguistic => None,
        };

        let envelope =
            DocumentEnvelope::assemble(blocks, options.source.clone(), profile, domain, timestamp);

        tracing::debug!(
            document_id = %envelope.document_id,
            domain = %domain,
            profile = %profile,
            total_lines = stats.total_lines,
            extracted_lines = stats.extracted_lines,
            extractions = rule_run.extractions.len(),
            "Parsed document"
        );

        ParseReport {
            envelope,
            clean_text,
            tier,
            stats,
            custom_extractions: rule_run.extractions,
            warnings: rule_run.warnings,
            legal,
        }
    }
}

/// Run a one-off pipeline over raw text.
pub fn parse_document(text: &str, options: &ParseOptions) -> ParseReport {
    Pipeline::new().run(text, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legal::Severity;
    use crate::types::ClauseType;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const PLEADING: &str = "SUPREME COURT OF THE STATE OF NEW YORK\r\n\
Index No: 12345/2024\r\n\
Smith v. Jones\r\n\
\r\n\
3\r\n\
WHEREFORE, plaintiff demands judgment";

    fn pinned(domain: Domain) -> ParseOptions {
        ParseOptions::new(domain).with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_pleading_blocks() {
        let report = parse_document(PLEADING, &pinned(Domain::Legal));

        assert_eq!(report.stats.total_lines, 6);
        assert_eq!(report.stats.extracted_lines, 4);
        let lines: Vec<usize> = report.blocks().iter().map(|b| b.line_number).collect();
        assert_eq!(lines, vec![0, 1, 2, 5]);

        let last = &report.blocks()[3];
        assert_eq!(last.id, hasher::block_id("WHEREFORE, plaintiff demands judgment", 5));
        assert_eq!(
            last.structural.as_ref().map(|s| s.clause_type),
            Some(ClauseType::ChainClause)
        );
        assert!(report.envelope.verify().is_ok());
        assert_eq!(report.clean_text.lines().count(), 4);
    }

    #[test]
    fn test_pleading_requires_special_handling() {
        let report = parse_document(PLEADING, &pinned(Domain::Legal));
        assert!(report.tier.requires_special_handling);
        assert!(report.legal.is_some());
    }

    #[test]
    fn test_enumerator_kept_in_raw_source() {
        let report = parse_document("12. The tenant shall pay rent.", &pinned(Domain::Legal));
        let block = &report.blocks()[0];
        assert_eq!(block.raw_source, "12. The tenant shall pay rent.");
        assert_eq!(block.clean_text, "The tenant shall pay rent.");
        assert_eq!(block.id, hasher::block_id("12. The tenant shall pay rent.", 0));
    }

    #[test]
    fn test_empty_input() {
        let report = parse_document("", &pinned(Domain::Linguistic));
        assert_eq!(report.stats.total_lines, 0);
        assert!(report.blocks().is_empty());
        assert_eq!(report.stats.average_confidence, 0.0);
        assert_eq!(report.clean_text, "");
        assert!(report.legal.is_none());
    }

    #[test]
    fn test_blank_lines_count_but_are_dropped() {
        let report = parse_document("\n\n   \n", &pinned(Domain::Legal));
        assert_eq!(report.stats.total_lines, 3);
        assert!(report.blocks().is_empty());
    }

    #[test]
    fn test_custom_rules_see_full_text() {
        let options = pinned(Domain::Legal)
            .with_rules(vec![CustomRule::new("R1", "Amounts", r"\$[\d,]+")]);
        let report = parse_document("Paid $1,200 today.\n\n3", &options);
        assert_eq!(report.custom_extractions.len(), 1);
        assert_eq!(report.custom_extractions[0].matched, "$1,200");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_bad_rule_becomes_warning() {
        let options = pinned(Domain::Linguistic)
            .with_rules(vec![CustomRule::new("BAD", "Broken", "(")]);
        let report = parse_document("some text", &options);
        assert!(report.custom_extractions.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_unsigned_lease_through_pipeline() {
        let options = pinned(Domain::Legal).with_source(SourceMetadata {
            document_type: Some("Lease Agreement".to_string()),
            ..Default::default()
        });
        let report = parse_document("THIS LEASE AGREEMENT is made between the parties.", &options);
        let legal = report.legal.as_ref().unwrap();
        let missing: Vec<_> = legal.violations_for("missing_signature").collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].severity, Severity::High);
    }

    #[test]
    fn test_profile_from_language() {
        let report = parse_document("x", &pinned(Domain::Linguistic).with_language("iku"));
        assert_eq!(report.profile(), Profile::Polysynthetic);

        let explicit = pinned(Domain::Linguistic)
            .with_language("iku")
            .with_profile(Profile::Analytic);
        assert_eq!(parse_document("x", &explicit).profile(), Profile::Analytic);
    }

    #[test]
    fn test_pipeline_reuses_rule_cache() {
        let mut pipeline = Pipeline::new();
        let options = pinned(Domain::Legal)
            .with_rules(vec![CustomRule::new("R1", "Amounts", r"\$\d+")]);
        let first = pipeline.run("Pay $5", &options);
        let second = pipeline.run("Pay $5", &options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_options_from_config() {
        let config = PipelineConfig::from_yaml("domain: linguistic\nlanguage: iku\n").unwrap();
        let options = ParseOptions::from(config);
        assert_eq!(options.domain, Domain::Linguistic);
        assert_eq!(options.resolved_profile(), Profile::Polysynthetic);
    }

    fn domain_strategy() -> impl Strategy<Value = Domain> {
        prop_oneof![Just(Domain::Legal), Just(Domain::Linguistic)]
    }

    proptest! {
        #[test]
        fn prop_runs_are_deterministic(text in "[ -~\n]{0,200}", domain in domain_strategy()) {
            let options = pinned(domain);
            let a = parse_document(&text, &options);
            let b = parse_document(&text, &options);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_confidence_is_bounded(text in "\\PC{0,120}(\n\\PC{0,120}){0,5}", domain in domain_strategy()) {
            let report = parse_document(&text, &pinned(domain));
            let cap = match domain {
                Domain::Legal => 0.99,
                Domain::Linguistic => 1.0,
            };
            for block in report.blocks() {
                prop_assert!(block.confidence >= 0.0 && block.confidence <= cap);
            }
        }

        #[test]
        fn prop_retained_iff_above_threshold(text in "[ -~\n]{0,200}", domain in domain_strategy()) {
            let options = pinned(domain);
            let report = parse_document(&text, &options);
            let strategy = domain.strategy();
            let profile = options.resolved_profile();

            let expected: Vec<usize> = normalize(&text)
                .lines()
                .enumerate()
                .filter(|(_, line)| {
                    let score = strategy.score(scorer::strip_enumerator(line.trim()), profile);
                    !score.is_empty_line() && score.score >= strategy.threshold()
                })
                .map(|(i, _)| i)
                .collect();
            let actual: Vec<usize> = report.blocks().iter().map(|b| b.line_number).collect();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_envelope_always_verifies(text in "\\PC{0,200}") {
            let report = parse_document(&text, &pinned(Domain::Linguistic));
            prop_assert!(report.envelope.verify().is_ok());
            prop_assert_eq!(report.stats.total_lines, normalize(&text).lines().count());
        }
    }
}

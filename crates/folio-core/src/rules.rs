//! User-authored pattern rules.
//!
//! Rules are regular expressions supplied at runtime. They scan the whole
//! normalized text, not individual lines. A rule that fails to compile never
//! aborts a run: it yields no extractions and a warning.

use std::collections::HashMap;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::context_window;
use crate::types::PipelineWarning;

/// Flags applied when a rule does not specify any.
pub const DEFAULT_FLAGS: &str = "gi";

/// Characters of context captured either side of a match.
pub const CONTEXT_RADIUS: usize = 20;

/// Upper bound on compiled program size for a single rule.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Errors from compiling a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Rule {rule_id}: invalid pattern: {message}")]
    InvalidPattern { rule_id: String, message: String },

    #[error("Rule {rule_id}: unsupported flag '{flag}'")]
    UnsupportedFlag { rule_id: String, flag: char },
}

fn default_active() -> bool {
    true
}

/// A user-authored extraction rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomRule {
    /// Unique identifier (e.g., "R1")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Regular expression source
    pub pattern: String,

    /// Flag letters (`g i m s x u d`); defaults to "gi"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

impl CustomRule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pattern: pattern.into(),
            flags: None,
            active: true,
        }
    }

    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(flags.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    fn effective_flags(&self) -> &str {
        self.flags.as_deref().unwrap_or(DEFAULT_FLAGS)
    }
}

/// One match of a custom rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomExtraction {
    pub rule_id: String,
    pub rule_name: String,

    /// The matched text
    #[serde(rename = "match")]
    pub matched: String,

    /// Byte offset of the match in the normalized text
    pub index: usize,

    /// The match with up to 20 characters either side, newlines as spaces
    pub context: String,
}

/// Parsed rule flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleFlags {
    pub global: bool,
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

impl RuleFlags {
    /// Parse flag letters. `u` and `d` are accepted and have no effect.
    pub fn parse(flags: &str) -> Result<Self, char> {
        let mut parsed = RuleFlags::default();
        for flag in flags.chars() {
            match flag {
                'g' => parsed.global = true,
                'i' => parsed.case_insensitive = true,
                'm' => parsed.multi_line = true,
                's' => parsed.dot_matches_new_line = true,
                'x' => parsed.ignore_whitespace = true,
                'u' | 'd' => {}
                other => return Err(other),
            }
        }
        Ok(parsed)
    }
}

/// A rule compiled and ready to scan.
#[derive(Debug)]
pub struct CompiledRule {
    rule_id: String,
    rule_name: String,
    regex: Regex,
    global: bool,
}

impl CompiledRule {
    /// Compile a rule with its flags.
    pub fn compile(rule: &CustomRule) -> Result<Self, PatternError> {
        let flags = RuleFlags::parse(rule.effective_flags()).map_err(|flag| {
            PatternError::UnsupportedFlag {
                rule_id: rule.id.clone(),
                flag,
            }
        })?;

        let regex = RegexBuilder::new(&rule.pattern)
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_matches_new_line)
            .ignore_whitespace(flags.ignore_whitespace)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| PatternError::InvalidPattern {
                rule_id: rule.id.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            regex,
            global: flags.global,
        })
    }

    /// Scan the full text. Without the `g` flag only the first match counts.
    /// Zero-length matches are skipped.
    pub fn scan(&self, text: &str) -> Vec<CustomExtraction> {
        let matches = self.regex.find_iter(text).filter(|m| !m.as_str().is_empty());
        let limit = if self.global { usize::MAX } else { 1 };

        matches
            .take(limit)
            .map(|m| CustomExtraction {
                rule_id: self.rule_id.clone(),
                rule_name: self.rule_name.clone(),
                matched: m.as_str().to_string(),
                index: m.start(),
                context: context_window(text, m.start(), m.end(), CONTEXT_RADIUS),
            })
            .collect()
    }
}

struct CacheEntry {
    pattern: String,
    flags: Option<String>,
    compiled: Result<Arc<CompiledRule>, PatternError>,
}

/// Extractions and warnings from applying a rule set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRun {
    pub extractions: Vec<CustomExtraction>,
    pub warnings: Vec<PipelineWarning>,
}

/// Applies rule sets and caches compiled patterns per rule id.
///
/// A cached entry is reused while the rule's pattern and flags are
/// unchanged. Failed compilations are cached too, so a bad rule is reported
/// on every run without being recompiled.
#[derive(Default)]
pub struct RuleEngine {
    cache: HashMap<String, CacheEntry>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a rule, reusing the cached program when possible.
    pub fn compile(&mut self, rule: &CustomRule) -> Result<Arc<CompiledRule>, PatternError> {
        let fresh = match self.cache.get(&rule.id) {
            Some(entry) => entry.pattern != rule.pattern || entry.flags != rule.flags,
            None => true,
        };

        if fresh {
            let compiled = CompiledRule::compile(rule).map(Arc::new);
            self.cache.insert(
                rule.id.clone(),
                CacheEntry {
                    pattern: rule.pattern.clone(),
                    flags: rule.flags.clone(),
                    compiled,
                },
            );
        }

        match self.cache.get(&rule.id) {
            Some(entry) => entry.compiled.clone(),
            None => CompiledRule::compile(rule).map(Arc::new),
        }
    }

    /// Apply every active rule, in order, to the full text.
    pub fn apply(&mut self, rules: &[CustomRule], text: &str) -> RuleRun {
        let mut run = RuleRun::default();

        for rule in rules.iter().filter(|r| r.active) {
            match self.compile(rule) {
                Ok(compiled) => run.extractions.extend(compiled.scan(text)),
                Err(e) => {
                    tracing::warn!(rule_id = %rule.id, error = %e, "Custom rule skipped");
                    run.warnings.push(PipelineWarning {
                        source: format!("custom_rule:{}", rule.id),
                        message: e.to_string(),
                    });
                }
            }
        }

        run
    }

    /// Number of cached rule entries.
    pub fn cached_rules(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached programs.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_amount_rule() {
        let rule = CustomRule::new("R1", "Amounts", r"\$[\d,]+");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "Paid $1,200 today.");

        assert_eq!(run.extractions.len(), 1);
        let hit = &run.extractions[0];
        assert_eq!(hit.matched, "$1,200");
        assert_eq!(hit.index, 5);
        assert_eq!(hit.rule_name, "Amounts");
        assert_eq!(hit.context, "Paid $1,200 today.");
        assert!(run.warnings.is_empty());
    }

    #[test]
    fn test_default_flags_are_case_insensitive_and_global() {
        let rule = CustomRule::new("R1", "Tenant", "tenant");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "TENANT and Tenant and tenant");
        assert_eq!(run.extractions.len(), 3);
    }

    #[test]
    fn test_non_global_reports_first_match_only() {
        let rule = CustomRule::new("R1", "Tenant", "tenant").with_flags("i");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "Tenant and tenant");
        assert_eq!(run.extractions.len(), 1);
        assert_eq!(run.extractions[0].index, 0);
    }

    #[test]
    fn test_case_sensitive_when_flag_absent() {
        let rule = CustomRule::new("R1", "Tenant", "tenant").with_flags("g");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "TENANT tenant");
        assert_eq!(run.extractions.len(), 1);
        assert_eq!(run.extractions[0].index, 7);
    }

    #[test]
    fn test_invalid_pattern_is_non_fatal() {
        let bad = CustomRule::new("BAD", "Broken", "([unclosed");
        let good = CustomRule::new("R2", "Amounts", r"\$\d+");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[bad, good], "Pay $50 now");

        assert_eq!(run.extractions.len(), 1);
        assert_eq!(run.extractions[0].rule_id, "R2");
        assert_eq!(run.warnings.len(), 1);
        assert_eq!(run.warnings[0].source, "custom_rule:BAD");
    }

    #[test]
    fn test_unsupported_flag() {
        let rule = CustomRule::new("R1", "Sticky", "a").with_flags("gy");
        let err = CompiledRule::compile(&rule).unwrap_err();
        assert_eq!(
            err,
            PatternError::UnsupportedFlag {
                rule_id: "R1".to_string(),
                flag: 'y'
            }
        );
    }

    #[test]
    fn test_inactive_rules_are_skipped() {
        let rule = CustomRule::new("R1", "Amounts", r"\$\d+").inactive();
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "Pay $50 now");
        assert!(run.extractions.is_empty());
        assert_eq!(engine.cached_rules(), 0);
    }

    #[test]
    fn test_cache_is_reused_and_refreshed() {
        let mut engine = RuleEngine::new();
        let rule = CustomRule::new("R1", "Amounts", r"\$\d+");

        let first = engine.compile(&rule).unwrap();
        let second = engine.compile(&rule).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let changed = CustomRule::new("R1", "Amounts", r"€\d+");
        let third = engine.compile(&changed).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(engine.cached_rules(), 1);
    }

    #[test]
    fn test_matches_span_lines() {
        let rule = CustomRule::new("R1", "Split", r"first\s+second");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "the first\nsecond line");
        assert_eq!(run.extractions.len(), 1);
        assert_eq!(run.extractions[0].context, "the first second line");
    }

    #[test]
    fn test_zero_length_matches_are_skipped() {
        let rule = CustomRule::new("R1", "Empty", "x*");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "abc");
        assert!(run.extractions.is_empty());
    }

    #[test]
    fn test_extraction_serializes_match_field() {
        let rule = CustomRule::new("R1", "Amounts", r"\$\d+");
        let mut engine = RuleEngine::new();
        let run = engine.apply(&[rule], "$5");
        let json = serde_json::to_value(&run.extractions[0]).unwrap();
        assert_eq!(json["match"], "$5");
    }
}

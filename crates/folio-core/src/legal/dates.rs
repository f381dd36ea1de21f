//! Date extraction.
//!
//! Three surface forms are recognized: `MM/DD/YYYY`, `Month DD, YYYY` and
//! ISO `YYYY-MM-DD`. Every candidate is calendar-checked; impossible dates
//! such as `02/30/2021` are reported as skipped rather than extracted.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::text::context_window;
use crate::types::Span;

/// Characters of context captured either side of a date.
pub const DATE_CONTEXT_RADIUS: usize = 50;

lazy_static! {
    pub(crate) static ref NUMERIC_DATE: Regex =
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap();

    static ref LONG_DATE: Regex = Regex::new(
        r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),\s*(\d{4})\b"
    ).unwrap();

    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
}

/// What role a date plays in the document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    /// Sworn or notarized
    Jurat,
    Filing,
    Signature,
    Service,
    Hearing,
    /// Anything else
    Reference,
}

/// Keyword buckets in priority order; the first bucket with a hit wins.
const TYPE_KEYWORDS: &[(DateType, &[&str])] = &[
    (DateType::Jurat, &["sworn", "notary", "subscribed"]),
    (DateType::Filing, &["filed", "filing", "dated:"]),
    (DateType::Signature, &["signed", "signature", "executed"]),
    (DateType::Service, &["served", "service", "mail"]),
    (DateType::Hearing, &["hearing", "appearance", "returnable"]),
];

impl DateType {
    /// Classify a date from the text around it.
    pub fn from_context(context: &str) -> Self {
        let lowered = context.to_lowercase();
        TYPE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(date_type, _)| *date_type)
            .unwrap_or(DateType::Reference)
    }
}

/// A calendar-valid date found in the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedDate {
    pub date: NaiveDate,

    /// The matched text, e.g. "January 5, 2020"
    pub text: String,

    /// Up to 50 characters either side
    pub context: String,

    pub date_type: DateType,

    pub location: Span,
}

/// A date-shaped candidate that is not a real calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedDate {
    pub text: String,
    pub location: Span,
    pub reason: String,
}

/// Output of a date extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateExtraction {
    /// Sorted by date, ties broken by position
    pub dates: Vec<ExtractedDate>,
    pub skipped: Vec<SkippedDate>,
}

type Fields = (i32, u32, u32);

struct DateFamily {
    name: &'static str,
    regex: &'static Regex,
    fields: fn(&Captures<'_>) -> Option<Fields>,
}

fn numeric_fields(caps: &Captures<'_>) -> Option<Fields> {
    Some((caps[3].parse().ok()?, caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn long_fields(caps: &Captures<'_>) -> Option<Fields> {
    Some((caps[3].parse().ok()?, month_number(&caps[1])?, caps[2].parse().ok()?))
}

fn iso_fields(caps: &Captures<'_>) -> Option<Fields> {
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?))
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let lowered = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lowered)
        .map(|i| i as u32 + 1)
}

/// First `MM/DD/YYYY` date in `text` that is a real calendar date.
pub fn parse_numeric_date(text: &str) -> Option<NaiveDate> {
    NUMERIC_DATE.captures_iter(text).find_map(|caps| {
        let (year, month, day) = numeric_fields(&caps)?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Finds and classifies dates.
pub struct DateExtractor {
    families: Vec<DateFamily>,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            families: vec![
                DateFamily {
                    name: "numeric",
                    regex: &NUMERIC_DATE,
                    fields: numeric_fields,
                },
                DateFamily {
                    name: "long",
                    regex: &LONG_DATE,
                    fields: long_fields,
                },
                DateFamily {
                    name: "iso",
                    regex: &ISO_DATE,
                    fields: iso_fields,
                },
            ],
        }
    }

    pub fn extract(&self, text: &str) -> DateExtraction {
        let mut extraction = DateExtraction::default();

        for family in &self.families {
            for caps in family.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let location = Span::new(whole.start(), whole.end());

                let parsed = (family.fields)(&caps)
                    .and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day));

                let Some(date) = parsed else {
                    tracing::debug!(
                        family = family.name,
                        text = whole.as_str(),
                        start = location.start,
                        "Skipping invalid calendar date"
                    );
                    extraction.skipped.push(SkippedDate {
                        text: whole.as_str().to_string(),
                        location,
                        reason: format!("not a valid {} calendar date", family.name),
                    });
                    continue;
                };

                let context =
                    context_window(text, location.start, location.end, DATE_CONTEXT_RADIUS);
                extraction.dates.push(ExtractedDate {
                    date,
                    text: whole.as_str().to_string(),
                    date_type: DateType::from_context(&context),
                    context,
                    location,
                });
            }
        }

        extraction
            .dates
            .sort_by(|a, b| a.date.cmp(&b.date).then(a.location.start.cmp(&b.location.start)));
        extraction.skipped.sort_by_key(|s| s.location.start);
        extraction
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

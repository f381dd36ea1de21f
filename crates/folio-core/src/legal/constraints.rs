//! Temporal constraints over extracted dates.
//!
//! Each constraint is a named predicate over the sorted date list that
//! reports at most one violation: the first offending pair found. Later
//! pairs that break the same constraint are not reported.

use chrono::NaiveDate;

use crate::evidence::Evidence;
use crate::legal::dates::{DateType, ExtractedDate};
use crate::legal::{Severity, Violation};

/// Minimum notice, in days, between service and hearing.
pub const MIN_NOTICE_DAYS: i64 = 7;

/// A named temporal rule.
pub struct Constraint {
    pub id: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    check: fn(&Constraint, &[ExtractedDate]) -> Option<Violation>,
}

impl Constraint {
    pub fn evaluate(&self, dates: &[ExtractedDate]) -> Option<Violation> {
        (self.check)(self, dates)
    }

    fn violation(&self, detail: String, pair: [&ExtractedDate; 2]) -> Violation {
        Violation {
            constraint_id: self.id.to_string(),
            severity: self.severity,
            description: format!("{}: {}", self.description, detail),
            evidence: pair
                .iter()
                .map(|d| {
                    Evidence::from_text(
                        format!("{:?} date {}", d.date_type, d.text),
                        d.location,
                    )
                })
                .collect(),
            dates: pair.iter().map(|d| (*d).clone()).collect(),
        }
    }
}

/// The fixed constraint table, evaluated in order.
pub const CONSTRAINTS: &[Constraint] = &[
    Constraint {
        id: "jurat_before_filing",
        severity: Severity::Critical,
        description: "Jurat is dated after the filing it supports",
        check: check_jurat_before_filing,
    },
    Constraint {
        id: "signature_before_filing",
        severity: Severity::Critical,
        description: "Signature is dated after the filing",
        check: check_signature_before_filing,
    },
    Constraint {
        id: "service_before_hearing",
        severity: Severity::High,
        description: "Service leaves less than 7 days' notice before the hearing",
        check: check_service_before_hearing,
    },
];

fn of_type(dates: &[ExtractedDate], date_type: DateType) -> impl Iterator<Item = &ExtractedDate> {
    dates.iter().filter(move |d| d.date_type == date_type)
}

/// First pair `(a, b)` with `a` of type `first`, `b` of type `second`
/// satisfying `offends`.
fn first_pair<'a>(
    dates: &'a [ExtractedDate],
    first: DateType,
    second: DateType,
    offends: impl Fn(NaiveDate, NaiveDate) -> bool,
) -> Option<(&'a ExtractedDate, &'a ExtractedDate)> {
    of_type(dates, first).find_map(|a| {
        of_type(dates, second)
            .find(|b| offends(a.date, b.date))
            .map(|b| (a, b))
    })
}

fn check_jurat_before_filing(c: &Constraint, dates: &[ExtractedDate]) -> Option<Violation> {
    let (jurat, filing) = first_pair(dates, DateType::Jurat, DateType::Filing, |j, f| j > f)?;
    Some(c.violation(
        format!("sworn {} but filed {}", jurat.date, filing.date),
        [jurat, filing],
    ))
}

fn check_signature_before_filing(c: &Constraint, dates: &[ExtractedDate]) -> Option<Violation> {
    let (signed, filing) =
        first_pair(dates, DateType::Signature, DateType::Filing, |s, f| s > f)?;
    Some(c.violation(
        format!("signed {} but filed {}", signed.date, filing.date),
        [signed, filing],
    ))
}

fn check_service_before_hearing(c: &Constraint, dates: &[ExtractedDate]) -> Option<Violation> {
    let (service, hearing) = first_pair(dates, DateType::Service, DateType::Hearing, |s, h| {
        let gap = (h - s).num_days();
        (0..MIN_NOTICE_DAYS).contains(&gap)
    })?;
    Some(c.violation(
        format!(
            "served {} for a hearing on {} ({} days)",
            service.date,
            hearing.date,
            (hearing.date - service.date).num_days()
        ),
        [service, hearing],
    ))
}

/// Evaluates the constraint table.
pub struct ConstraintChecker {
    constraints: &'static [Constraint],
}

impl ConstraintChecker {
    pub fn new() -> Self {
        Self {
            constraints: CONSTRAINTS,
        }
    }

    pub fn check(&self, dates: &[ExtractedDate]) -> Vec<Violation> {
        self.constraints
            .iter()
            .filter_map(|c| c.evaluate(dates))
            .collect()
    }

    pub fn constraint_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constraints.iter().map(|c| c.id)
    }
}

impl Default for ConstraintChecker {
    fn default() -> Self {
        Self::new()
    }
}

#![warn(missing_docs)]

//! Clash detection for resolved structure models.
//!
//! One stateless pass evaluates the model against every rule category and
//! produces severity-ranked, confidence-scored [`Clash`] records plus an
//! aggregate summary. Detection never mutates the model; a fresh pass
//! supersedes earlier findings.

mod rules;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use steelcheck_model::{Clash, ClashCategory, Severity, StructureModel};
use steelcheck_resolve::ToleranceSettings;
use steelcheck_standards::RuleTables;
use tracing::debug;

/// Aggregate clash counts per category and severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClashSummary {
    /// Total number of clashes.
    pub total: usize,
    /// Clash count per rule category.
    pub by_category: BTreeMap<ClashCategory, usize>,
    /// Clash count per severity.
    pub by_severity: BTreeMap<Severity, usize>,
}

impl ClashSummary {
    fn from_clashes(clashes: &[Clash]) -> Self {
        let mut summary = Self {
            total: clashes.len(),
            ..Default::default()
        };
        for clash in clashes {
            *summary.by_category.entry(clash.category).or_insert(0) += 1;
            *summary.by_severity.entry(clash.severity).or_insert(0) += 1;
        }
        summary
    }

    /// Count of clashes at the given severity.
    pub fn at_severity(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Result of one detection pass: ordered clashes plus the summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClashReport {
    /// Clashes ordered by severity, then category, then subject ids.
    pub clashes: Vec<Clash>,
    /// Aggregate counts.
    pub summary: ClashSummary,
}

impl ClashReport {
    /// True when no clash was found.
    pub fn is_clean(&self) -> bool {
        self.clashes.is_empty()
    }

    /// Clashes of one category, in report order.
    pub fn of_category(&self, category: ClashCategory) -> impl Iterator<Item = &Clash> {
        self.clashes.iter().filter(move |c| c.category == category)
    }
}

/// Shared state for one detection pass.
pub(crate) struct DetectPass<'a> {
    pub model: &'a StructureModel,
    pub tables: &'a RuleTables,
    pub tol: &'a ToleranceSettings,
    clashes: Vec<Clash>,
    next_id: u64,
}

impl<'a> DetectPass<'a> {
    /// Record a clash. Confidence is the deviation normalized by the
    /// violated tolerance, clamped to `[0, 1]`.
    pub fn push(
        &mut self,
        category: ClashCategory,
        severity: Severity,
        subjects: Vec<String>,
        description: String,
        deviation: f64,
        tolerance: f64,
    ) {
        let confidence = if tolerance > 0.0 && deviation.is_finite() {
            (deviation.abs() / tolerance).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let id = self.next_id;
        self.next_id += 1;
        self.clashes.push(Clash {
            id,
            category,
            severity,
            subjects,
            description,
            deviation,
            confidence,
        });
    }
}

/// Evaluate the model against every rule category.
pub fn detect(
    model: &StructureModel,
    tables: &RuleTables,
    tolerances: &ToleranceSettings,
) -> ClashReport {
    let mut pass = DetectPass {
        model,
        tables,
        tol: tolerances,
        clashes: Vec::new(),
        next_id: 1,
    };

    rules::geometric::check(&mut pass);
    rules::plates::check(&mut pass);
    rules::fasteners::check(&mut pass);
    rules::members::check(&mut pass);
    rules::logic::check(&mut pass);

    let mut clashes = pass.clashes;
    clashes.sort_by(|a, b| {
        (a.severity, a.category, &a.subjects, a.id).cmp(&(b.severity, b.category, &b.subjects, b.id))
    });

    let summary = ClashSummary::from_clashes(&clashes);
    debug!(
        total = summary.total,
        critical = summary.at_severity(Severity::Critical),
        "detection pass complete"
    );
    ClashReport { clashes, summary }
}

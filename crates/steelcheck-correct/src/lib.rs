#![warn(missing_docs)]

//! Clash correction: category-specific repair strategies.
//!
//! Clashes are processed in severity order (CRITICAL, MAJOR, MODERATE;
//! MINOR is logged, never auto-fixed). Each category maps to a pure
//! repair that produces a new element state; clashes with no
//! deterministic strategy are left untouched and surfaced as failed
//! corrections for manual review. The corrected model is re-detected by
//! the orchestrator, so repairs never have to prove global confluence.

mod strategies;

use steelcheck_model::{
    Clash, ClashCategory, Correction, CorrectionChange, CorrectionStatus, Severity,
    StructureModel,
};
use steelcheck_resolve::ToleranceSettings;
use steelcheck_standards::{DimensionSuggester, RuleTables};
use tracing::debug;

/// Result of one correction pass.
#[derive(Debug, Clone)]
pub struct CorrectionOutcome {
    /// The corrected model.
    pub model: StructureModel,
    /// Audit records, one per processed clash.
    pub corrections: Vec<Correction>,
}

impl CorrectionOutcome {
    /// Number of corrections actually applied.
    pub fn applied_count(&self) -> usize {
        self.corrections.iter().filter(|c| c.is_applied()).count()
    }
}

/// What a strategy did with one clash.
pub(crate) enum Repair {
    /// The model was edited.
    Changed(Option<CorrectionChange>),
    /// The model already conformed; nothing was edited.
    Unchanged,
    /// No deterministic strategy exists.
    Unavailable(String),
}

/// Apply category-specific repairs for every CRITICAL, MAJOR, and
/// MODERATE clash, in that order.
pub fn correct(
    clashes: &[Clash],
    model: &StructureModel,
    tables: &RuleTables,
    tolerances: &ToleranceSettings,
    suggester: Option<&dyn DimensionSuggester>,
) -> CorrectionOutcome {
    let mut corrected = model.clone();
    let mut corrections = Vec::new();
    let mut next_id: u64 = 1;

    let mut ordered: Vec<&Clash> = clashes.iter().collect();
    ordered.sort_by(|a, b| {
        (a.severity, a.category, &a.subjects, a.id).cmp(&(b.severity, b.category, &b.subjects, b.id))
    });

    for clash in ordered {
        if clash.severity == Severity::Minor {
            debug!(clash = clash.id, "minor clash logged, not auto-fixed");
            continue;
        }

        let subject = clash.subjects.first().cloned().unwrap_or_default();
        let repair = dispatch(clash, &mut corrected, tables, tolerances, suggester);

        let (action, change, status) = match repair {
            Repair::Changed(change) => (
                strategies::action_name(clash.category).to_string(),
                change,
                CorrectionStatus::Applied,
            ),
            Repair::Unchanged => {
                debug!(clash = clash.id, "subject already conformant");
                (
                    strategies::action_name(clash.category).to_string(),
                    None,
                    CorrectionStatus::Unchanged,
                )
            }
            Repair::Unavailable(reason) => {
                debug!(clash = clash.id, %reason, "no correction strategy");
                (
                    "manual review".to_string(),
                    None,
                    CorrectionStatus::Failed { reason },
                )
            }
        };

        corrections.push(Correction {
            id: next_id,
            clash_id: clash.id,
            subject,
            action,
            change,
            status,
        });
        next_id += 1;
    }

    CorrectionOutcome {
        model: corrected,
        corrections,
    }
}

fn dispatch(
    clash: &Clash,
    model: &mut StructureModel,
    tables: &RuleTables,
    tolerances: &ToleranceSettings,
    suggester: Option<&dyn DimensionSuggester>,
) -> Repair {
    match clash.category {
        ClashCategory::BasePlateElevation => {
            strategies::fix_elevation(clash, model, tolerances)
        }
        ClashCategory::BoltPosition | ClashCategory::BoltSpacing => {
            strategies::fix_bolt_grid(clash, model, tables)
        }
        ClashCategory::Undersized => strategies::fix_undersized(clash, model, tables, suggester),
        ClashCategory::PlateAlignment => strategies::fix_alignment(clash, model),
        ClashCategory::Anchorage => strategies::fix_anchorage(clash, model, tables, suggester),
        ClashCategory::StructuralLogic => strategies::fix_orphan(clash, model, tables),
        ClashCategory::Geometric
        | ClashCategory::MissingWeld
        | ClashCategory::MemberGeometry
        | ClashCategory::Eccentricity => Repair::Unavailable(format!(
            "no deterministic strategy for {:?} clashes",
            clash.category
        )),
    }
}

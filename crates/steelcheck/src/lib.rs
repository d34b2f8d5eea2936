#![warn(missing_docs)]

//! Connection geometry resolution and clash correction for structural
//! steel models.
//!
//! The pipeline takes one structure's members, optional upstream joints,
//! and synthesized connection elements, and runs five stages: joint
//! resolution, element-to-joint mapping, clash detection, severity-ordered
//! correction, and re-detection. Correction and re-detection repeat until
//! the model is clean, no fix applies, or the pass limit is reached; the
//! final [`PipelineReport`] carries the corrected model, the remaining
//! clashes, and the full correction audit trail.
//!
//! Broken input (duplicate or dangling ids) fails the structure's run
//! with [`PipelineError`]. Everything else — degenerate members,
//! unfixable clashes, hitting the pass limit — is reported as data, so a
//! batch never stops on one bad structure.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use steelcheck_correct::{correct, CorrectionOutcome};
pub use steelcheck_detect::{detect, ClashReport, ClashSummary};
pub use steelcheck_model::{
    Clash, ClashCategory, ConnectionCategory, ConnectionElement, Correction, CorrectionChange,
    CorrectionStatus, ElementKind, Joint, JointProvenance, Member, MemberRole, ModelError,
    Point3D, Profile, Severity, StructureModel,
};
pub use steelcheck_resolve::{map_elements, resolve, ResolveError, ToleranceSettings};
pub use steelcheck_standards::{DimensionSuggester, RuleTables, SizeCategory, TableSuggester};

/// Errors that abort one structure's pipeline run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The input id graph is broken: duplicate or dangling references.
    #[error("data integrity violation: {0}")]
    DataIntegrity(#[from] ModelError),
    /// The pipeline settings failed validation.
    #[error("invalid pipeline settings: {0}")]
    InvalidSettings(String),
}

impl From<ResolveError> for PipelineError {
    fn from(err: ResolveError) -> Self {
        Self::InvalidSettings(err.to_string())
    }
}

/// Pipeline configuration: tolerances, rule tables, and the pass limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Resolution and deviation tolerances.
    pub tolerances: ToleranceSettings,
    /// Standards tables for detection and size selection.
    pub tables: RuleTables,
    /// Maximum number of correct-then-redetect passes.
    pub max_correction_passes: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tolerances: ToleranceSettings::default(),
            tables: RuleTables::default(),
            max_correction_passes: 3,
        }
    }
}

impl PipelineSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.tolerances.validate()?;
        if self.max_correction_passes == 0 {
            return Err(PipelineError::InvalidSettings(
                "max_correction_passes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One structure's raw input, as exported by the upstream CAD model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureInput {
    /// Structure identifier, carried through to the report.
    pub id: String,
    /// Structural members.
    pub members: Vec<Member>,
    /// Upstream joints, possibly empty or degenerate; the resolver
    /// validates or replaces them.
    pub joints: Vec<Joint>,
    /// Synthesized connection elements.
    pub elements: Vec<ConnectionElement>,
}

/// How the correct-then-redetect loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convergence {
    /// No clash remains.
    Clean,
    /// Clashes remain but none has an automatic fix.
    Stable,
    /// Fixes were still being applied when the pass limit was reached.
    PassLimitReached,
}

/// Final result of one structure's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Structure identifier from the input.
    pub structure_id: String,
    /// The corrected model.
    pub model: StructureModel,
    /// Clashes remaining after the final detection pass.
    pub clashes: ClashReport,
    /// Correction audit trail across all passes. Ids are unique within
    /// the run; each record's `clash_id` refers to the detection pass
    /// that produced it.
    pub corrections: Vec<Correction>,
    /// Members excluded from geometric comparisons as degenerate.
    pub degenerate_members: Vec<String>,
    /// Number of correction passes that ran.
    pub passes_run: usize,
    /// How the correction loop ended.
    pub convergence: Convergence,
}

impl PipelineReport {
    /// Number of corrections that were applied to the model.
    pub fn auto_fixed(&self) -> usize {
        self.corrections.iter().filter(|c| c.is_applied()).count()
    }

    /// Corrections that failed and need a human, in audit order.
    pub fn manual_review(&self) -> impl Iterator<Item = &Correction> {
        self.corrections
            .iter()
            .filter(|c| matches!(c.status, CorrectionStatus::Failed { .. }))
    }
}

/// Run the full pipeline for one structure.
pub fn run(
    input: StructureInput,
    settings: &PipelineSettings,
    suggester: Option<&(dyn DimensionSuggester + Sync)>,
) -> Result<PipelineReport, PipelineError> {
    settings.validate()?;
    let StructureInput {
        id: structure_id,
        members,
        joints,
        elements,
    } = input;
    info!(
        structure = %structure_id,
        members = members.len(),
        elements = elements.len(),
        "pipeline run started"
    );

    // Duplicate and dangling ids are fatal for this structure.
    let mut model = StructureModel::from_parts(members, joints, elements)?;
    model.validate_integrity()?;

    // Stage 1: joint resolution.
    let supplied: Vec<Joint> = model.joints.values().cloned().collect();
    let outcome = resolve(&model.members, &supplied, &settings.tolerances);
    model.joints = outcome.joints;
    let degenerate_members = outcome.degenerate_members;

    // Stage 2: mapping. The mapper owns placement; upstream assignments
    // are recomputed from scratch.
    for element in model.elements.values_mut() {
        element.owning_joint = None;
        element.orphaned = false;
    }
    map_elements(&mut model, &settings.tolerances);

    // Stages 3-5: detect, correct, re-detect. Each severity tier is
    // corrected against a fresh detection pass: a CRITICAL fix often
    // resolves MAJOR findings on the same plate, and those stale records
    // must not drive further repairs.
    let mut report = detect(&model, &settings.tables, &settings.tolerances);
    let mut corrections: Vec<Correction> = Vec::new();
    let mut passes_run = 0;
    let mut last_applied = 0;

    while passes_run < settings.max_correction_passes && !report.is_clean() {
        passes_run += 1;
        last_applied = 0;

        for tier in [Severity::Critical, Severity::Major, Severity::Moderate] {
            let tier_clashes: Vec<Clash> = report
                .clashes
                .iter()
                .filter(|c| c.severity == tier)
                .cloned()
                .collect();
            if tier_clashes.is_empty() {
                continue;
            }
            let outcome = correct(
                &tier_clashes,
                &model,
                &settings.tables,
                &settings.tolerances,
                suggester.map(|s| s as &dyn DimensionSuggester),
            );
            let applied = outcome.applied_count();
            let base = corrections.len() as u64;
            corrections.extend(outcome.corrections.into_iter().map(|mut c| {
                c.id += base;
                c
            }));
            if applied == 0 {
                continue;
            }
            last_applied += applied;
            model = outcome.model;
            report = detect(&model, &settings.tables, &settings.tolerances);
            if report.is_clean() {
                break;
            }
        }

        debug!(
            structure = %structure_id,
            pass = passes_run,
            applied = last_applied,
            "correction pass complete"
        );
        if last_applied == 0 {
            break;
        }
    }

    let convergence = if report.is_clean() {
        Convergence::Clean
    } else if last_applied > 0 {
        warn!(
            structure = %structure_id,
            remaining = report.summary.total,
            "pass limit reached with fixes still applying"
        );
        Convergence::PassLimitReached
    } else {
        Convergence::Stable
    };

    info!(
        structure = %structure_id,
        passes = passes_run,
        remaining = report.summary.total,
        ?convergence,
        "pipeline run finished"
    );
    Ok(PipelineReport {
        structure_id,
        model,
        clashes: report,
        corrections,
        degenerate_members,
        passes_run,
        convergence,
    })
}

/// Run many structures in parallel. Each structure fails or succeeds
/// independently; results are in input order.
pub fn run_batch(
    inputs: Vec<StructureInput>,
    settings: &PipelineSettings,
    suggester: Option<&(dyn DimensionSuggester + Sync)>,
) -> Vec<Result<PipelineReport, PipelineError>> {
    inputs
        .into_par_iter()
        .map(|input| run(input, settings, suggester))
        .collect()
}

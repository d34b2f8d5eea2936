//! Clash findings and correction audit records.

use serde::{Deserialize, Serialize};

use crate::Point3D;

/// Severity of a clash, most urgent first.
///
/// The derived order drives correction processing: CRITICAL, then MAJOR,
/// then MODERATE. MINOR findings are logged, never auto-fixed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Must be fixed before export.
    Critical,
    /// Violates a standard; fix strongly recommended.
    Major,
    /// Deviation worth reviewing.
    Moderate,
    /// Informational.
    Minor,
}

/// Rule category of a clash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ClashCategory {
    /// Member-segment intersection or near-miss.
    Geometric,
    /// Plate frame deviates from its member's axis.
    PlateAlignment,
    /// Base plate not at the bottom of its column.
    BasePlateElevation,
    /// Plate, weld, bolt, or anchor below the standard minimum size.
    Undersized,
    /// No weld where the connection category expects one.
    MissingWeld,
    /// Bolt outside its owning plate's bounds.
    BoltPosition,
    /// Bolt edge distance or spacing below the standard multiple.
    BoltSpacing,
    /// Member span or slenderness outside the code-permitted range.
    MemberGeometry,
    /// Member axis offset from the resolved work point.
    Eccentricity,
    /// Anchor embedment, edge distance, or spacing below code minimums.
    Anchorage,
    /// Referential or dimensional nonsense: orphans, lone joints,
    /// non-positive dimensions, non-finite coordinates.
    StructuralLogic,
}

/// A detected violation.
///
/// Immutable: superseded only by a fresh detection pass, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clash {
    /// Identifier, unique within one detection pass.
    pub id: u64,
    /// Rule category.
    pub category: ClashCategory,
    /// Severity.
    pub severity: Severity,
    /// Ids of the entities involved (elements, members, or joints).
    pub subjects: Vec<String>,
    /// Human-readable description.
    pub description: String,
    /// Numeric deviation from the violated threshold, in the rule's units.
    pub deviation: f64,
    /// Normalized deviation from tolerance, in `[0, 1]`.
    pub confidence: f64,
}

/// The value changed by a correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CorrectionChange {
    /// A position was moved.
    Position {
        /// Position before the fix.
        before: Point3D,
        /// Position after the fix.
        after: Point3D,
    },
    /// A dimension was resized.
    Dimension {
        /// Name of the dimension ("thickness", "diameter", "size", ...).
        name: String,
        /// Value before the fix.
        before: f64,
        /// Value after the fix.
        after: f64,
    },
}

/// Outcome of a correction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CorrectionStatus {
    /// The fix was applied to the model.
    Applied,
    /// The model already conformed; nothing was edited.
    Unchanged,
    /// No deterministic strategy exists; the clash needs manual review.
    Failed {
        /// Why no fix was applied.
        reason: String,
    },
}

/// Immutable audit record of one correction attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Identifier, unique within one pipeline run.
    pub id: u64,
    /// The clash this correction addresses.
    pub clash_id: u64,
    /// Id of the element (or joint) that was edited.
    pub subject: String,
    /// What was done, e.g. "snap base plate to column foot".
    pub action: String,
    /// The value change, when one was applied.
    pub change: Option<CorrectionChange>,
    /// Applied or failed.
    pub status: CorrectionStatus,
}

impl Correction {
    /// True when the fix was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self.status, CorrectionStatus::Applied)
    }
}

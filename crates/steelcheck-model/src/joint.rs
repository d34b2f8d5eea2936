//! Joints: the points where members meet and connect.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Point3D;

/// How the resolver arrived at a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointProvenance {
    /// Supplied by the upstream model and validated against its members.
    Validated,
    /// Recomputed from member-endpoint proximity.
    Inferred,
}

/// Connection category of a joint.
///
/// When a joint qualifies for several categories the most load-critical
/// wins, in fixed order: base-plate, splice, moment, bracing, shear,
/// roof-plate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionCategory {
    /// Column base to foundation.
    BasePlate,
    /// In-line continuation of one member.
    Splice,
    /// Rigid beam-to-column connection.
    Moment,
    /// Connection involving a brace.
    Bracing,
    /// Pinned beam-to-column or beam-to-beam connection.
    Shear,
    /// Column top at roof level.
    RoofPlate,
}

/// A resolved joint.
///
/// Created by the resolver; its position is mutated only by the resolver
/// (position fix) and the corrector (elevation fix).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Joint identifier.
    pub id: String,
    /// Authoritative 3D position (the work point).
    pub position: Point3D,
    /// Ids of the members meeting at this joint.
    pub members: BTreeSet<String>,
    /// Whether the position was validated or inferred.
    pub provenance: JointProvenance,
    /// Connection category.
    pub category: ConnectionCategory,
}

impl Joint {
    /// Create a joint at a position with the given member set.
    pub fn new(
        id: impl Into<String>,
        position: Point3D,
        members: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            members: members.into_iter().collect(),
            provenance: JointProvenance::Inferred,
            category: ConnectionCategory::Shear,
        }
    }

    /// True when the joint references the given member.
    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.contains(member_id)
    }
}

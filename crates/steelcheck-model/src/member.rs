//! Structural members: beams, columns, and braces.

use serde::{Deserialize, Serialize};
use steelcheck_math::{Point3, Vec3, MIN_MEMBER_LENGTH};

use crate::Point3D;

/// Cross-section profile of a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile designation, e.g. "HEA200" or "W12x26".
    pub name: String,
    /// Section depth (bearing dimension along the strong axis).
    pub depth: f64,
    /// Flange width (bearing dimension along the weak axis).
    pub width: f64,
}

impl Profile {
    /// Create a profile from its designation and bearing dimensions.
    pub fn new(name: impl Into<String>, depth: f64, width: f64) -> Self {
        Self {
            name: name.into(),
            depth,
            width,
        }
    }

    /// Smaller of the two bearing dimensions (governs slenderness).
    pub fn min_dimension(&self) -> f64 {
        self.depth.min(self.width)
    }
}

/// Structural role of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Horizontal load-carrying member.
    Beam,
    /// Vertical load-carrying member.
    Column,
    /// Diagonal stability member.
    Brace,
}

/// A structural member between two endpoints.
///
/// Members are immutable after creation; the registry owns them and the
/// rest of the pipeline reads them by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Upstream CAD identifier.
    pub id: String,
    /// Start endpoint.
    pub start: Point3D,
    /// End endpoint.
    pub end: Point3D,
    /// Cross-section profile.
    pub profile: Profile,
    /// Structural role.
    pub role: MemberRole,
}

impl Member {
    /// Member length.
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Centroidal axis as a (non-normalized) vector from start to end.
    pub fn axis(&self) -> Vec3 {
        let s: Point3 = self.start.into();
        let e: Point3 = self.end.into();
        e - s
    }

    /// Both endpoints.
    pub fn endpoints(&self) -> [Point3; 2] {
        [self.start.into(), self.end.into()]
    }

    /// Lowest Z of the two endpoints.
    pub fn min_z(&self) -> f64 {
        self.start.z.min(self.end.z)
    }

    /// Highest Z of the two endpoints.
    pub fn max_z(&self) -> f64 {
        self.start.z.max(self.end.z)
    }

    /// True when the member axis is predominantly vertical.
    pub fn is_vertical(&self) -> bool {
        let axis = self.axis();
        let len = axis.norm();
        len >= MIN_MEMBER_LENGTH && axis.z.abs() / len > 0.7
    }

    /// True for a member too short or malformed to take part in
    /// geometric comparisons.
    pub fn is_degenerate(&self) -> bool {
        !self.start.is_finite() || !self.end.is_finite() || self.length() < MIN_MEMBER_LENGTH
    }
}

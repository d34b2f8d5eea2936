#![warn(missing_docs)]

//! Data model for the steelcheck connection engine.
//!
//! Defines the entities the pipeline passes between stages: members,
//! joints, connection elements, clash findings, and correction records,
//! plus the [`StructureModel`] that owns them. Entities are id-keyed and
//! single-owner; stages receive the model explicitly and never read from
//! ambient state.

mod clash;
mod element;
mod error;
mod joint;
mod member;
mod model;

pub use clash::{Clash, ClashCategory, Correction, CorrectionChange, CorrectionStatus, Severity};
pub use element::{ConnectionElement, ElementKind};
pub use error::ModelError;
pub use joint::{ConnectionCategory, Joint, JointProvenance};
pub use member::{Member, MemberRole, Profile};
pub use model::StructureModel;

use serde::{Deserialize, Serialize};
use steelcheck_math::Point3;

/// A serializable 3D point.
///
/// We use a custom type instead of nalgebra::Point3 to enable serde
/// serialization without requiring nalgebra's serde feature. The wire
/// shape is a `{x, y, z}` object in the model's length units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point3D {
    /// Create a new 3D point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Origin point (0, 0, 0).
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// True if every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Point3D {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<Point3> for Point3D {
    fn from(p: Point3) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl From<Point3D> for Point3 {
    fn from(p: Point3D) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(p: [f64; 3]) -> Self {
        Self {
            x: p[0],
            y: p[1],
            z: p[2],
        }
    }
}

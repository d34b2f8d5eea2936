#![warn(missing_docs)]

//! Joint resolution and connection-element mapping.
//!
//! The resolver determines authoritative joint positions: supplied joints
//! are validated against their members' endpoints, and missing or
//! degenerate joint sets are recomputed from member-endpoint proximity.
//! The mapper then assigns each connection element to its joint via a
//! deterministic overlap-and-distance score.

mod joints;
mod mapping;

pub use joints::{classify_joint, resolve, ResolveOutcome};
pub use mapping::map_elements;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the resolver and mapper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Settings failed validation.
    #[error("invalid tolerance settings: {0}")]
    InvalidSettings(String),
}

/// Tolerances for resolution, mapping, and the deviation rules.
///
/// Defaults are standards-derived for millimeter models; whether they
/// should vary per jurisdiction is a per-project call, so every value is
/// overridable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSettings {
    /// Member-endpoint proximity tolerance: endpoints closer than this
    /// meet at a joint, and supplied joints must have each listed
    /// member's endpoint within this distance. Also the merge radius for
    /// inferred joint candidates.
    pub endpoint_tolerance: f64,
    /// Radius within which an element's position counts as a positional
    /// relationship to a joint.
    pub element_attach_radius: f64,
    /// Base-plate elevation tolerance against the column foot.
    pub elevation_tolerance: f64,
    /// Plate-to-member angular deviation threshold, degrees.
    pub alignment_angle_deg: f64,
    /// Plate-to-member translational deviation threshold.
    pub alignment_offset: f64,
    /// Work-point eccentricity threshold.
    pub eccentricity_tolerance: f64,
}

impl Default for ToleranceSettings {
    fn default() -> Self {
        Self {
            endpoint_tolerance: steelcheck_math::ENDPOINT_TOLERANCE,
            element_attach_radius: 500.0,
            elevation_tolerance: 5.0,
            alignment_angle_deg: 5.0,
            alignment_offset: 10.0,
            eccentricity_tolerance: 25.0,
        }
    }
}

impl ToleranceSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.endpoint_tolerance <= 0.0 {
            return Err(ResolveError::InvalidSettings(
                "endpoint_tolerance must be positive".into(),
            ));
        }
        if self.element_attach_radius <= 0.0 {
            return Err(ResolveError::InvalidSettings(
                "element_attach_radius must be positive".into(),
            ));
        }
        if self.elevation_tolerance <= 0.0 {
            return Err(ResolveError::InvalidSettings(
                "elevation_tolerance must be positive".into(),
            ));
        }
        if self.alignment_angle_deg <= 0.0 || self.alignment_angle_deg >= 90.0 {
            return Err(ResolveError::InvalidSettings(
                "alignment_angle_deg must be in (0, 90)".into(),
            ));
        }
        Ok(())
    }
}

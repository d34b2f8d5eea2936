//! Connection elements: plates, bolts, welds, and anchors.

use serde::{Deserialize, Serialize};

use crate::Point3D;

/// Kind-specific dimensional attributes of a connection element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A connection or base plate.
    Plate {
        /// Plate thickness.
        thickness: f64,
        /// Plan width (local u extent).
        width: f64,
        /// Plan height (local v extent).
        height: f64,
    },
    /// A bolt.
    Bolt {
        /// Nominal bolt diameter.
        diameter: f64,
        /// Bolt length.
        length: f64,
    },
    /// A weld.
    Weld {
        /// Weld leg size.
        size: f64,
        /// Weld length.
        length: f64,
    },
    /// A foundation anchor rod.
    Anchor {
        /// Nominal anchor diameter.
        diameter: f64,
        /// Embedment depth into the foundation.
        embedment: f64,
    },
}

impl ElementKind {
    /// Short lowercase name of the kind, for descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Plate { .. } => "plate",
            ElementKind::Bolt { .. } => "bolt",
            ElementKind::Weld { .. } => "weld",
            ElementKind::Anchor { .. } => "anchor",
        }
    }

    /// All dimensional attributes, for positivity checks.
    pub fn dimensions(&self) -> Vec<f64> {
        match *self {
            ElementKind::Plate {
                thickness,
                width,
                height,
            } => vec![thickness, width, height],
            ElementKind::Bolt { diameter, length } => vec![diameter, length],
            ElementKind::Weld { size, length } => vec![size, length],
            ElementKind::Anchor {
                diameter,
                embedment,
            } => vec![diameter, embedment],
        }
    }
}

/// A physical element realizing a joint.
///
/// Created upstream; the mapper owns placement (`owning_joint`,
/// `orphaned`) and the corrector owns dimension/position edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionElement {
    /// Upstream identifier.
    pub id: String,
    /// Kind and dimensions.
    pub kind: ElementKind,
    /// Position (plate center, bolt center, weld start, anchor head).
    pub position: Point3D,
    /// Orientation normal, when the upstream synthesis provided one.
    /// For plates this is the plate normal (nominally the member axis).
    pub orientation: Option<Point3D>,
    /// Material grade designation, e.g. "S355" or "A325".
    pub grade: String,
    /// Member ids this element connects.
    pub members: Vec<String>,
    /// Id of the joint this element realizes; assigned by the mapper.
    pub owning_joint: Option<String>,
    /// Parent element (bolt -> plate, anchor -> plate).
    pub parent: Option<String>,
    /// Set by the mapper when no joint could be justified.
    pub orphaned: bool,
}

impl ConnectionElement {
    /// Create an element with no placement yet.
    pub fn new(id: impl Into<String>, kind: ElementKind, position: Point3D) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            orientation: None,
            grade: String::new(),
            members: Vec::new(),
            owning_joint: None,
            parent: None,
            orphaned: false,
        }
    }

    /// Plate half-extents `(half_width, half_height)`, if this is a plate.
    pub fn plate_half_extents(&self) -> Option<(f64, f64)> {
        match self.kind {
            ElementKind::Plate { width, height, .. } => Some((width * 0.5, height * 0.5)),
            _ => None,
        }
    }

    /// True if this element is a plate.
    pub fn is_plate(&self) -> bool {
        matches!(self.kind, ElementKind::Plate { .. })
    }

    /// True if this element is a weld.
    pub fn is_weld(&self) -> bool {
        matches!(self.kind, ElementKind::Weld { .. })
    }
}

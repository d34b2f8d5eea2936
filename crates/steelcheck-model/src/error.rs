//! Error types for the structure model.

use thiserror::Error;

/// Errors raised while building or validating a structure model.
///
/// Integrity variants are fatal for the one structure being processed:
/// the reference graph cannot be safely repaired, so the run halts.
/// Everything recoverable (degenerate geometry, missing strategies) is
/// reported as clash/correction data instead of an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An element references a member that does not exist.
    #[error("element {element} references unknown member {member}")]
    MissingMember {
        /// Referencing element id.
        element: String,
        /// Unknown member id.
        member: String,
    },

    /// An element references a joint that does not exist.
    #[error("element {element} references unknown joint {joint}")]
    MissingJoint {
        /// Referencing element id.
        element: String,
        /// Unknown joint id.
        joint: String,
    },

    /// An element references a parent element that does not exist.
    #[error("element {element} references unknown parent element {parent}")]
    MissingParent {
        /// Referencing element id.
        element: String,
        /// Unknown parent element id.
        parent: String,
    },

    /// A joint lists a member that does not exist.
    #[error("joint {joint} lists unknown member {member}")]
    MissingJointMember {
        /// Joint id.
        joint: String,
        /// Unknown member id.
        member: String,
    },

    /// Two entities of the same kind share an id.
    #[error("duplicate {kind} id {id}")]
    DuplicateId {
        /// Entity kind ("member", "joint", "element").
        kind: &'static str,
        /// The duplicated id.
        id: String,
    },
}

//! Structural-logic rules: orphaned elements, under-connected joints,
//! elements mapped to joints that do not connect their members,
//! non-positive dimensions, non-finite coordinates, and degenerate
//! members.

use steelcheck_model::{ClashCategory, Severity};

use crate::DetectPass;

pub(crate) fn check(pass: &mut DetectPass<'_>) {
    let model = pass.model;

    for member in model.members.values() {
        if member.is_degenerate() {
            pass.push(
                ClashCategory::StructuralLogic,
                Severity::Critical,
                vec![member.id.clone()],
                format!(
                    "member {} is degenerate (zero length or non-finite endpoint)",
                    member.id
                ),
                0.0,
                0.0,
            );
        }
    }

    for joint in model.joints.values() {
        if !joint.position.is_finite() {
            pass.push(
                ClashCategory::StructuralLogic,
                Severity::Critical,
                vec![joint.id.clone()],
                format!("joint {} has a non-finite position", joint.id),
                0.0,
                0.0,
            );
        }
        if joint.members.len() < 2 {
            pass.push(
                ClashCategory::StructuralLogic,
                Severity::Critical,
                vec![joint.id.clone()],
                format!(
                    "joint {} connects {} member(s); at least 2 required",
                    joint.id,
                    joint.members.len()
                ),
                0.0,
                0.0,
            );
        }
    }

    for element in model.elements.values() {
        if element.orphaned {
            pass.push(
                ClashCategory::StructuralLogic,
                Severity::Critical,
                vec![element.id.clone()],
                format!(
                    "orphan {} {}: no member overlap or positional relation to any joint",
                    element.kind.name(),
                    element.id
                ),
                0.0,
                0.0,
            );
        }
        if !element.position.is_finite() {
            pass.push(
                ClashCategory::StructuralLogic,
                Severity::Critical,
                vec![element.id.clone()],
                format!("{} {} has a non-finite position", element.kind.name(), element.id),
                0.0,
                0.0,
            );
        }
        // Every member an element references must be connected at its
        // owning joint; a partial-overlap assignment is inconsistent.
        if let Some(joint) = element
            .owning_joint
            .as_deref()
            .and_then(|id| model.joints.get(id))
        {
            let uncovered: Vec<String> = element
                .members
                .iter()
                .filter(|m| !joint.has_member(m))
                .cloned()
                .collect();
            if !uncovered.is_empty() {
                pass.push(
                    ClashCategory::StructuralLogic,
                    Severity::Major,
                    vec![element.id.clone(), joint.id.clone()],
                    format!(
                        "{} {} references member(s) {} not connected at joint {}",
                        element.kind.name(),
                        element.id,
                        uncovered.join(", "),
                        joint.id
                    ),
                    uncovered.len() as f64,
                    0.0,
                );
            }
        }
        for dim in element.kind.dimensions() {
            if !(dim > 0.0) || !dim.is_finite() {
                pass.push(
                    ClashCategory::StructuralLogic,
                    Severity::Critical,
                    vec![element.id.clone()],
                    format!(
                        "{} {} has a non-positive dimension ({})",
                        element.kind.name(),
                        element.id,
                        dim
                    ),
                    0.0,
                    0.0,
                );
                break;
            }
        }
    }
}

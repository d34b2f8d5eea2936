//! Connection-element mapping: assign each plate, bolt, weld, and anchor
//! to the joint it realizes.

use steelcheck_math::distance;
use steelcheck_model::StructureModel;
use tracing::debug;

use crate::ToleranceSettings;

/// Assign every element an owning joint, or mark it orphaned.
///
/// Each (element, joint) pair is scored by the count of the element's
/// referenced member ids present in the joint's member set, plus an
/// inverse-distance term when the element sits within the attach radius
/// of the joint. Ties break by minimum distance, then ascending joint
/// id, so the assignment is deterministic. Elements with zero member
/// overlap and no positional relation to any joint are marked orphaned
/// rather than force-assigned; children (bolt on a plate, anchor on a
/// plate) follow their parent's joint.
pub fn map_elements(model: &mut StructureModel, settings: &ToleranceSettings) {
    // Parents first so children can inherit their placement.
    let mut ordered: Vec<String> = model
        .elements
        .values()
        .filter(|e| e.parent.is_none())
        .map(|e| e.id.clone())
        .collect();
    ordered.extend(
        model
            .elements
            .values()
            .filter(|e| e.parent.is_some())
            .map(|e| e.id.clone()),
    );

    for id in &ordered {
        let element = &model.elements[id];

        if let Some(parent_id) = element.parent.clone() {
            let (joint, orphaned) = match model.elements.get(&parent_id) {
                Some(parent) => (parent.owning_joint.clone(), parent.orphaned),
                None => (None, true),
            };
            let Some(element) = model.elements.get_mut(id) else {
                continue;
            };
            element.owning_joint = joint;
            element.orphaned = orphaned;
            continue;
        }

        let position = element.position;
        let mut best: Option<(f64, f64, String)> = None;
        let mut any_relation = false;

        for joint in model.joints.values() {
            let overlap = element
                .members
                .iter()
                .filter(|m| joint.has_member(m))
                .count();
            let d = if position.is_finite() {
                distance(&position.into(), &joint.position.into())
            } else {
                f64::INFINITY
            };
            let positional = d <= settings.element_attach_radius;
            if overlap == 0 && !positional {
                continue;
            }
            any_relation = true;
            let mut score = overlap as f64;
            if positional {
                score += 1.0 / (1.0 + d);
            }
            let better = match &best {
                None => true,
                Some((best_score, best_d, best_id)) => {
                    score > *best_score
                        || (score == *best_score && d < *best_d)
                        || (score == *best_score && d == *best_d && joint.id < *best_id)
                }
            };
            if better {
                best = Some((score, d, joint.id.clone()));
            }
        }

        let Some(element) = model.elements.get_mut(id) else {
            continue;
        };
        match best {
            Some((_, _, joint_id)) if any_relation => {
                element.owning_joint = Some(joint_id);
                element.orphaned = false;
            }
            _ => {
                debug!(element = %element.id, "element has no joint relation, marking orphaned");
                element.owning_joint = None;
                element.orphaned = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelcheck_model::{
        ConnectionElement, ElementKind, Joint, Member, MemberRole, Point3D, Profile,
    };

    fn column(id: &str) -> Member {
        Member {
            id: id.into(),
            start: Point3D::ORIGIN,
            end: Point3D::new(0.0, 0.0, 3000.0),
            profile: Profile::new("HEA200", 190.0, 200.0),
            role: MemberRole::Column,
        }
    }

    fn plate(id: &str, position: Point3D) -> ConnectionElement {
        ConnectionElement::new(
            id,
            ElementKind::Plate {
                thickness: 20.0,
                width: 300.0,
                height: 300.0,
            },
            position,
        )
    }

    fn model_with_joints() -> StructureModel {
        let mut model = StructureModel::from_parts(
            vec![column("C1"), column("C2")],
            vec![],
            vec![],
        )
        .unwrap();
        model.joints.insert(
            "J1".into(),
            Joint::new("J1", Point3D::ORIGIN, ["C1".to_string()]),
        );
        model.joints.insert(
            "J2".into(),
            Joint::new("J2", Point3D::new(6000.0, 0.0, 0.0), ["C2".to_string()]),
        );
        model
    }

    #[test]
    fn test_member_overlap_wins_over_distance() {
        let mut model = model_with_joints();
        // Plate references C2 but sits nearer J1.
        let mut p = plate("P1", Point3D::new(100.0, 0.0, 0.0));
        p.members.push("C2".into());
        model.elements.insert("P1".into(), p);

        map_elements(&mut model, &ToleranceSettings::default());
        assert_eq!(
            model.elements["P1"].owning_joint.as_deref(),
            Some("J2")
        );
    }

    #[test]
    fn test_positional_fallback_without_member_refs() {
        let mut model = model_with_joints();
        model
            .elements
            .insert("P1".into(), plate("P1", Point3D::new(10.0, 0.0, 0.0)));

        map_elements(&mut model, &ToleranceSettings::default());
        assert_eq!(
            model.elements["P1"].owning_joint.as_deref(),
            Some("J1")
        );
        assert!(!model.elements["P1"].orphaned);
    }

    #[test]
    fn test_unrelated_element_marked_orphaned() {
        let mut model = model_with_joints();
        // A bolt far from every joint, no member refs.
        let bolt = ConnectionElement::new(
            "B1",
            ElementKind::Bolt {
                diameter: 20.0,
                length: 60.0,
            },
            Point3D::new(-56.0, -56.0, -9000.0),
        );
        model.elements.insert("B1".into(), bolt);

        map_elements(&mut model, &ToleranceSettings::default());
        assert!(model.elements["B1"].orphaned);
        assert!(model.elements["B1"].owning_joint.is_none());
    }

    #[test]
    fn test_child_inherits_parent_joint() {
        let mut model = model_with_joints();
        let mut p = plate("P1", Point3D::new(10.0, 0.0, 0.0));
        p.members.push("C1".into());
        model.elements.insert("P1".into(), p);
        let mut bolt = ConnectionElement::new(
            "B1",
            ElementKind::Bolt {
                diameter: 20.0,
                length: 60.0,
            },
            Point3D::new(5000.0, 5000.0, 0.0),
        );
        bolt.parent = Some("P1".into());
        model.elements.insert("B1".into(), bolt);

        map_elements(&mut model, &ToleranceSettings::default());
        assert_eq!(
            model.elements["B1"].owning_joint.as_deref(),
            Some("J1")
        );
    }
}

//! The structure model: single owner of all entities for one run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Clash, ConnectionElement, Joint, Member, ModelError};

/// All entities of one structure, id-keyed for deterministic iteration.
///
/// Acts as the member registry: raw member records are normalized into
/// the id-keyed map on construction. The model is passed explicitly
/// between pipeline stages; each stage mutates only the entities it owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureModel {
    /// Members by id. Immutable after construction.
    pub members: BTreeMap<String, Member>,
    /// Joints by id. Written by the resolver and the corrector.
    pub joints: BTreeMap<String, Joint>,
    /// Connection elements by id. Written by the mapper and the corrector.
    pub elements: BTreeMap<String, ConnectionElement>,
}

impl StructureModel {
    /// Normalize raw records into a model, rejecting duplicate ids.
    pub fn from_parts(
        members: Vec<Member>,
        joints: Vec<Joint>,
        elements: Vec<ConnectionElement>,
    ) -> Result<Self, ModelError> {
        let mut model = Self::default();
        for m in members {
            if model.members.insert(m.id.clone(), m.clone()).is_some() {
                return Err(ModelError::DuplicateId {
                    kind: "member",
                    id: m.id,
                });
            }
        }
        for j in joints {
            if model.joints.insert(j.id.clone(), j.clone()).is_some() {
                return Err(ModelError::DuplicateId {
                    kind: "joint",
                    id: j.id,
                });
            }
        }
        for e in elements {
            if model.elements.insert(e.id.clone(), e.clone()).is_some() {
                return Err(ModelError::DuplicateId {
                    kind: "element",
                    id: e.id,
                });
            }
        }
        Ok(model)
    }

    /// Check referential integrity of the id graph.
    ///
    /// Every element's member, joint, and parent references and every
    /// joint's member set must point at existing entities. The first
    /// violation is returned; a broken graph aborts the structure's run.
    pub fn validate_integrity(&self) -> Result<(), ModelError> {
        for joint in self.joints.values() {
            for member_id in &joint.members {
                if !self.members.contains_key(member_id) {
                    return Err(ModelError::MissingJointMember {
                        joint: joint.id.clone(),
                        member: member_id.clone(),
                    });
                }
            }
        }
        for element in self.elements.values() {
            for member_id in &element.members {
                if !self.members.contains_key(member_id) {
                    return Err(ModelError::MissingMember {
                        element: element.id.clone(),
                        member: member_id.clone(),
                    });
                }
            }
            if let Some(joint_id) = &element.owning_joint {
                if !self.joints.contains_key(joint_id) {
                    return Err(ModelError::MissingJoint {
                        element: element.id.clone(),
                        joint: joint_id.clone(),
                    });
                }
            }
            if let Some(parent_id) = &element.parent {
                if !self.elements.contains_key(parent_id) {
                    return Err(ModelError::MissingParent {
                        element: element.id.clone(),
                        parent: parent_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Elements owned by the given joint, in id order.
    pub fn elements_of_joint<'a>(
        &'a self,
        joint_id: &'a str,
    ) -> impl Iterator<Item = &'a ConnectionElement> {
        self.elements
            .values()
            .filter(move |e| e.owning_joint.as_deref() == Some(joint_id))
    }

    /// Child elements of the given parent element, in id order.
    pub fn children_of<'a>(
        &'a self,
        parent_id: &'a str,
    ) -> impl Iterator<Item = &'a ConnectionElement> {
        self.elements
            .values()
            .filter(move |e| e.parent.as_deref() == Some(parent_id))
    }

    /// Vertical members connected at the given joint, in id order.
    pub fn vertical_members_of_joint<'a>(
        &'a self,
        joint: &'a Joint,
    ) -> impl Iterator<Item = &'a Member> {
        joint
            .members
            .iter()
            .filter_map(move |id| self.members.get(id))
            .filter(|m| m.is_vertical())
    }

    /// Members referenced by a clash subject list, in subject order.
    pub fn subject_members<'a>(&'a self, clash: &'a Clash) -> impl Iterator<Item = &'a Member> {
        clash.subjects.iter().filter_map(move |id| self.members.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementKind, MemberRole, Point3D, Profile};

    fn member(id: &str) -> Member {
        Member {
            id: id.into(),
            start: Point3D::ORIGIN,
            end: Point3D::new(0.0, 0.0, 3000.0),
            profile: Profile::new("HEA200", 190.0, 200.0),
            role: MemberRole::Column,
        }
    }

    fn plate(id: &str) -> ConnectionElement {
        ConnectionElement::new(
            id,
            ElementKind::Plate {
                thickness: 20.0,
                width: 300.0,
                height: 300.0,
            },
            Point3D::ORIGIN,
        )
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let err = StructureModel::from_parts(vec![member("C1"), member("C1")], vec![], vec![])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateId {
                kind: "member",
                id: "C1".into()
            }
        );
    }

    #[test]
    fn test_integrity_catches_unknown_member() {
        let mut e = plate("P1");
        e.members.push("C9".into());
        let model = StructureModel::from_parts(vec![member("C1")], vec![], vec![e]).unwrap();
        let err = model.validate_integrity().unwrap_err();
        assert!(matches!(err, ModelError::MissingMember { .. }));
    }

    #[test]
    fn test_integrity_catches_unknown_joint() {
        let mut e = plate("P1");
        e.owning_joint = Some("J9".into());
        let model = StructureModel::from_parts(vec![member("C1")], vec![], vec![e]).unwrap();
        let err = model.validate_integrity().unwrap_err();
        assert!(matches!(err, ModelError::MissingJoint { .. }));
    }

    #[test]
    fn test_children_lookup() {
        let mut bolt = ConnectionElement::new(
            "B1",
            ElementKind::Bolt {
                diameter: 20.0,
                length: 60.0,
            },
            Point3D::ORIGIN,
        );
        bolt.parent = Some("P1".into());
        let model =
            StructureModel::from_parts(vec![member("C1")], vec![], vec![plate("P1"), bolt])
                .unwrap();
        model.validate_integrity().unwrap();
        let children: Vec<_> = model.children_of("P1").map(|e| e.id.clone()).collect();
        assert_eq!(children, vec!["B1".to_string()]);
    }
}

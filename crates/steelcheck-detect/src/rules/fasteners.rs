//! Fastener rules: bolt placement and sizing, weld presence and sizing,
//! anchor embedment, edge distance, and spacing.

use steelcheck_math::{distance, Frame, Vec3};
use steelcheck_model::{
    ClashCategory, ConnectionCategory, ConnectionElement, ElementKind, Severity, StructureModel,
};

use crate::DetectPass;

/// Local frame of a plate: origin at the plate center, normal from the
/// plate's orientation, or the aligned member's axis, or vertical as the
/// last resort.
pub(crate) fn plate_frame(model: &StructureModel, plate: &ConnectionElement) -> Option<Frame> {
    if !plate.position.is_finite() {
        return None;
    }
    let axis = plate
        .orientation
        .filter(|o| o.is_finite())
        .map(|o| Vec3::new(o.x, o.y, o.z))
        .or_else(|| {
            let joint = model.joints.get(plate.owning_joint.as_deref()?)?;
            let member = super::plates::alignment_member(model, plate, joint)?;
            Some(member.axis())
        })
        .unwrap_or_else(Vec3::z);
    Frame::from_axis(plate.position.into(), axis).or_else(|| {
        // Zero-length orientation data: fall back to a vertical normal.
        Frame::from_axis(plate.position.into(), Vec3::z())
    })
}

pub(crate) fn check(pass: &mut DetectPass<'_>) {
    check_welds(pass);
    check_bolts(pass);
    check_anchors(pass);
}

/// Connection categories that always carry at least one weld.
fn expects_weld(category: ConnectionCategory) -> bool {
    matches!(
        category,
        ConnectionCategory::BasePlate | ConnectionCategory::Moment | ConnectionCategory::Splice
    )
}

fn check_welds(pass: &mut DetectPass<'_>) {
    let model = pass.model;

    for plate in model.elements.values().filter(|e| e.is_plate()) {
        let Some(joint_id) = plate.owning_joint.as_deref() else {
            continue;
        };
        let Some(joint) = model.joints.get(joint_id) else {
            continue;
        };
        if !expects_weld(joint.category) {
            continue;
        }
        let has_weld = model.children_of(&plate.id).any(|e| e.is_weld())
            || model.elements_of_joint(joint_id).any(|e| e.is_weld());
        if !has_weld {
            pass.push(
                ClashCategory::MissingWeld,
                Severity::Major,
                vec![plate.id.clone()],
                format!(
                    "no weld on plate {} at {:?} joint {}",
                    plate.id, joint.category, joint_id
                ),
                1.0,
                1.0,
            );
        }
    }

    // Weld size against the adjoining plate thickness.
    for weld in pass.model.elements.values() {
        let ElementKind::Weld { size, .. } = weld.kind else {
            continue;
        };
        let Some(parent) = weld.parent.as_ref().and_then(|p| pass.model.elements.get(p)) else {
            continue;
        };
        let ElementKind::Plate { thickness, .. } = parent.kind else {
            continue;
        };
        let min_size = pass.tables.min_weld_size(thickness);
        if size < min_size {
            pass.push(
                ClashCategory::Undersized,
                Severity::Major,
                vec![weld.id.clone()],
                format!(
                    "weld {} size {:.1} below minimum {:.1} for plate thickness {:.1}",
                    weld.id, size, min_size, thickness
                ),
                min_size - size,
                min_size,
            );
        }
    }
}

fn check_bolts(pass: &mut DetectPass<'_>) {
    let model = pass.model;
    let bolts: Vec<&ConnectionElement> = model
        .elements
        .values()
        .filter(|e| matches!(e.kind, ElementKind::Bolt { .. }))
        .collect();

    for bolt in &bolts {
        let ElementKind::Bolt { diameter, .. } = bolt.kind else {
            unreachable!()
        };

        if !pass.tables.is_standard_bolt(diameter) && diameter > 0.0 {
            let nearest = pass.tables.next_size_up(
                steelcheck_standards::SizeCategory::BoltDiameter,
                diameter,
            );
            pass.push(
                ClashCategory::Undersized,
                Severity::Moderate,
                vec![bolt.id.clone()],
                format!(
                    "bolt {} diameter {:.1} is not a standard size (next standard {:.1})",
                    bolt.id, diameter, nearest
                ),
                nearest - diameter,
                diameter.max(1.0),
            );
        }

        let Some(parent) = bolt.parent.as_ref().and_then(|p| model.elements.get(p)) else {
            continue;
        };
        let Some((half_w, half_h)) = parent.plate_half_extents() else {
            continue;
        };
        let Some(frame) = plate_frame(model, parent) else {
            continue;
        };
        if !bolt.position.is_finite() {
            continue; // structural-logic rule reports it
        }
        let (u, v, _) = frame.project(&bolt.position.into());

        if u.abs() > half_w || v.abs() > half_h {
            let excess = (u.abs() - half_w).max(v.abs() - half_h);
            pass.push(
                ClashCategory::BoltPosition,
                Severity::Critical,
                vec![bolt.id.clone(), parent.id.clone()],
                format!(
                    "bolt {} outside plate {} bounds: offset ({:.1}, {:.1}), half-extents ({:.1}, {:.1})",
                    bolt.id, parent.id, u, v, half_w, half_h
                ),
                excess,
                half_w.min(half_h),
            );
            continue; // edge distance is meaningless out of bounds
        }

        let min_edge = pass.tables.bolt_edge_factor * diameter;
        let edge = (half_w - u.abs()).min(half_h - v.abs());
        if edge < min_edge {
            pass.push(
                ClashCategory::BoltSpacing,
                Severity::Major,
                vec![bolt.id.clone(), parent.id.clone()],
                format!(
                    "bolt {} edge distance {:.1} below minimum {:.1} ({}d)",
                    bolt.id, edge, min_edge, pass.tables.bolt_edge_factor
                ),
                min_edge - edge,
                min_edge,
            );
        }
    }

    // Pairwise spacing between bolts sharing a plate.
    for (i, a) in bolts.iter().enumerate() {
        for b in bolts.iter().skip(i + 1) {
            if a.parent.is_none() || a.parent != b.parent {
                continue;
            }
            if !a.position.is_finite() || !b.position.is_finite() {
                continue;
            }
            let (ElementKind::Bolt { diameter: da, .. }, ElementKind::Bolt { diameter: db, .. }) =
                (&a.kind, &b.kind)
            else {
                continue;
            };
            let min_spacing = pass.tables.bolt_spacing_factor * da.max(*db);
            let d = distance(&a.position.into(), &b.position.into());
            if d < min_spacing {
                pass.push(
                    ClashCategory::BoltSpacing,
                    Severity::Major,
                    vec![a.id.clone(), b.id.clone()],
                    format!(
                        "bolts {} and {} spaced {:.1} apart, minimum {:.1} ({}d)",
                        a.id, b.id, d, min_spacing, pass.tables.bolt_spacing_factor
                    ),
                    min_spacing - d,
                    min_spacing,
                );
            }
        }
    }
}

fn check_anchors(pass: &mut DetectPass<'_>) {
    let model = pass.model;
    let anchors: Vec<&ConnectionElement> = model
        .elements
        .values()
        .filter(|e| matches!(e.kind, ElementKind::Anchor { .. }))
        .collect();

    for anchor in &anchors {
        let ElementKind::Anchor { embedment, .. } = anchor.kind else {
            unreachable!()
        };

        let min_embedment = pass.tables.anchor_min_embedment;
        if embedment < min_embedment && embedment > 0.0 {
            pass.push(
                ClashCategory::Anchorage,
                Severity::Critical,
                vec![anchor.id.clone()],
                format!(
                    "anchor {} embedment {:.0} below code minimum {:.0}",
                    anchor.id, embedment, min_embedment
                ),
                min_embedment - embedment,
                min_embedment,
            );
        }

        // Edge distance within the owning plate.
        let Some(parent) = anchor.parent.as_ref().and_then(|p| model.elements.get(p)) else {
            continue;
        };
        let Some((half_w, half_h)) = parent.plate_half_extents() else {
            continue;
        };
        let Some(frame) = plate_frame(model, parent) else {
            continue;
        };
        if !anchor.position.is_finite() {
            continue;
        }
        let (u, v, _) = frame.project(&anchor.position.into());
        let edge = (half_w - u.abs()).min(half_h - v.abs());
        let min_edge = pass.tables.anchor_min_edge;
        if edge < min_edge {
            pass.push(
                ClashCategory::Anchorage,
                Severity::Major,
                vec![anchor.id.clone(), parent.id.clone()],
                format!(
                    "anchor {} edge distance {:.0} below code minimum {:.0}",
                    anchor.id, edge, min_edge
                ),
                min_edge - edge,
                min_edge,
            );
        }
    }

    for (i, a) in anchors.iter().enumerate() {
        for b in anchors.iter().skip(i + 1) {
            if a.parent.is_none() || a.parent != b.parent {
                continue;
            }
            if !a.position.is_finite() || !b.position.is_finite() {
                continue;
            }
            let d = distance(&a.position.into(), &b.position.into());
            let min_spacing = pass.tables.anchor_min_spacing;
            if d < min_spacing {
                pass.push(
                    ClashCategory::Anchorage,
                    Severity::Major,
                    vec![a.id.clone(), b.id.clone()],
                    format!(
                        "anchors {} and {} spaced {:.0} apart, code minimum {:.0}",
                        a.id, b.id, d, min_spacing
                    ),
                    min_spacing - d,
                    min_spacing,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::detect;
    use steelcheck_model::{
        ClashCategory, ConnectionCategory, ConnectionElement, ElementKind, Joint, Member,
        MemberRole, Point3D, Profile, Severity, StructureModel,
    };
    use steelcheck_resolve::ToleranceSettings;
    use steelcheck_standards::RuleTables;

    fn column(id: &str) -> Member {
        Member {
            id: id.into(),
            start: Point3D::ORIGIN,
            end: Point3D::new(0.0, 0.0, 3000.0),
            profile: Profile::new("HEA200", 190.0, 200.0),
            role: MemberRole::Column,
        }
    }

    fn base_joint() -> Joint {
        let mut joint = Joint::new("J1", Point3D::ORIGIN, ["C1".to_string()]);
        joint.category = ConnectionCategory::BasePlate;
        joint
    }

    fn plate() -> ConnectionElement {
        let mut plate = ConnectionElement::new(
            "P1",
            ElementKind::Plate {
                thickness: 20.0,
                width: 300.0,
                height: 300.0,
            },
            Point3D::ORIGIN,
        );
        plate.members.push("C1".into());
        plate.owning_joint = Some("J1".into());
        plate
    }

    fn bolt(id: &str, x: f64, y: f64) -> ConnectionElement {
        let mut bolt = ConnectionElement::new(
            id,
            ElementKind::Bolt {
                diameter: 20.0,
                length: 60.0,
            },
            Point3D::new(x, y, 0.0),
        );
        bolt.parent = Some("P1".into());
        bolt.owning_joint = Some("J1".into());
        bolt
    }

    fn weld(id: &str) -> ConnectionElement {
        let mut weld = ConnectionElement::new(
            id,
            ElementKind::Weld {
                size: 6.0,
                length: 200.0,
            },
            Point3D::ORIGIN,
        );
        weld.parent = Some("P1".into());
        weld.owning_joint = Some("J1".into());
        weld
    }

    fn run(elements: Vec<ConnectionElement>) -> crate::ClashReport {
        let model =
            StructureModel::from_parts(vec![column("C1")], vec![base_joint()], elements).unwrap();
        detect(&model, &RuleTables::default(), &ToleranceSettings::default())
    }

    #[test]
    fn test_missing_weld_on_base_plate() {
        let report = run(vec![plate()]);
        let clash = report
            .of_category(ClashCategory::MissingWeld)
            .next()
            .expect("missing weld clash");
        assert_eq!(clash.severity, Severity::Major);
    }

    #[test]
    fn test_weld_present_no_clash() {
        let report = run(vec![plate(), weld("W1")]);
        assert_eq!(report.of_category(ClashCategory::MissingWeld).count(), 0);
    }

    #[test]
    fn test_undersized_weld() {
        let mut w = weld("W1");
        w.kind = ElementKind::Weld {
            size: 3.0,
            length: 200.0,
        };
        // Parent plate is 20mm thick: minimum weld is 6mm.
        let report = run(vec![plate(), w]);
        let clash = report
            .of_category(ClashCategory::Undersized)
            .next()
            .expect("undersized weld");
        assert_eq!(clash.subjects, vec!["W1".to_string()]);
        assert!((clash.deviation - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bolt_out_of_bounds_critical() {
        // Plate is 300x300 centered at origin: half-extents 150.
        let report = run(vec![plate(), weld("W1"), bolt("B1", 400.0, 0.0)]);
        let clash = report
            .of_category(ClashCategory::BoltPosition)
            .next()
            .expect("out of bounds bolt");
        assert_eq!(clash.severity, Severity::Critical);
        assert!((clash.deviation - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_bolt_edge_distance() {
        // 5 from the edge; minimum is 1.5 * 20 = 30.
        let report = run(vec![plate(), weld("W1"), bolt("B1", 145.0, 0.0)]);
        let clash = report
            .of_category(ClashCategory::BoltSpacing)
            .next()
            .expect("edge distance clash");
        assert_eq!(clash.severity, Severity::Major);
    }

    #[test]
    fn test_bolt_spacing() {
        // 20 apart; minimum is 3 * 20 = 60.
        let report = run(vec![
            plate(),
            weld("W1"),
            bolt("B1", -10.0, 0.0),
            bolt("B2", 10.0, 0.0),
        ]);
        let spacing: Vec<_> = report
            .of_category(ClashCategory::BoltSpacing)
            .filter(|c| c.subjects.len() == 2 && c.subjects.contains(&"B2".to_string()))
            .collect();
        assert_eq!(spacing.len(), 1);
    }

    #[test]
    fn test_well_placed_bolts_clean() {
        let report = run(vec![
            plate(),
            weld("W1"),
            bolt("B1", -75.0, -75.0),
            bolt("B2", 75.0, 75.0),
        ]);
        assert_eq!(report.of_category(ClashCategory::BoltPosition).count(), 0);
        assert_eq!(report.of_category(ClashCategory::BoltSpacing).count(), 0);
    }

    #[test]
    fn test_shallow_anchor_critical() {
        let mut anchor = ConnectionElement::new(
            "A1",
            ElementKind::Anchor {
                diameter: 24.0,
                embedment: 100.0,
            },
            Point3D::new(75.0, 75.0, 0.0),
        );
        anchor.parent = Some("P1".into());
        anchor.owning_joint = Some("J1".into());
        let report = run(vec![plate(), weld("W1"), anchor]);
        let clash = report
            .of_category(ClashCategory::Anchorage)
            .next()
            .expect("embedment clash");
        assert_eq!(clash.severity, Severity::Critical);
    }
}

//! Plate rules: alignment with the owning member's axis, base-plate
//! elevation, and base-plate minimum sizes.

use steelcheck_math::{angle_between, point_segment_distance, Vec3};
use steelcheck_model::{
    ClashCategory, ConnectionCategory, ConnectionElement, ElementKind, Joint, Member, Severity,
    StructureModel,
};

use crate::DetectPass;

/// The member a plate is aligned against: the first of the plate's
/// referenced members present at the joint, falling back to the joint's
/// first member.
pub(crate) fn alignment_member<'a>(
    model: &'a StructureModel,
    plate: &ConnectionElement,
    joint: &Joint,
) -> Option<&'a Member> {
    plate
        .members
        .iter()
        .filter(|m| joint.has_member(m))
        .chain(joint.members.iter())
        .filter_map(|id| model.members.get(id))
        .find(|m| !m.is_degenerate())
}

pub(crate) fn check(pass: &mut DetectPass<'_>) {
    let plates: Vec<ConnectionElement> = pass
        .model
        .elements
        .values()
        .filter(|e| e.is_plate())
        .cloned()
        .collect();

    for plate in &plates {
        let Some(joint_id) = &plate.owning_joint else {
            continue;
        };
        let Some(joint) = pass.model.joints.get(joint_id) else {
            continue;
        };

        check_alignment(pass, plate, joint);
        if joint.category == ConnectionCategory::BasePlate {
            check_base_plate(pass, plate, joint);
        }
    }
}

fn check_alignment(pass: &mut DetectPass<'_>, plate: &ConnectionElement, joint: &Joint) {
    let Some(member) = alignment_member(pass.model, plate, joint) else {
        return;
    };

    // Angular deviation between the plate normal and the member axis,
    // sign-agnostic (a flipped normal is the same plane).
    if let Some(orientation) = plate.orientation {
        let normal = Vec3::new(orientation.x, orientation.y, orientation.z);
        let mut angle = angle_between(&normal, &member.axis()).to_degrees();
        if angle > 90.0 {
            angle = 180.0 - angle;
        }
        let threshold = pass.tol.alignment_angle_deg;
        if angle > threshold {
            let severity = if angle > 3.0 * threshold {
                Severity::Major
            } else {
                Severity::Moderate
            };
            let description = format!(
                "plate {} normal deviates {:.1} deg from member {} axis (limit {:.1} deg)",
                plate.id, angle, member.id, threshold
            );
            pass.push(
                ClashCategory::PlateAlignment,
                severity,
                vec![plate.id.clone(), member.id.clone()],
                description,
                angle - threshold,
                threshold,
            );
        }
    }

    // Translational deviation from the member's centroidal axis.
    let [start, end] = member.endpoints();
    let (offset, _) = point_segment_distance(&plate.position.into(), &start, &end);
    let threshold = pass.tol.alignment_offset;
    if offset > threshold {
        let severity = if offset > 3.0 * threshold {
            Severity::Major
        } else {
            Severity::Moderate
        };
        let member_id = member.id.clone();
        let description = format!(
            "plate {} sits {:.1} off member {} axis (limit {:.1})",
            plate.id, offset, member_id, threshold
        );
        pass.push(
            ClashCategory::PlateAlignment,
            severity,
            vec![plate.id.clone(), member_id],
            description,
            offset - threshold,
            threshold,
        );
    }
}

fn check_base_plate(pass: &mut DetectPass<'_>, plate: &ConnectionElement, joint: &Joint) {
    // Elevation: the plate must sit at the foot of its vertical member(s).
    let expected_z = pass
        .model
        .vertical_members_of_joint(joint)
        .map(Member::min_z)
        .fold(f64::INFINITY, f64::min);
    if expected_z.is_finite() {
        let dz = (plate.position.z - expected_z).abs();
        if dz > pass.tol.elevation_tolerance {
            let tolerance = pass.tol.elevation_tolerance;
            pass.push(
                ClashCategory::BasePlateElevation,
                Severity::Critical,
                vec![plate.id.clone()],
                format!(
                    "base plate {} at wrong elevation: z={:.1}, column foot at z={:.1}",
                    plate.id, plate.position.z, expected_z
                ),
                dz,
                tolerance,
            );
        }
    }

    // Plan size and thickness against the category minimums.
    let ElementKind::Plate {
        thickness,
        width,
        height,
    } = plate.kind
    else {
        return;
    };
    let min_thickness = pass.tables.base_plate_min_thickness;
    if thickness < min_thickness {
        pass.push(
            ClashCategory::Undersized,
            Severity::Major,
            vec![plate.id.clone()],
            format!(
                "base plate {} thickness {:.1} below minimum {:.1}",
                plate.id, thickness, min_thickness
            ),
            min_thickness - thickness,
            min_thickness,
        );
    }
    let min_plan = pass.tables.base_plate_min_plan;
    let plan = width.min(height);
    if plan < min_plan {
        pass.push(
            ClashCategory::Undersized,
            Severity::Major,
            vec![plate.id.clone()],
            format!(
                "base plate {} plan dimension {:.0} below minimum {:.0}",
                plate.id, plan, min_plan
            ),
            min_plan - plan,
            min_plan,
        );
    }
}

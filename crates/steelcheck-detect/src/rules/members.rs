//! Member geometry (span, slenderness) and connection eccentricity.

use steelcheck_math::point_segment_distance;
use steelcheck_model::{ClashCategory, Severity};

use crate::DetectPass;

pub(crate) fn check(pass: &mut DetectPass<'_>) {
    check_member_geometry(pass);
    check_eccentricity(pass);
}

fn check_member_geometry(pass: &mut DetectPass<'_>) {
    let members: Vec<_> = pass
        .model
        .members
        .values()
        .filter(|m| !m.is_degenerate())
        .cloned()
        .collect();

    for member in &members {
        let length = member.length();
        let min_dim = member.profile.min_dimension();

        if min_dim > 0.0 {
            let slenderness = length / min_dim;
            let limit = pass.tables.max_slenderness;
            if slenderness > limit {
                let severity = if slenderness > 1.5 * limit {
                    Severity::Major
                } else {
                    Severity::Moderate
                };
                pass.push(
                    ClashCategory::MemberGeometry,
                    severity,
                    vec![member.id.clone()],
                    format!(
                        "member {} slenderness {:.0} exceeds limit {:.0}",
                        member.id, slenderness, limit
                    ),
                    slenderness - limit,
                    limit,
                );
            }
        }

        let max_span = pass.tables.max_span;
        if length > max_span {
            let severity = if length > 1.5 * max_span {
                Severity::Major
            } else {
                Severity::Moderate
            };
            pass.push(
                ClashCategory::MemberGeometry,
                severity,
                vec![member.id.clone()],
                format!(
                    "member {} span {:.0} exceeds limit {:.0}",
                    member.id, length, max_span
                ),
                length - max_span,
                max_span,
            );
        }
    }
}

fn check_eccentricity(pass: &mut DetectPass<'_>) {
    let model = pass.model;
    let joints: Vec<_> = model.joints.values().cloned().collect();

    for joint in &joints {
        if !joint.position.is_finite() {
            continue; // structural-logic rule reports it
        }
        for member_id in &joint.members {
            let Some(member) = model.members.get(member_id) else {
                continue;
            };
            if member.is_degenerate() {
                continue;
            }
            let [start, end] = member.endpoints();
            let (offset, _) = point_segment_distance(&joint.position.into(), &start, &end);
            let threshold = pass.tol.eccentricity_tolerance;
            if offset > threshold {
                pass.push(
                    ClashCategory::Eccentricity,
                    Severity::Major,
                    vec![joint.id.clone(), member.id.clone()],
                    format!(
                        "member {} axis offset {:.1} from work point of joint {} (limit {:.1})",
                        member.id, offset, joint.id, threshold
                    ),
                    offset - threshold,
                    threshold,
                );
            }
        }
    }
}

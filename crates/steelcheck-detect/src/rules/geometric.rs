//! Member-segment clearance: intersections and near-misses.

use steelcheck_model::{ClashCategory, Severity};

use crate::DetectPass;

pub(crate) fn check(pass: &mut DetectPass<'_>) {
    let members: Vec<_> = pass
        .model
        .members
        .values()
        .filter(|m| !m.is_degenerate())
        .collect();

    for (i, a) in members.iter().enumerate() {
        for b in members.iter().skip(i + 1) {
            // Members meeting at a joint legitimately touch.
            let share_joint = pass
                .model
                .joints
                .values()
                .any(|j| j.has_member(&a.id) && j.has_member(&b.id));
            if share_joint {
                continue;
            }

            let [a0, a1] = a.endpoints();
            let [b0, b1] = b.endpoints();
            let d = steelcheck_math::segment_segment_distance(&a0, &a1, &b0, &b1);

            if d < pass.tables.member_clearance {
                let clearance = pass.tables.member_clearance;
                pass.push(
                    ClashCategory::Geometric,
                    Severity::Critical,
                    vec![a.id.clone(), b.id.clone()],
                    format!(
                        "members {} and {} intersect or overlap: {:.1} apart, clearance {:.1}",
                        a.id, b.id, d, clearance
                    ),
                    clearance - d,
                    clearance,
                );
            } else if d < pass.tables.member_near_miss {
                let near = pass.tables.member_near_miss;
                pass.push(
                    ClashCategory::Geometric,
                    Severity::Major,
                    vec![a.id.clone(), b.id.clone()],
                    format!(
                        "members {} and {} pass within {:.1} (near-miss clearance {:.1})",
                        a.id, b.id, d, near
                    ),
                    near - d,
                    near,
                );
            }
        }
    }
}

//! Joint resolution: validate supplied joints or recompute them from
//! member-endpoint proximity.

use std::collections::{BTreeMap, BTreeSet};

use steelcheck_math::{distance, midpoint, Point3};
use steelcheck_model::{
    ConnectionCategory, Joint, JointProvenance, Member, MemberRole, Point3D,
};
use tracing::{debug, warn};

use crate::ToleranceSettings;

/// Result of joint resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    /// Resolved joints by id.
    pub joints: BTreeMap<String, Joint>,
    /// Members excluded from geometric comparisons as degenerate;
    /// the detector reports these as structural-logic clashes.
    pub degenerate_members: Vec<String>,
}

/// Determine authoritative joint positions.
///
/// Supplied joints that are non-degenerate as a set are validated one by
/// one: a joint whose listed members all have an endpoint within
/// tolerance passes through unchanged. An invalid joint gets its
/// position recomputed from its members' closest endpoints. A missing or
/// degenerate joint set is recomputed entirely from pairwise
/// member-endpoint proximity. When nothing intersects within tolerance
/// the result is empty; a joint is never fabricated.
pub fn resolve(
    members: &BTreeMap<String, Member>,
    supplied: &[Joint],
    settings: &ToleranceSettings,
) -> ResolveOutcome {
    let tol = settings.endpoint_tolerance;

    let degenerate_members: Vec<String> = members
        .values()
        .filter(|m| m.is_degenerate())
        .map(|m| m.id.clone())
        .collect();
    let active: Vec<&Member> = members.values().filter(|m| !m.is_degenerate()).collect();

    let mut joints = if supplied_is_usable(supplied) {
        validate_supplied(supplied, members, tol)
    } else {
        if !supplied.is_empty() {
            debug!(
                count = supplied.len(),
                "supplied joint set is degenerate, recomputing from member topology"
            );
        }
        infer_joints(&active, tol)
    };

    if joints.is_empty() {
        warn!("no joints resolved: no member pair intersects within tolerance");
    }

    for joint in joints.values_mut() {
        joint.category = classify_joint(joint, members, settings);
    }

    ResolveOutcome {
        joints,
        degenerate_members,
    }
}

/// A supplied joint set is usable when it is non-empty and not obviously
/// placeholder data: not all at one position, not all at the origin, and
/// every position finite.
fn supplied_is_usable(supplied: &[Joint]) -> bool {
    if supplied.is_empty() {
        return false;
    }
    if supplied.iter().any(|j| !j.position.is_finite()) {
        return false;
    }
    let first: Point3 = supplied[0].position.into();
    let all_identical = supplied
        .iter()
        .all(|j| distance(&j.position.into(), &first) < 1e-9);
    if all_identical && supplied.len() > 1 {
        return false;
    }
    let all_origin = supplied
        .iter()
        .all(|j| distance(&j.position.into(), &Point3::origin()) < 1e-9);
    !all_origin
}

fn validate_supplied(
    supplied: &[Joint],
    members: &BTreeMap<String, Member>,
    tol: f64,
) -> BTreeMap<String, Joint> {
    let mut out = BTreeMap::new();
    for joint in supplied {
        let position: Point3 = joint.position.into();
        let listed: Vec<&Member> = joint
            .members
            .iter()
            .filter_map(|id| members.get(id))
            .filter(|m| !m.is_degenerate())
            .collect();

        if listed.is_empty() {
            warn!(joint = %joint.id, "dropping joint with no usable members");
            continue;
        }

        let all_within = listed.iter().all(|m| {
            m.endpoints()
                .iter()
                .any(|e| distance(e, &position) <= tol)
        });

        let mut resolved = joint.clone();
        if all_within {
            resolved.provenance = JointProvenance::Validated;
        } else {
            // Position disagrees with the topology: the members win.
            // Recompute as the centroid of each member's closest endpoint.
            let mut sum = Point3::origin();
            for m in &listed {
                let closest = m
                    .endpoints()
                    .into_iter()
                    .min_by(|a, b| {
                        distance(a, &position)
                            .partial_cmp(&distance(b, &position))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .unwrap_or(position);
                sum.coords += closest.coords;
            }
            let centroid = Point3::from(sum.coords / listed.len() as f64);
            debug!(joint = %joint.id, "repositioning joint onto member endpoints");
            resolved.position = centroid.into();
            resolved.provenance = JointProvenance::Inferred;
        }
        out.insert(resolved.id.clone(), resolved);
    }
    out
}

/// One merged cluster of endpoint-proximity candidates.
struct Candidate {
    positions: Vec<Point3>,
    members: BTreeSet<String>,
}

impl Candidate {
    fn centroid(&self) -> Point3 {
        let mut sum = Point3::origin();
        for p in &self.positions {
            sum.coords += p.coords;
        }
        Point3::from(sum.coords / self.positions.len() as f64)
    }
}

/// Recompute joints from pairwise member-endpoint distances. Every
/// endpoint combination below tolerance yields a candidate at the
/// midpoint; candidates within tolerance of each other merge into one
/// joint with the union of member ids at the centroid.
fn infer_joints(active: &[&Member], tol: f64) -> BTreeMap<String, Joint> {
    let mut clusters: Vec<Candidate> = Vec::new();

    for (i, a) in active.iter().enumerate() {
        for b in active.iter().skip(i + 1) {
            for ea in a.endpoints() {
                for eb in b.endpoints() {
                    if distance(&ea, &eb) > tol {
                        continue;
                    }
                    let mid = midpoint(&ea, &eb);
                    let hit = clusters
                        .iter_mut()
                        .find(|c| distance(&c.centroid(), &mid) <= tol);
                    match hit {
                        Some(cluster) => {
                            cluster.positions.push(mid);
                            cluster.members.insert(a.id.clone());
                            cluster.members.insert(b.id.clone());
                        }
                        None => clusters.push(Candidate {
                            positions: vec![mid],
                            members: [a.id.clone(), b.id.clone()].into_iter().collect(),
                        }),
                    }
                }
            }
        }
    }

    // Deterministic ids: clusters ordered by their member-id sets.
    clusters.sort_by(|a, b| a.members.cmp(&b.members));

    let mut joints = BTreeMap::new();
    for (index, cluster) in clusters.iter().enumerate() {
        let id = format!("J{}", index + 1);
        let mut joint = Joint::new(
            id.clone(),
            Point3D::from(cluster.centroid()),
            cluster.members.iter().cloned(),
        );
        joint.provenance = JointProvenance::Inferred;
        joints.insert(id, joint);
    }
    joints
}

/// Classify a joint's connection category from its members' roles and
/// geometry. When several categories qualify the most load-critical
/// wins: base-plate, splice, moment, bracing, shear, roof-plate.
pub fn classify_joint(
    joint: &Joint,
    members: &BTreeMap<String, Member>,
    settings: &ToleranceSettings,
) -> ConnectionCategory {
    let tol = settings.endpoint_tolerance;
    let connected: Vec<&Member> = joint
        .members
        .iter()
        .filter_map(|id| members.get(id))
        .collect();

    let z = joint.position.z;
    let verticals: Vec<&&Member> = connected.iter().filter(|m| m.is_vertical()).collect();
    let has_beam = connected.iter().any(|m| m.role == MemberRole::Beam);
    let has_brace = connected.iter().any(|m| m.role == MemberRole::Brace);

    let at_column_foot = verticals.iter().any(|m| (z - m.min_z()).abs() <= tol);
    let at_column_top = verticals.iter().any(|m| (z - m.max_z()).abs() <= tol);
    // A member passing through (or continuing past) the joint rules out
    // the foundation and roof categories.
    let continues_below = connected.iter().any(|m| z - m.min_z() > tol);
    let continues_above = connected.iter().any(|m| m.max_z() - z > tol);

    let mut candidates: Vec<ConnectionCategory> = Vec::new();

    if at_column_foot && !continues_below && !has_beam {
        candidates.push(ConnectionCategory::BasePlate);
    }
    if connected.len() == 2 && connected[0].profile.name == connected[1].profile.name {
        let angle = steelcheck_math::angle_between(&connected[0].axis(), &connected[1].axis());
        let collinear = angle < 0.18 || angle > std::f64::consts::PI - 0.18;
        if collinear {
            candidates.push(ConnectionCategory::Splice);
        }
    }
    if has_beam && !verticals.is_empty() {
        // A beam framing into a continuing column is a moment connection;
        // at the column top it is a simple (shear) seat.
        if at_column_top {
            candidates.push(ConnectionCategory::Shear);
        } else {
            candidates.push(ConnectionCategory::Moment);
        }
    }
    if has_brace {
        candidates.push(ConnectionCategory::Bracing);
    }
    if at_column_top && !continues_above && !has_beam {
        candidates.push(ConnectionCategory::RoofPlate);
    }

    candidates
        .into_iter()
        .min()
        .unwrap_or(ConnectionCategory::Shear)
}

//! The per-category repair implementations.
//!
//! Every strategy edits the model in place and reports the primary value
//! change for the audit record. Sizes only ever grow: a replacement
//! dimension is the larger of the current value and the selected
//! standard size.

use steelcheck_math::{distance, Frame, Point3, Vec3};
use steelcheck_model::{
    Clash, ClashCategory, ConnectionElement, CorrectionChange, ElementKind, Point3D,
    StructureModel,
};
use steelcheck_resolve::ToleranceSettings;
use steelcheck_standards::{DimensionSuggester, RuleTables, SizeCategory};
use tracing::debug;

use crate::Repair;

/// Audit-record action name for a category.
pub(crate) fn action_name(category: ClashCategory) -> &'static str {
    match category {
        ClashCategory::BasePlateElevation => "snap base plate to column foot",
        ClashCategory::BoltPosition | ClashCategory::BoltSpacing => "regenerate bolt grid",
        ClashCategory::Undersized => "increase to next standard size",
        ClashCategory::PlateAlignment => "realign plate to member axis",
        ClashCategory::Anchorage => "restore anchorage minimums",
        ClashCategory::StructuralLogic => "reattach orphan element",
        ClashCategory::Geometric
        | ClashCategory::MissingWeld
        | ClashCategory::MemberGeometry
        | ClashCategory::Eccentricity => "manual review",
    }
}

/// First clash subject that names an element of the given predicate.
fn subject_element<'a>(
    clash: &Clash,
    model: &'a StructureModel,
    pred: impl Fn(&ConnectionElement) -> bool,
) -> Option<&'a ConnectionElement> {
    clash
        .subjects
        .iter()
        .filter_map(|id| model.elements.get(id))
        .find(|e| pred(e))
}

/// Local frame of a plate: its stored orientation when present, else the
/// axis of the first non-degenerate member it connects, else world Z.
fn plate_frame(model: &StructureModel, plate: &ConnectionElement) -> Frame {
    let origin: Point3 = plate.position.into();
    if let Some(normal) = &plate.orientation {
        let axis = Vec3::new(normal.x, normal.y, normal.z);
        if let Some(frame) = Frame::from_axis(origin, axis) {
            return frame;
        }
    }
    for member_id in &plate.members {
        if let Some(member) = model.members.get(member_id) {
            if !member.is_degenerate() {
                if let Some(frame) = Frame::from_axis(origin, member.axis()) {
                    return frame;
                }
            }
        }
    }
    // World Z cannot fail the axis check.
    Frame::from_axis(origin, Vec3::z()).unwrap_or_else(|| unreachable!())
}

// ---------------------------------------------------------------------------
// Base-plate elevation
// ---------------------------------------------------------------------------

/// Move the plate (and its owning joint) to the lowest endpoint of the
/// vertical members it serves.
pub(crate) fn fix_elevation(
    clash: &Clash,
    model: &mut StructureModel,
    tolerances: &ToleranceSettings,
) -> Repair {
    let Some(plate) = subject_element(clash, model, ConnectionElement::is_plate) else {
        return Repair::Unavailable("subject is not a plate".into());
    };
    let plate_id = plate.id.clone();
    let joint_id = plate.owning_joint.clone();

    // Foot elevation comes from the joint's vertical members when the
    // plate is mapped, else from the plate's own member list.
    let mut target_z: Option<f64> = None;
    let member_ids: Vec<String> = match joint_id.as_deref().and_then(|id| model.joints.get(id)) {
        Some(joint) => joint.members.iter().cloned().collect(),
        None => plate.members.clone(),
    };
    for id in &member_ids {
        if let Some(m) = model.members.get(id) {
            if m.is_vertical() && !m.is_degenerate() {
                let z = m.min_z();
                target_z = Some(target_z.map_or(z, |t: f64| t.min(z)));
            }
        }
    }
    let Some(target_z) = target_z else {
        return Repair::Unavailable("no vertical member to take the foot elevation from".into());
    };

    let Some(element) = model.elements.get_mut(&plate_id) else {
        return Repair::Unavailable(format!("plate {plate_id} not in model"));
    };
    let before = element.position;
    if (before.z - target_z).abs() <= tolerances.elevation_tolerance {
        return Repair::Unchanged;
    }
    element.position.z = target_z;
    let after = element.position;

    // The work point follows the plate.
    if let Some(joint) = joint_id.and_then(|id| model.joints.get_mut(&id)) {
        joint.position.z = target_z;
    }

    debug!(plate = %plate_id, from = before.z, to = target_z, "base plate snapped");
    Repair::Changed(Some(CorrectionChange::Position { before, after }))
}

// ---------------------------------------------------------------------------
// Bolt grids
// ---------------------------------------------------------------------------

/// Regenerate the full bolt grid of the subject bolt's parent plate.
pub(crate) fn fix_bolt_grid(
    clash: &Clash,
    model: &mut StructureModel,
    tables: &RuleTables,
) -> Repair {
    let Some(bolt) = subject_element(clash, model, |e| {
        matches!(e.kind, ElementKind::Bolt { .. })
    }) else {
        return Repair::Unavailable("subject is not a bolt".into());
    };
    let subject_id = bolt.id.clone();
    let Some(plate_id) = bolt.parent.clone() else {
        return Repair::Unavailable("bolt has no parent plate to grid against".into());
    };
    regrid(model, &plate_id, &subject_id, false, tables)
}

/// Lay the fastener children of a plate out on a regular grid inside its
/// bounds, and report the position change of `subject_id`.
fn regrid(
    model: &mut StructureModel,
    plate_id: &str,
    subject_id: &str,
    anchors: bool,
    tables: &RuleTables,
) -> Repair {
    let Some(plate) = model.elements.get(plate_id) else {
        return Repair::Unavailable(format!("parent plate {plate_id} not in model"));
    };
    let Some((half_w, half_h)) = plate.plate_half_extents() else {
        return Repair::Unavailable(format!("parent {plate_id} is not a plate"));
    };
    let frame = plate_frame(model, plate);

    let ids: Vec<String> = model
        .children_of(plate_id)
        .filter(|e| match e.kind {
            ElementKind::Bolt { .. } => !anchors,
            ElementKind::Anchor { .. } => anchors,
            _ => false,
        })
        .map(|e| e.id.clone())
        .collect();
    if ids.is_empty() {
        return Repair::Unavailable(format!("plate {plate_id} has no fasteners to grid"));
    }

    // Edge inset from the governing (largest) diameter.
    let max_diameter = ids
        .iter()
        .filter_map(|id| match model.elements[id].kind {
            ElementKind::Bolt { diameter, .. } | ElementKind::Anchor { diameter, .. } => {
                Some(diameter)
            }
            _ => None,
        })
        .fold(0.0_f64, f64::max);
    let edge = if anchors {
        tables.anchor_min_edge.max(tables.bolt_edge_factor * max_diameter)
    } else {
        tables.bolt_edge_factor * max_diameter
    };
    let usable_u = (2.0 * (half_w - edge)).max(0.0);
    let usable_v = (2.0 * (half_h - edge)).max(0.0);

    let n = ids.len();
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    let mut change = None;
    for (i, id) in ids.iter().enumerate() {
        let col = i % cols;
        let row = i / cols;
        let u = if cols > 1 {
            -usable_u * 0.5 + usable_u * col as f64 / (cols - 1) as f64
        } else {
            0.0
        };
        let v = if rows > 1 {
            -usable_v * 0.5 + usable_v * row as f64 / (rows - 1) as f64
        } else {
            0.0
        };
        let world = frame.to_world(u, v, 0.0);
        let Some(element) = model.elements.get_mut(id) else {
            continue;
        };
        let before = element.position;
        element.position = Point3D::from(world);
        if id == subject_id {
            change = Some(CorrectionChange::Position {
                before,
                after: element.position,
            });
        }
    }
    debug!(plate = plate_id, fasteners = n, "fastener grid regenerated");
    Repair::Changed(change)
}

// ---------------------------------------------------------------------------
// Undersized dimensions
// ---------------------------------------------------------------------------

/// Grow the deficient dimension to the next standard size at or above the
/// applicable minimum. Never shrinks.
pub(crate) fn fix_undersized(
    clash: &Clash,
    model: &mut StructureModel,
    tables: &RuleTables,
    suggester: Option<&dyn DimensionSuggester>,
) -> Repair {
    let Some(element) = subject_element(clash, model, |_| true) else {
        return Repair::Unavailable("subject is not an element".into());
    };
    let id = element.id.clone();
    let grade = element.grade.clone();
    let parent = element.parent.clone();
    let kind = element.kind.clone();

    let hint = |category: SizeCategory| {
        suggester.and_then(|s| s.suggest(0.0, &grade, category))
    };

    match kind {
        ElementKind::Plate {
            thickness,
            width,
            height,
        } => {
            let minimum = hint(SizeCategory::PlateThickness)
                .map_or(tables.base_plate_min_thickness, |h| {
                    h.max(tables.base_plate_min_thickness)
                });
            let new_thickness = tables
                .next_size_up(SizeCategory::PlateThickness, minimum)
                .max(thickness);
            let new_width = width.max(tables.base_plate_min_plan);
            let new_height = height.max(tables.base_plate_min_plan);
            let change = if new_thickness > thickness {
                CorrectionChange::Dimension {
                    name: "thickness".into(),
                    before: thickness,
                    after: new_thickness,
                }
            } else if new_width > width {
                CorrectionChange::Dimension {
                    name: "width".into(),
                    before: width,
                    after: new_width,
                }
            } else if new_height > height {
                CorrectionChange::Dimension {
                    name: "height".into(),
                    before: height,
                    after: new_height,
                }
            } else {
                return Repair::Unchanged;
            };
            let Some(element) = model.elements.get_mut(&id) else {
                return Repair::Unavailable(format!("element {id} not in model"));
            };
            element.kind = ElementKind::Plate {
                thickness: new_thickness,
                width: new_width,
                height: new_height,
            };
            Repair::Changed(Some(change))
        }
        ElementKind::Bolt { diameter, length } => {
            let minimum = hint(SizeCategory::BoltDiameter).map_or(diameter, |h| h.max(diameter));
            let new = tables
                .next_size_up(SizeCategory::BoltDiameter, minimum)
                .max(diameter);
            if new <= diameter {
                return Repair::Unchanged;
            }
            let Some(element) = model.elements.get_mut(&id) else {
                return Repair::Unavailable(format!("element {id} not in model"));
            };
            element.kind = ElementKind::Bolt {
                diameter: new,
                length,
            };
            Repair::Changed(Some(CorrectionChange::Dimension {
                name: "diameter".into(),
                before: diameter,
                after: new,
            }))
        }
        ElementKind::Weld { size, length } => {
            let Some(thickness) = parent
                .as_deref()
                .and_then(|p| model.elements.get(p))
                .and_then(|p| match p.kind {
                    ElementKind::Plate { thickness, .. } => Some(thickness),
                    _ => None,
                })
            else {
                return Repair::Unavailable(
                    "weld has no parent plate to take the minimum size from".into(),
                );
            };
            let minimum = hint(SizeCategory::WeldSize)
                .map_or(tables.min_weld_size(thickness), |h| {
                    h.max(tables.min_weld_size(thickness))
                });
            let new = tables.next_size_up(SizeCategory::WeldSize, minimum).max(size);
            if new <= size {
                return Repair::Unchanged;
            }
            let Some(element) = model.elements.get_mut(&id) else {
                return Repair::Unavailable(format!("element {id} not in model"));
            };
            element.kind = ElementKind::Weld { size: new, length };
            Repair::Changed(Some(CorrectionChange::Dimension {
                name: "size".into(),
                before: size,
                after: new,
            }))
        }
        ElementKind::Anchor {
            diameter,
            embedment,
        } => {
            let minimum = hint(SizeCategory::AnchorDiameter).map_or(diameter, |h| h.max(diameter));
            let new = tables
                .next_size_up(SizeCategory::AnchorDiameter, minimum)
                .max(diameter);
            if new <= diameter {
                return Repair::Unchanged;
            }
            let Some(element) = model.elements.get_mut(&id) else {
                return Repair::Unavailable(format!("element {id} not in model"));
            };
            element.kind = ElementKind::Anchor {
                diameter: new,
                embedment,
            };
            Repair::Changed(Some(CorrectionChange::Dimension {
                name: "diameter".into(),
                before: diameter,
                after: new,
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Plate alignment
// ---------------------------------------------------------------------------

/// Re-derive the plate frame from its member's axis and recenter the
/// plate on the joint's work point.
pub(crate) fn fix_alignment(clash: &Clash, model: &mut StructureModel) -> Repair {
    let Some(plate) = subject_element(clash, model, ConnectionElement::is_plate) else {
        return Repair::Unavailable("subject is not a plate".into());
    };
    let plate_id = plate.id.clone();
    let joint = plate
        .owning_joint
        .as_deref()
        .and_then(|id| model.joints.get(id));
    let Some(joint) = joint else {
        return Repair::Unavailable("plate is not mapped to a joint".into());
    };
    let work_point = joint.position;

    // The reference member: shared between the plate and the joint when
    // possible, else any joint member.
    let member = plate
        .members
        .iter()
        .filter(|id| joint.has_member(id))
        .chain(joint.members.iter())
        .filter_map(|id| model.members.get(id))
        .find(|m| !m.is_degenerate());
    let Some(member) = member else {
        return Repair::Unavailable("no member axis to align the plate to".into());
    };
    let axis = member.axis().normalize();

    let Some(element) = model.elements.get_mut(&plate_id) else {
        return Repair::Unavailable(format!("plate {plate_id} not in model"));
    };
    let before = element.position;
    let moved = distance(&before.into(), &work_point.into()) > 1e-9;
    let aligned = element.orientation.map_or(false, |n| {
        (n.x - axis.x).abs() < 1e-9 && (n.y - axis.y).abs() < 1e-9 && (n.z - axis.z).abs() < 1e-9
    });
    if !moved && aligned {
        return Repair::Unchanged;
    }
    element.orientation = Some(Point3D::new(axis.x, axis.y, axis.z));
    element.position = work_point;
    Repair::Changed(moved.then_some(CorrectionChange::Position {
        before,
        after: work_point,
    }))
}

// ---------------------------------------------------------------------------
// Anchorage
// ---------------------------------------------------------------------------

/// Deepen under-embedded anchors; redistribute anchors that violate edge
/// or spacing minimums.
pub(crate) fn fix_anchorage(
    clash: &Clash,
    model: &mut StructureModel,
    tables: &RuleTables,
    suggester: Option<&dyn DimensionSuggester>,
) -> Repair {
    let Some(anchor) = subject_element(clash, model, |e| {
        matches!(e.kind, ElementKind::Anchor { .. })
    }) else {
        return Repair::Unavailable("subject is not an anchor".into());
    };
    let id = anchor.id.clone();
    let grade = anchor.grade.clone();
    let parent = anchor.parent.clone();
    let ElementKind::Anchor {
        diameter,
        embedment,
    } = anchor.kind
    else {
        return Repair::Unavailable("subject is not an anchor".into());
    };

    let minimum = suggester
        .and_then(|s| s.suggest(0.0, &grade, SizeCategory::AnchorEmbedment))
        .map_or(tables.anchor_min_embedment, |h| {
            h.max(tables.anchor_min_embedment)
        });
    if embedment < minimum {
        let new = minimum.max(embedment);
        let Some(element) = model.elements.get_mut(&id) else {
            return Repair::Unavailable(format!("element {id} not in model"));
        };
        element.kind = ElementKind::Anchor {
            diameter,
            embedment: new,
        };
        return Repair::Changed(Some(CorrectionChange::Dimension {
            name: "embedment".into(),
            before: embedment,
            after: new,
        }));
    }

    // Edge or spacing violation: redistribute the plate's anchors.
    let Some(plate_id) = parent else {
        return Repair::Unavailable("anchor has no parent plate to grid against".into());
    };
    regrid(model, &plate_id, &id, true, tables)
}

// ---------------------------------------------------------------------------
// Structural logic
// ---------------------------------------------------------------------------

/// Reattach an orphaned element to the nearest plate and regenerate that
/// plate's fastener grid. Other structural-logic findings (lone joints,
/// nonsense dimensions) have no safe automatic fix.
pub(crate) fn fix_orphan(
    clash: &Clash,
    model: &mut StructureModel,
    tables: &RuleTables,
) -> Repair {
    let Some(orphan) = subject_element(clash, model, |e| e.orphaned) else {
        return Repair::Unavailable("structural-logic finding requires manual review".into());
    };
    if orphan.is_plate() {
        return Repair::Unavailable("orphan plate requires manual review".into());
    }
    let orphan_id = orphan.id.clone();
    let orphan_pos: Point3 = orphan.position.into();

    // Nearest plate by center distance; ties break toward the lower id
    // because iteration is id-ordered and strict comparison keeps the
    // first minimum.
    let mut nearest: Option<(f64, String)> = None;
    for plate in model.elements.values().filter(|e| e.is_plate() && !e.orphaned) {
        let d = distance(&orphan_pos, &plate.position.into());
        if nearest.as_ref().map_or(true, |(best, _)| d < *best) {
            nearest = Some((d, plate.id.clone()));
        }
    }
    let Some((_, plate_id)) = nearest else {
        return Repair::Unavailable("no plate available to adopt the orphan".into());
    };

    let plate = &model.elements[&plate_id];
    let joint = plate.owning_joint.clone();
    let members = plate.members.clone();
    let is_anchor = matches!(model.elements[&orphan_id].kind, ElementKind::Anchor { .. });

    let Some(element) = model.elements.get_mut(&orphan_id) else {
        return Repair::Unavailable(format!("element {orphan_id} not in model"));
    };
    element.parent = Some(plate_id.clone());
    element.owning_joint = joint;
    element.members = members;
    element.orphaned = false;
    debug!(orphan = %orphan_id, plate = %plate_id, "orphan reattached");

    if matches!(
        model.elements[&orphan_id].kind,
        ElementKind::Bolt { .. } | ElementKind::Anchor { .. }
    ) {
        regrid(model, &plate_id, &orphan_id, is_anchor, tables)
    } else {
        Repair::Changed(None)
    }
}

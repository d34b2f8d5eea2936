//! End-to-end pipeline runs over small structures.

use steelcheck::{
    run, ClashCategory, ConnectionElement, Convergence, ElementKind, Joint, JointProvenance,
    Member, MemberRole, PipelineSettings, Point3D, Profile, StructureInput,
};

fn column(id: &str, x: f64) -> Member {
    Member {
        id: id.into(),
        start: Point3D::new(x, 0.0, 0.0),
        end: Point3D::new(x, 0.0, 3000.0),
        profile: Profile::new("HEA200", 190.0, 200.0),
        role: MemberRole::Column,
    }
}

fn beam(id: &str, from: Point3D, to: Point3D) -> Member {
    Member {
        id: id.into(),
        start: from,
        end: to,
        profile: Profile::new("IPE300", 300.0, 150.0),
        role: MemberRole::Beam,
    }
}

fn plate(id: &str, position: Point3D, thickness: f64, members: &[&str]) -> ConnectionElement {
    let mut plate = ConnectionElement::new(
        id,
        ElementKind::Plate {
            thickness,
            width: 300.0,
            height: 300.0,
        },
        position,
    );
    plate.members = members.iter().map(|m| m.to_string()).collect();
    plate
}

fn weld(id: &str, parent: &str, position: Point3D) -> ConnectionElement {
    let mut weld = ConnectionElement::new(
        id,
        ElementKind::Weld {
            size: 6.0,
            length: 200.0,
        },
        position,
    );
    weld.parent = Some(parent.into());
    weld
}

/// Two columns and a beam spanning their tops.
fn portal_frame() -> Vec<Member> {
    vec![
        column("C1", 0.0),
        column("C2", 6000.0),
        beam(
            "B1",
            Point3D::new(0.0, 0.0, 3000.0),
            Point3D::new(6000.0, 0.0, 3000.0),
        ),
    ]
}

#[test]
fn test_joints_inferred_from_member_endpoints() {
    // No upstream joints at all: both beam-to-column joints are
    // recomputed from endpoint proximity.
    let report = run(
        StructureInput {
            id: "frame".into(),
            members: portal_frame(),
            ..Default::default()
        },
        &PipelineSettings::default(),
        None,
    )
    .unwrap();

    assert_eq!(report.model.joints.len(), 2);
    for joint in report.model.joints.values() {
        assert_eq!(joint.provenance, JointProvenance::Inferred);
        assert_eq!(joint.members.len(), 2);
        assert!((joint.position.z - 3000.0).abs() < 1e-6);
    }
    assert!(report.clashes.is_clean());
    assert_eq!(report.convergence, Convergence::Clean);
    assert_eq!(report.passes_run, 0);
}

#[test]
fn test_supplied_joints_validated_in_place() {
    let joints = vec![
        Joint::new(
            "JA",
            Point3D::new(0.0, 0.0, 3000.0),
            ["C1".to_string(), "B1".to_string()],
        ),
        Joint::new(
            "JB",
            Point3D::new(6000.0, 0.0, 3000.0),
            ["C2".to_string(), "B1".to_string()],
        ),
    ];
    let report = run(
        StructureInput {
            id: "frame".into(),
            members: portal_frame(),
            joints,
            ..Default::default()
        },
        &PipelineSettings::default(),
        None,
    )
    .unwrap();

    // Consistent upstream joints survive with their ids and positions.
    let ja = &report.model.joints["JA"];
    assert_eq!(ja.provenance, JointProvenance::Validated);
    assert!(ja.position.distance(&Point3D::new(0.0, 0.0, 3000.0)) < 1e-9);
    assert!(report.model.joints.contains_key("JB"));
}

#[test]
fn test_base_plate_snapped_to_column_foot() {
    // The base plate was synthesized at the column top instead of the
    // foot: a CRITICAL elevation clash the corrector can fix.
    let input = StructureInput {
        id: "base".into(),
        members: vec![column("C1", 500.0)],
        joints: vec![Joint::new("J1", Point3D::new(500.0, 0.0, 0.0), ["C1".to_string()])],
        elements: vec![
            plate("P1", Point3D::new(500.0, 0.0, 3000.0), 20.0, &["C1"]),
            weld("W1", "P1", Point3D::new(500.0, 0.0, 3000.0)),
        ],
    };
    let report = run(input, &PipelineSettings::default(), None).unwrap();

    assert!((report.model.elements["P1"].position.z).abs() < 1e-9);
    assert_eq!(
        report
            .clashes
            .of_category(ClashCategory::BasePlateElevation)
            .count(),
        0
    );
    assert!(report.auto_fixed() >= 1);
    assert!(report
        .corrections
        .iter()
        .any(|c| c.is_applied() && c.subject == "P1"));

    // The single-member joint finding has no automatic fix.
    assert!(report.manual_review().count() >= 1);
    assert_eq!(report.convergence, Convergence::Stable);
}

#[test]
fn test_orphan_bolt_reattached_to_nearest_plate() {
    // A bolt with no parent and no member references, nowhere near any
    // joint: marked orphan by the mapper, then adopted by the only plate.
    let top = Point3D::new(0.0, 0.0, 3000.0);
    let mut stray = ConnectionElement::new(
        "B9",
        ElementKind::Bolt {
            diameter: 20.0,
            length: 60.0,
        },
        Point3D::new(3000.0, 2000.0, 0.0),
    );
    stray.grade = "A325".into();

    let input = StructureInput {
        id: "orphan".into(),
        members: portal_frame(),
        joints: vec![],
        elements: vec![
            plate("P1", top, 20.0, &["C1", "B1"]),
            weld("W1", "P1", top),
            stray,
        ],
    };
    let report = run(input, &PipelineSettings::default(), None).unwrap();

    let bolt = &report.model.elements["B9"];
    assert!(!bolt.orphaned);
    assert_eq!(bolt.parent.as_deref(), Some("P1"));
    assert_eq!(bolt.owning_joint, report.model.elements["P1"].owning_joint);
    // Re-gridded inside the plate: a lone bolt lands on the center.
    assert!(bolt.position.distance(&report.model.elements["P1"].position) < 1e-6);

    assert_eq!(
        report
            .clashes
            .of_category(ClashCategory::StructuralLogic)
            .count(),
        0
    );
    assert_eq!(report.convergence, Convergence::Clean);
}

#[test]
fn test_plate_spanning_unjoined_members_flagged() {
    // The plate references both columns, but no single joint connects
    // C1 and C2. The mapper still assigns the best partial overlap; the
    // detector must surface the member the assignment does not cover.
    let input = StructureInput {
        id: "span".into(),
        members: portal_frame(),
        joints: vec![],
        elements: vec![plate(
            "P1",
            Point3D::new(0.0, 0.0, 3000.0),
            20.0,
            &["C1", "C2"],
        )],
    };
    let report = run(input, &PipelineSettings::default(), None).unwrap();

    let plate = &report.model.elements["P1"];
    let joint = &report.model.joints[plate.owning_joint.as_ref().unwrap()];
    assert!(plate.members.iter().any(|m| !joint.has_member(m)));

    let clash = report
        .clashes
        .of_category(ClashCategory::StructuralLogic)
        .find(|c| c.subjects.contains(&"P1".to_string()))
        .expect("uncovered member clash");
    assert!(clash.description.contains("C2"));
    // No automatic fix rewires member references.
    assert!(report.manual_review().any(|c| c.subject == "P1"));
    assert_eq!(report.convergence, Convergence::Stable);
}

#[test]
fn test_redetect_runs_between_severity_tiers() {
    // One bolt outside the plate (CRITICAL) and a sibling too close to
    // the edge (MAJOR). The critical regrid repositions every bolt on
    // the plate, so the edge finding is stale by the time the major
    // tier runs: exactly one regrid may appear in the audit trail.
    let top = Point3D::new(0.0, 0.0, 3000.0);
    let bolt = |id: &str, x: f64| {
        let mut b = ConnectionElement::new(
            id,
            ElementKind::Bolt {
                diameter: 20.0,
                length: 60.0,
            },
            Point3D::new(x, 0.0, 3000.0),
        );
        b.parent = Some("P1".into());
        b
    };
    let input = StructureInput {
        id: "tiers".into(),
        members: portal_frame(),
        joints: vec![],
        elements: vec![
            plate("P1", top, 20.0, &["C1", "B1"]),
            bolt("B8", 400.0),
            bolt("B9", 140.0),
        ],
    };
    let report = run(input, &PipelineSettings::default(), None).unwrap();

    assert!(report.clashes.is_clean());
    assert_eq!(report.convergence, Convergence::Clean);
    let applied: Vec<_> = report
        .corrections
        .iter()
        .filter(|c| c.is_applied())
        .collect();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].subject, "B8");
}

#[test]
fn test_thin_base_plate_resized_to_standard() {
    // 10mm base plate against the 12.7mm category minimum.
    let input = StructureInput {
        id: "thin".into(),
        members: vec![column("C1", 500.0)],
        joints: vec![Joint::new("J1", Point3D::new(500.0, 0.0, 0.0), ["C1".to_string()])],
        elements: vec![
            plate("P1", Point3D::new(500.0, 0.0, 0.0), 10.0, &["C1"]),
            weld("W1", "P1", Point3D::new(500.0, 0.0, 0.0)),
        ],
    };
    let report = run(input, &PipelineSettings::default(), None).unwrap();

    let ElementKind::Plate { thickness, .. } = report.model.elements["P1"].kind else {
        panic!("P1 is still a plate");
    };
    assert!((thickness - 12.7).abs() < 1e-9);
    assert_eq!(
        report
            .clashes
            .of_category(ClashCategory::Undersized)
            .count(),
        0
    );
}

#[test]
fn test_corrected_categories_do_not_reappear() {
    // Wrong elevation and undersized thickness on the same plate: both
    // fixed, neither category present in the final report.
    let input = StructureInput {
        id: "combined".into(),
        members: vec![column("C1", 500.0)],
        joints: vec![Joint::new("J1", Point3D::new(500.0, 0.0, 0.0), ["C1".to_string()])],
        elements: vec![
            plate("P1", Point3D::new(500.0, 0.0, 3000.0), 10.0, &["C1"]),
            weld("W1", "P1", Point3D::new(500.0, 0.0, 3000.0)),
        ],
    };
    let report = run(input, &PipelineSettings::default(), None).unwrap();

    assert!((report.model.elements["P1"].position.z).abs() < 1e-9);
    let ElementKind::Plate { thickness, .. } = report.model.elements["P1"].kind else {
        panic!("P1 is still a plate");
    };
    assert!((thickness - 12.7).abs() < 1e-9);
    for clash in &report.clashes.clashes {
        assert_ne!(clash.category, ClashCategory::BasePlateElevation);
        assert_ne!(clash.category, ClashCategory::Undersized);
    }
    assert!(report.passes_run >= 1);
}

#[test]
fn test_degenerate_member_reported_not_fatal() {
    let mut members = portal_frame();
    members.push(Member {
        id: "Z1".into(),
        start: Point3D::new(100.0, 100.0, 0.0),
        end: Point3D::new(100.0, 100.0, 0.0),
        profile: Profile::new("HEA200", 190.0, 200.0),
        role: MemberRole::Column,
    });
    let report = run(
        StructureInput {
            id: "degen".into(),
            members,
            ..Default::default()
        },
        &PipelineSettings::default(),
        None,
    )
    .unwrap();

    assert_eq!(report.degenerate_members, vec!["Z1".to_string()]);
    assert!(report
        .clashes
        .of_category(ClashCategory::StructuralLogic)
        .any(|c| c.subjects.contains(&"Z1".to_string())));
    // The zero-length member has no fix; everything else is clean.
    assert_eq!(report.convergence, Convergence::Stable);
}

#[test]
fn test_run_is_deterministic() {
    let input = StructureInput {
        id: "det".into(),
        members: vec![column("C1", 500.0)],
        joints: vec![Joint::new("J1", Point3D::new(500.0, 0.0, 0.0), ["C1".to_string()])],
        elements: vec![
            plate("P1", Point3D::new(500.0, 0.0, 3000.0), 10.0, &["C1"]),
            weld("W1", "P1", Point3D::new(500.0, 0.0, 3000.0)),
        ],
    };
    let settings = PipelineSettings::default();
    let a = run(input.clone(), &settings, None).unwrap();
    let b = run(input, &settings, None).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_rerun_on_corrected_model_is_stable() {
    // Feeding a corrected model back through the pipeline applies no
    // further fixes.
    let input = StructureInput {
        id: "idem".into(),
        members: vec![column("C1", 500.0)],
        joints: vec![Joint::new("J1", Point3D::new(500.0, 0.0, 0.0), ["C1".to_string()])],
        elements: vec![
            plate("P1", Point3D::new(500.0, 0.0, 3000.0), 20.0, &["C1"]),
            weld("W1", "P1", Point3D::new(500.0, 0.0, 3000.0)),
        ],
    };
    let settings = PipelineSettings::default();
    let first = run(input, &settings, None).unwrap();

    let second = run(
        StructureInput {
            id: "idem".into(),
            members: first.model.members.values().cloned().collect(),
            joints: first.model.joints.values().cloned().collect(),
            elements: first.model.elements.values().cloned().collect(),
        },
        &settings,
        None,
    )
    .unwrap();

    assert_eq!(second.auto_fixed(), 0);
    assert_eq!(first.model.elements["P1"], second.model.elements["P1"]);
}

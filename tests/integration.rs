use rand::SeedableRng;
use rand::rngs::StdRng;
use wrap_engine::fold::{
    FoldTopology, FoldingPattern, PivotId, TieSegment, apply_fold_state, build_fold_mesh, derive_clusters,
    derive_pivots, fold_fix, normalize,
};
use wrap_engine::geom::{Point3, Tolerance, Vec3};
use wrap_engine::host::{MemoryScene, SceneHost};
use wrap_engine::ribbon::{ProfileSlot, RibbonSize};
use wrap_engine::rig::{
    ATTR_ANIMATION, ColorChoice, GiftWrap, PaperColor, RibbonColor, WrapError, WrapOptions, WrapState,
    render_scan_table, scan_wraps, wrap_all,
};

fn scene_with_box(name: &str, size: Vec3) -> MemoryScene {
    let mut scene = MemoryScene::new();
    scene.create_box(name, size, Point3::new(0.0, size.y / 2.0, 0.0)).expect("box");
    scene
}

fn fixed_colors() -> WrapOptions {
    WrapOptions::default().with_colors(ColorChoice::named("white"), ColorChoice::named("yellow"))
}

#[test]
fn cube_is_wrapped_with_the_overlap_plane() {
    let mut scene = scene_with_box("cube", Vec3::new(1.0, 1.0, 1.0));
    let wrap = GiftWrap::create(&mut scene, "cube", &fixed_colors(), &mut StdRng::seed_from_u64(21)).expect("wrap");

    let plane = scene.mesh_positions(&wrap.names().plane()).expect("plane");
    assert_eq!(plane.len(), FoldTopology::Overlap.vertex_count());
    assert_eq!(scene.cluster_count(&wrap.names().plane()).expect("plane"), 16);
}

#[test]
fn flat_wide_box_uses_the_simple_plane() {
    let mut scene = scene_with_box("board", Vec3::new(6.0, 1.0, 6.0));
    let wrap = GiftWrap::create(&mut scene, "board", &fixed_colors(), &mut StdRng::seed_from_u64(22)).expect("wrap");

    let plane = scene.mesh_positions(&wrap.names().plane()).expect("plane");
    assert_eq!(plane.len(), 28);
    assert_eq!(FoldTopology::Simple.vertex_count(), 28);
}

#[test]
fn stored_settings_survive_a_reload() {
    let mut scene = scene_with_box("parcel", Vec3::new(2.0, 1.0, 3.0));
    let options = WrapOptions::default()
        .with_thickness(0.03)
        .with_ribbon_size(RibbonSize::M)
        .with_colors(ColorChoice::named("Blue"), ColorChoice::named("green"))
        .with_animation_range(5, 40);
    let created = GiftWrap::create(&mut scene, "parcel", &options, &mut StdRng::seed_from_u64(23)).expect("wrap");

    let loaded = GiftWrap::load(&scene, &created.control()).expect("load");
    let state = loaded.state();
    assert_eq!(state.name, "parcel");
    assert_eq!(state.thickness, 0.03);
    assert_eq!(state.paper_color, PaperColor::Blue);
    assert_eq!(state.ribbon_color, RibbonColor::Green);
    assert_eq!(state.ribbon_size, RibbonSize::M);
    assert_eq!((state.anim_start, state.anim_end), (5, 40));
    assert_eq!(scene.keyframes(&created.control(), ATTR_ANIMATION), vec![(5.0, 0.0), (40.0, 15.0)]);

    let xml = state.to_xml().expect("xml");
    assert_eq!(&WrapState::from_xml(&xml).expect("parse"), state);
}

#[test]
fn ribbon_size_round_trip_is_lossy() {
    let mut scene = scene_with_box("parcel", Vec3::new(2.0, 1.0, 3.0));
    let options = fixed_colors().with_ribbon_size(RibbonSize::S);
    let mut wrap = GiftWrap::create(&mut scene, "parcel", &options, &mut StdRng::seed_from_u64(24)).expect("wrap");
    let names = wrap.names().clone();
    let scale_of = |scene: &MemoryScene, slot| scene.transform(&names.profile(slot)).expect("profile").scale.x;
    let before: Vec<f64> = ProfileSlot::ALL.iter().map(|&slot| scale_of(&scene, slot)).collect();

    wrap.change_ribbon_size(&mut scene, RibbonSize::L).expect("grow");
    for (slot, start) in ProfileSlot::ALL.iter().zip(&before) {
        assert!(Tolerance::DEFAULT.approx_eq_f64(scale_of(&scene, *slot), start * 3.5));
    }

    wrap.change_ribbon_size(&mut scene, RibbonSize::S).expect("shrink");
    for (slot, start) in ProfileSlot::ALL.iter().zip(&before) {
        assert!(Tolerance::DEFAULT.approx_eq_f64(scale_of(&scene, *slot), start * 0.875));
    }
    assert_eq!(GiftWrap::load(&scene, &wrap.control()).expect("load").state().ribbon_size, RibbonSize::S);
}

#[test]
fn scene_deformation_matches_the_cluster_stack() {
    let size = Vec3::new(2.0, 1.0, 3.0);
    let mut scene = scene_with_box("parcel", size);
    let wrap = GiftWrap::create(&mut scene, "parcel", &fixed_colors(), &mut StdRng::seed_from_u64(25)).expect("wrap");

    let (extent, _) = normalize(size).expect("extent");
    let mut pattern = FoldingPattern::solve(extent, wrap.state().thickness).expect("pattern");
    let plane = build_fold_mesh(&mut pattern).expect("plane");
    let pivots = derive_pivots(&pattern).expect("pivots");
    let clusters = derive_clusters(&pattern).expect("clusters");
    let rest = plane.positions();

    for folds in [0, 4, 8, 12, 16] {
        wrap.fold_to(&mut scene, folds).expect("fold");
        let state = apply_fold_state(folds, fold_fix(extent.height)).expect("state");
        let expected = clusters.deform(&rest, &pivots, |p| state.pose(p));
        let actual = scene.mesh_positions(&wrap.names().plane()).expect("plane");
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(&expected).enumerate() {
            assert!(Tolerance::LOOSE.approx_eq_point3(*a, *e), "fold {folds}, vertex {i}: {a:?} != {e:?}");
        }
    }
}

#[test]
fn partial_fold_moves_only_the_folded_flaps() {
    let mut scene = scene_with_box("parcel", Vec3::new(2.0, 1.0, 3.0));
    let wrap = GiftWrap::create(&mut scene, "parcel", &fixed_colors(), &mut StdRng::seed_from_u64(26)).expect("wrap");

    wrap.fold_to(&mut scene, 2).expect("fold");
    let folded = scene.transform(&wrap.names().cluster(PivotId::B2)).expect("b2");
    let waiting = scene.transform(&wrap.names().cluster(PivotId::U1)).expect("u1");
    assert!(Tolerance::DEFAULT.approx_eq_f64(folded.rotate.x + folded.rotate.z, -90.0));
    assert_eq!(waiting.rotate, Vec3::ZERO);

    let up = scene.extrusion(&wrap.names().ribbon_extrusion(TieSegment::Up)).expect("up");
    assert_eq!(up.reveal, 0.0);
}

#[test]
fn scan_lists_healthy_wraps_and_reports_the_rest() {
    let mut scene = MemoryScene::new();
    for (i, name) in ["one", "two", "three"].iter().enumerate() {
        let x = [0.0, 10.0, 20.0][i];
        scene.create_box(name, Vec3::new(2.0, 1.0, 3.0), Point3::new(x, 0.5, 0.0)).expect("box");
    }
    let controls: Vec<String> =
        wrap_all(&mut scene, &["one", "two", "three"], &fixed_colors(), &mut StdRng::seed_from_u64(27))
            .into_iter()
            .map(|r| r.expect("wrap").control())
            .collect();

    let broken = GiftWrap::load(&scene, &controls[1]).expect("load");
    scene.delete(&broken.names().ribbon_extrusion(TieSegment::Knot)).expect("break");

    let report = scan_wraps(&scene);
    let mut found = report.controls();
    found.sort();
    let mut healthy = vec![controls[0].clone(), controls[2].clone()];
    healthy.sort();
    assert_eq!(found, healthy);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].1, WrapError::Lookup { .. }));

    let table = render_scan_table(&report.wraps);
    assert_eq!(table.lines().count(), 4);
    assert!(table.contains("WHITE"));
}

#[test]
fn removing_a_wrap_leaves_the_object_in_place() {
    let mut scene = scene_with_box("parcel", Vec3::new(6.0, 1.0, 6.0));
    let before = scene.bbox("parcel").expect("bbox");
    let wrap = GiftWrap::create(&mut scene, "parcel", &fixed_colors(), &mut StdRng::seed_from_u64(28)).expect("wrap");
    let control = wrap.control();

    wrap.remove(&mut scene).expect("remove");
    assert!(!scene.exists(&control));
    assert!(scan_wraps(&scene).wraps.is_empty());
    let after = scene.bbox("parcel").expect("bbox");
    assert!(Tolerance::LOOSE.approx_eq_vec3(after.size(), before.size()));
}

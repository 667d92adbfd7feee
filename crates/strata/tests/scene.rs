//! Scene tests
//!
//! Tests for:
//! - Root sequence under create/destroy churn
//! - Handle validation (null, stale, foreign)
//! - Component uniqueness and idempotent removal
//! - Render order and visibility

use strata::backend::HeadlessWindow;
use strata::error::SceneError;
use strata::math::{Transform, Vec3};
use strata::mesh::{Assets, Material, PrimitiveShape};
use strata::scene::{Entity, MeshRenderer, Name, Scene};

// ============================================================================
// Helper
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(Vec3);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tag(u32);

fn names(scene: &Scene) -> Vec<String> {
    scene
        .roots()
        .iter()
        .map(|&e| scene.get_component::<Name>(e).unwrap().to_string())
        .collect()
}

/// Deterministic pseudo-random sequence (xorshift), so churn tests are
/// reproducible without a dev-dependency.
struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

// ============================================================================
// Root sequence
// ============================================================================

#[test]
fn roots_match_live_entities_in_creation_order() {
    let mut scene = Scene::new("churn");
    let mut rng = XorShift(0x9e37_79b9);
    let mut live: Vec<Entity> = Vec::new();

    for step in 0..500 {
        if live.is_empty() || rng.next() % 3 != 0 {
            live.push(scene.create_entity(format!("e{step}")));
        } else {
            let victim = live.remove(rng.next() as usize % live.len());
            scene.destroy_entity(victim).unwrap();
            assert!(!scene.is_alive(victim));
        }
        assert_eq!(scene.roots(), live.as_slice(), "step {step}");
    }
    assert_eq!(scene.entity_count(), live.len());
}

#[test]
fn new_entities_carry_transform_and_name() {
    let mut scene = Scene::new("defaults");
    let e = scene.create_entity("player");
    assert_eq!(scene.get_component::<Name>(e).unwrap().as_str(), "player");
    assert_eq!(*scene.get_component::<Transform>(e).unwrap(), Transform::default());
    assert_eq!(scene.find_by_name("player"), Some(e));
    assert_eq!(scene.find_by_name("nobody"), None);
}

// ============================================================================
// Handle validation
// ============================================================================

#[test]
fn null_handle_is_rejected_everywhere() {
    let mut scene = Scene::new("null");
    let null = Entity::default();
    assert!(null.is_null());
    assert_eq!(
        scene.add_component(null, Tag(1)).unwrap_err(),
        SceneError::InvalidEntity
    );
    assert_eq!(
        scene.get_component::<Transform>(null).unwrap_err(),
        SceneError::InvalidEntity
    );
    assert_eq!(
        scene.remove_component::<Tag>(null).unwrap_err(),
        SceneError::InvalidEntity
    );
    assert_eq!(scene.destroy_entity(null).unwrap_err(), SceneError::InvalidEntity);
    assert!(!scene.has_component::<Transform>(null));
}

#[test]
fn stale_handle_never_reaches_the_reused_slot() {
    let mut scene = Scene::new("stale");
    let old = scene.create_entity("old");
    scene.destroy_entity(old).unwrap();
    let new = scene.create_entity("new");
    assert_eq!(new.id().index(), old.id().index(), "slot is reused");

    assert!(matches!(
        scene.get_component::<Name>(old),
        Err(SceneError::StaleEntity { .. })
    ));
    assert_eq!(scene.get_component::<Name>(new).unwrap().as_str(), "new");
}

#[test]
fn foreign_handle_is_rejected() {
    let mut a = Scene::new("a");
    let mut b = Scene::new("b");
    let in_a = a.create_entity("x");
    b.create_entity("y");
    assert!(matches!(
        b.add_component(in_a, Tag(0)),
        Err(SceneError::ForeignEntity { .. })
    ));
    assert!(!b.is_alive(in_a));
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn duplicate_attach_keeps_the_original() {
    let mut scene = Scene::new("dup");
    let e = scene.create_entity("e");
    scene.add_component(e, Velocity(Vec3::X)).unwrap();
    assert!(scene.has_component::<Velocity>(e));

    let err = scene.add_component(e, Velocity(Vec3::Y)).unwrap_err();
    assert!(matches!(err, SceneError::DuplicateComponent { .. }));
    assert_eq!(*scene.get_component::<Velocity>(e).unwrap(), Velocity(Vec3::X));

    assert_eq!(
        scene.insert_component(e, Velocity(Vec3::Z)).unwrap(),
        Some(Velocity(Vec3::X))
    );
}

#[test]
fn remove_is_idempotent() {
    let mut scene = Scene::new("remove");
    let e = scene.create_entity("e");
    scene.add_component(e, Tag(7)).unwrap();
    assert_eq!(scene.remove_component::<Tag>(e).unwrap(), Some(Tag(7)));
    assert_eq!(scene.remove_component::<Tag>(e).unwrap(), None);
    assert!(matches!(
        scene.get_component::<Tag>(e),
        Err(SceneError::MissingComponent { .. })
    ));
}

#[test]
fn spawn_builder_chains_components() {
    let mut scene = Scene::new("builder");
    let e = scene
        .spawn("ship")
        .insert(Velocity(Vec3::ONE))
        .and_then(|b| b.insert(Tag(3)))
        .unwrap()
        .entity();
    assert_eq!(scene.count::<Velocity>(), 1);
    assert!(e.has_component::<Tag>(&scene));
    assert!(scene.spawn("again").insert(Tag(1)).is_ok());
}

#[test]
fn queued_destroys_apply_on_flush() {
    let mut scene = Scene::new("queue");
    let doomed: Vec<_> = (0..3).map(|i| scene.create_entity(format!("d{i}"))).collect();
    let keeper = scene.create_entity("keeper");

    for &e in scene.roots().to_vec().iter() {
        if e != keeper {
            scene.queue_destroy(e).unwrap();
        }
    }
    scene.queue_destroy(doomed[0]).unwrap();
    assert_eq!(scene.entity_count(), 4, "nothing happens until the flush");

    assert_eq!(scene.flush_destroy_queue(), 3);
    assert_eq!(names(&scene), vec!["keeper"]);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn draws_follow_root_order_after_churn() {
    let mut assets = Assets::new();
    let cube = assets.meshes.add_primitive(PrimitiveShape::UNIT_CUBE);
    let sphere = assets.meshes.add_primitive(PrimitiveShape::UNIT_SPHERE);
    let grey = assets.materials.add(Material::default());

    let mut scene = Scene::new("render");
    let a = scene.create_entity("a");
    let b = scene.create_entity("b");
    let c = scene.create_entity("c");
    for &e in &[a, b, c] {
        scene.add_component(e, MeshRenderer::new(cube, grey)).unwrap();
    }
    // Removing `a` swap-moves `c` to the front of the packed renderer set.
    scene.destroy_entity(a).unwrap();
    let d = scene.create_entity("d");
    scene.add_component(d, MeshRenderer::new(sphere, grey)).unwrap();
    scene.transform_mut(d).unwrap().set_position(Vec3::new(0.0, 5.0, 0.0));

    let mut window = HeadlessWindow::default();
    assert_eq!(scene.render(&mut window), 3);

    let draws = window.draws();
    let meshes: Vec<_> = draws.iter().map(|(m, _, _)| *m).collect();
    assert_eq!(meshes, vec![cube, cube, sphere]);
    assert_eq!(draws[2].2.w_axis.y, 5.0);
}

#[test]
fn hidden_and_rendererless_entities_are_not_drawn() {
    let mut assets = Assets::new();
    let cube = assets.meshes.add_primitive(PrimitiveShape::UNIT_CUBE);
    let grey = assets.materials.add(Material::default());

    let mut scene = Scene::new("visibility");
    for i in 0..100 {
        scene.create_entity(format!("bare{i}"));
    }
    let shown = scene.create_entity("shown");
    scene.add_component(shown, MeshRenderer::new(cube, grey)).unwrap();
    let hidden = scene.create_entity("hidden");
    scene
        .add_component(hidden, MeshRenderer::new(cube, grey).hidden())
        .unwrap();

    let mut window = HeadlessWindow::default();
    assert_eq!(scene.render(&mut window), 1);
    assert_eq!(window.draws().len(), 1);
}

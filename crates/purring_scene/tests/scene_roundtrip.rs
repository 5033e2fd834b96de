//! # Scene Round-Trip Tests
//!
//! Capture a context, write it out, tear it down and restore it, checking
//! that handles, descriptors and component values come back intact.
//!
//! Run with: cargo test -p purring_scene --test scene_roundtrip

use std::collections::BTreeMap;

use purring_core::{Collider, EcsConfig, EcsContext, EntityId, RigidBody, Transform, Vec2};
use purring_scene::{
    capture, from_toml_str, load_from_file, restore, save_to_file, to_toml_string,
    ComponentBlock, EntityRecord, SceneRecord,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn context() -> EcsContext {
    EcsContext::new(EcsConfig::default()).unwrap()
}

/// A parent with a body and a tagged child with a collider.
fn populate(ctx: &mut EcsContext) -> (EntityId, EntityId) {
    let body = RigidBody {
        velocity: Vec2::new(3.0, -1.5),
        ..RigidBody::dynamic(2.5)
    };
    let parent = ctx
        .factory
        .create_entity_with(&mut ctx.registry, (Transform::at(10.0, 20.0), body))
        .unwrap();
    ctx.registry.rename(parent, "Cat").unwrap();

    let child = ctx.create_from_prefab("GameObject").unwrap();
    ctx.registry.set_parent(child, Some(parent)).unwrap();
    ctx.registry.set_layer(child, 3).unwrap();
    ctx.registry.set_active(child, false).unwrap();
    ctx.assign_tag(child, "Whisker").unwrap();
    (parent, child)
}

#[test]
fn restore_after_destroy_reclaims_saved_handles() {
    let mut ctx = context();
    let (parent, child) = populate(&mut ctx);
    let body = *ctx.registry.get::<RigidBody>(parent).unwrap();
    let scene = capture(&ctx);

    ctx.remove_entity(child).unwrap();
    ctx.remove_entity(parent).unwrap();
    assert!(ctx.registry.is_empty());

    let report = restore(&mut ctx, &scene).unwrap();
    assert!(report.remapped.is_empty());
    assert_eq!(report.restored, vec![parent, child]);

    assert_eq!(ctx.registry.name(parent), Some("Cat"));
    assert_eq!(ctx.registry.get::<Transform>(parent).unwrap(), &Transform::at(10.0, 20.0));
    assert_eq!(ctx.registry.get::<RigidBody>(parent).unwrap(), &body);
    assert!(!ctx.registry.has::<Collider>(parent));

    assert_eq!(ctx.registry.parent(child), Some(parent));
    assert_eq!(ctx.registry.children(parent), vec![child]);
    assert!(!ctx.registry.is_active(child));
    assert!(ctx.registry.has::<Collider>(child));
    assert!(ctx.tags.has_tags(&ctx.registry, child, &["Whisker"]));

    let descriptor = ctx.registry.descriptor(child).unwrap();
    assert_eq!(descriptor.layer, 3);
    assert_eq!(descriptor.scene_id, child);
    assert_eq!(descriptor.save_id, Some(child));
    ctx.registry.validate().unwrap();
}

#[test]
fn occupied_handles_are_remapped_and_links_follow() {
    let mut source = context();
    let (parent, child) = populate(&mut source);
    let scene = capture(&source);

    let mut target = context();
    let squatters: Vec<_> = (0..2).map(|_| target.registry.create_entity()).collect();
    target.registry.assign_with(squatters[0], Transform::at(-1.0, -1.0)).unwrap();

    let report = restore(&mut target, &scene).unwrap();
    assert_eq!(report.remapped.len(), 2);
    let new_parent = report.handle_of(parent).unwrap();
    let new_child = report.handle_of(child).unwrap();
    assert!(!squatters.contains(&new_parent));
    assert!(!squatters.contains(&new_child));

    // existing data is untouched
    assert_eq!(
        target.registry.get::<Transform>(squatters[0]).unwrap(),
        &Transform::at(-1.0, -1.0)
    );
    assert!(target.registry.signature(squatters[1]).unwrap().is_empty());

    assert_eq!(target.registry.parent(new_child), Some(new_parent));
    assert_eq!(target.registry.get::<Transform>(new_parent).unwrap(), &Transform::at(10.0, 20.0));
    // the stable identity is the one from the document
    assert_eq!(target.registry.scene_id(new_child), Some(child));
    assert_eq!(target.registry.len(), 4);
    target.registry.validate().unwrap();
}

#[test]
fn remapped_records_leave_later_saved_handles_alone() {
    let mut source = context();
    let first = source.registry.create_entity();
    let second = source.registry.create_entity();
    source.registry.assign_with(second, Transform::at(3.0, 4.0)).unwrap();
    let scene = capture(&source);

    // only the first saved handle is taken
    let mut target = context();
    let squatter = target.registry.create_entity();
    assert_eq!(squatter, first);

    let report = restore(&mut target, &scene).unwrap();
    assert_eq!(report.remapped, vec![(first, EntityId::new(2, 0))]);
    assert_eq!(report.handle_of(second), Some(second));
    assert_eq!(target.registry.get::<Transform>(second).unwrap(), &Transform::at(3.0, 4.0));
    assert_eq!(target.registry.len(), 3);
    target.registry.validate().unwrap();
}

#[test]
fn toml_document_survives_a_file_round_trip() {
    let mut ctx = context();
    populate(&mut ctx);
    let scene = capture(&ctx);

    let text = to_toml_string(&scene).unwrap();
    assert!(text.contains("Whisker"));
    assert_eq!(from_toml_str(&text).unwrap(), scene);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.toml");
    save_to_file(&ctx, &path).unwrap();

    let mut fresh = context();
    let report = load_from_file(&mut fresh, &path).unwrap();
    assert!(report.remapped.is_empty());
    assert_eq!(capture(&fresh).entities.len(), scene.entities.len());
    for (before, after) in scene.entities.iter().zip(&capture(&fresh).entities) {
        assert_eq!(before.components, after.components);
        assert_eq!(before.parent, after.parent);
    }
}

#[test]
fn unknown_components_are_skipped() {
    let mut components = BTreeMap::new();
    components.insert(
        "Renderer".to_owned(),
        ComponentBlock {
            bytes: vec![0; 16],
        },
    );
    components.insert(
        "Transform".to_owned(),
        ComponentBlock {
            bytes: vec![0; std::mem::size_of::<Transform>()],
        },
    );
    let scene = SceneRecord {
        entities: vec![EntityRecord {
            name: "Ghost".to_owned(),
            active: true,
            layer: 0,
            tags: Vec::new(),
            handle: EntityId::new(4, 0).into(),
            scene_id: EntityId::new(4, 0).into(),
            parent: Some(EntityId::new(9, 0).into()),
            save_id: None,
            components,
        }],
        ..SceneRecord::default()
    };

    let mut ctx = context();
    let report = restore(&mut ctx, &scene).unwrap();
    let ghost = EntityId::new(4, 0);
    assert_eq!(report.restored, vec![ghost]);
    assert_eq!(report.skipped_components, vec![(ghost, "Renderer".to_owned())]);
    assert!(ctx.registry.has::<Transform>(ghost));
    // parent outside the document is dropped
    assert_eq!(ctx.registry.parent(ghost), None);
    ctx.registry.validate().unwrap();
}

#[test]
fn random_scenes_restore_component_for_component() {
    for seed in [3u64, 17, 256] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx = context();
        let mut ids = Vec::new();
        for _ in 0..64 {
            let id = ctx.registry.create_entity();
            if rng.gen_bool(0.7) {
                let t = Transform::at(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0));
                ctx.registry.assign_with(id, t).unwrap();
            }
            if rng.gen_bool(0.5) {
                ctx.registry.assign_with(id, RigidBody::dynamic(rng.gen_range(0.5..10.0))).unwrap();
            }
            if rng.gen_bool(0.3) {
                ctx.registry.assign::<Collider>(id).unwrap();
            }
            if !ids.is_empty() && rng.gen_bool(0.25) {
                let parent = ids[rng.gen_range(0..ids.len())];
                ctx.registry.set_parent(id, Some(parent)).unwrap();
            }
            ids.push(id);
        }
        // leave holes so restored handles are not just 0..n
        for _ in 0..16 {
            let victim = ids.swap_remove(rng.gen_range(0..ids.len()));
            ctx.remove_entity(victim).unwrap();
        }

        let scene = capture(&ctx);
        let mut fresh = context();
        let report = restore(&mut fresh, &scene).unwrap();
        assert!(report.remapped.is_empty());
        fresh.registry.validate().unwrap();

        for id in &ids {
            assert_eq!(fresh.registry.signature(*id), ctx.registry.signature(*id));
            assert_eq!(fresh.registry.try_get::<Transform>(*id), ctx.registry.try_get::<Transform>(*id));
            assert_eq!(fresh.registry.try_get::<RigidBody>(*id), ctx.registry.try_get::<RigidBody>(*id));
            assert_eq!(fresh.registry.parent(*id), ctx.registry.parent(*id));
        }
    }
}

//! # Entity Registry Benchmark
//!
//! Measures the operations systems hit every frame:
//! 1. Creating and destroying entities with components
//! 2. Assign/remove churn that keeps the membership cache in step
//! 3. Walking a cached scene view and mutating components from a snapshot

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use purring_core::{EcsConfig, EcsContext, EntityId, RigidBody, SceneView, Transform, Vec2};

const ENTITY_COUNT: usize = 10_000;

fn populated_context() -> (EcsContext, Vec<EntityId>) {
    let mut ctx = EcsContext::new(EcsConfig::default()).expect("default config is valid");
    let ids = (0..ENTITY_COUNT)
        .map(|i| {
            ctx.factory
                .create_entity_with(
                    &mut ctx.registry,
                    (Transform::at(i as f32, 0.0), RigidBody::dynamic(1.0)),
                )
                .expect("pools grow without limit")
        })
        .collect();
    SceneView::<(Transform, RigidBody)>::prepare(&mut ctx.registry).expect("types registered");
    (ctx, ids)
}

// =============================================================================
// LIFECYCLE
// =============================================================================

fn bench_create_destroy(c: &mut Criterion) {
    let (mut ctx, _) = populated_context();

    c.bench_function("create_destroy_1K_with_components", |b| {
        b.iter(|| {
            let mut batch = Vec::with_capacity(1_000);
            for _ in 0..1_000 {
                let id = ctx.create_from_prefab("GameObject").expect("prefab exists");
                batch.push(id);
            }
            for id in batch {
                ctx.remove_entity(id).expect("entity is alive");
            }
            black_box(ctx.registry.len())
        });
    });
}

fn bench_assign_remove_churn(c: &mut Criterion) {
    let (mut ctx, ids) = populated_context();

    c.bench_function("remove_assign_rigidbody_1K", |b| {
        b.iter(|| {
            for id in ids.iter().take(1_000) {
                ctx.registry.remove::<RigidBody>(*id).expect("entity is alive");
            }
            for id in ids.iter().take(1_000) {
                ctx.registry.assign::<RigidBody>(*id).expect("entity is alive");
            }
            black_box(ctx.registry.len())
        });
    });
}

// =============================================================================
// ITERATION
// =============================================================================

fn bench_view_iteration(c: &mut Criterion) {
    let (ctx, _) = populated_context();

    c.bench_function("scene_view_read_10K", |b| {
        b.iter(|| {
            let view = SceneView::<(Transform, RigidBody)>::new(&ctx.registry);
            let mut sum = 0.0f32;
            for id in &view {
                if let Some(t) = view.get::<Transform>(id) {
                    sum += t.position.x;
                }
            }
            black_box(sum)
        });
    });
}

fn bench_physics_step(c: &mut Criterion) {
    let (mut ctx, _) = populated_context();

    c.bench_function("snapshot_integrate_10K", |b| {
        b.iter(|| {
            let work = ctx
                .registry
                .view::<(Transform, RigidBody)>()
                .expect("types registered")
                .snapshot();
            for id in work {
                let v = ctx.registry.get::<RigidBody>(id).map(|rb| rb.velocity);
                if let (Ok(v), Ok(t)) = (v, ctx.registry.get_mut::<Transform>(id)) {
                    t.translate(Vec2::new(v.x * 0.016, v.y * 0.016));
                }
            }
            black_box(ctx.registry.len())
        });
    });
}

criterion_group!(
    benches,
    bench_create_destroy,
    bench_assign_remove_churn,
    bench_view_iteration,
    bench_physics_step,
);

criterion_main!(benches);

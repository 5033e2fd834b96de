//! # Systems
//!
//! An update pass is a [`System`] run against the [`EcsContext`] once per
//! frame. A [`SystemSchedule`] runs its systems in insertion order.
//!
//! Systems usually take a [`SceneView`](crate::ecs::SceneView) snapshot from
//! [`EntityRegistry::view`](crate::ecs::EntityRegistry::view) as their work
//! list, then read and write components through the registry.

use crate::context::EcsContext;
use crate::error::EcsResult;

/// A unit of per-frame logic.
pub trait System {
    /// Human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Runs one update pass.
    ///
    /// # Errors
    ///
    /// Whatever storage error the pass could not handle itself.
    fn run(&mut self, ctx: &mut EcsContext, dt: f32) -> EcsResult<()>;
}

/// A [`System`] backed by a closure.
pub struct FnSystem<F>
where
    F: FnMut(&mut EcsContext, f32) -> EcsResult<()>,
{
    name: &'static str,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut EcsContext, f32) -> EcsResult<()>,
{
    /// Wraps a closure as a named system.
    pub const fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut EcsContext, f32) -> EcsResult<()>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&mut self, ctx: &mut EcsContext, dt: f32) -> EcsResult<()> {
        (self.f)(ctx, dt)
    }
}

/// Ordered list of systems.
#[derive(Default)]
pub struct SystemSchedule {
    systems: Vec<Box<dyn System>>,
}

impl SystemSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a system.
    pub fn add(&mut self, system: impl System + 'static) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Appends a closure as a named system.
    pub fn add_fn<F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: FnMut(&mut EcsContext, f32) -> EcsResult<()> + 'static,
    {
        self.add(FnSystem::new(name, f))
    }

    /// Number of systems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Checks if the schedule has no systems.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Names of the systems in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Runs every system once, in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first system error.
    pub fn run(&mut self, ctx: &mut EcsContext, dt: f32) -> EcsResult<()> {
        for system in &mut self.systems {
            if let Err(err) = system.run(ctx, dt) {
                tracing::warn!("System {} failed: {}", system.name(), err);
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::config::EcsConfig;
    use crate::ecs::{EntityId, RigidBody, Transform, Vec2};

    struct Integrate;

    impl System for Integrate {
        fn name(&self) -> &'static str {
            "integrate"
        }

        fn run(&mut self, ctx: &mut EcsContext, dt: f32) -> EcsResult<()> {
            let work = ctx.registry.view::<(Transform, RigidBody)>()?.snapshot();
            for id in work {
                let velocity = ctx.registry.get::<RigidBody>(id)?.velocity;
                ctx.registry
                    .get_mut::<Transform>(id)?
                    .translate(Vec2::new(velocity.x * dt, velocity.y * dt));
            }
            Ok(())
        }
    }

    fn moving(ctx: &mut EcsContext, vx: f32) -> EntityId {
        let body = RigidBody {
            velocity: Vec2::new(vx, 0.0),
            ..RigidBody::default()
        };
        ctx.factory
            .create_entity_with(&mut ctx.registry, (Transform::default(), body))
            .unwrap()
    }

    #[test]
    fn test_schedule_runs_in_order() {
        let mut ctx = EcsContext::new(EcsConfig::default()).unwrap();
        let fast = moving(&mut ctx, 2.0);
        let still = ctx
            .factory
            .create_entity::<(Transform,)>(&mut ctx.registry)
            .unwrap();

        let mut schedule = SystemSchedule::new();
        schedule.add(Integrate).add_fn("count", |ctx, _| {
            assert_eq!(ctx.registry.len(), 2);
            Ok(())
        });
        assert_eq!(schedule.names(), vec!["integrate", "count"]);

        schedule.run(&mut ctx, 0.5).unwrap();
        assert!((ctx.registry.get::<Transform>(fast).unwrap().position.x - 1.0).abs() < f32::EPSILON);
        assert!(ctx.registry.get::<Transform>(still).unwrap().position.x.abs() < f32::EPSILON);
    }

    #[test]
    fn test_schedule_stops_on_error() {
        let mut ctx = EcsContext::new(EcsConfig::default()).unwrap();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let mut schedule = SystemSchedule::new();
        schedule
            .add_fn("fail", |ctx, _| ctx.registry.remove_entity(EntityId::new(9, 0)))
            .add_fn("after", move |_, _| {
                flag.set(true);
                Ok(())
            });
        assert!(schedule.run(&mut ctx, 0.016).is_err());
        assert!(!ran.get());
    }
}

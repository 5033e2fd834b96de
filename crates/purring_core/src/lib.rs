//! # Purring Engine Core
//!
//! Entity storage for a real-time 2D engine:
//! - identity for every game object, with stale-handle detection
//! - dense per-type component pools
//! - cached "all entities holding {A, B, ...}" work lists for systems
//!
//! ## Architecture Rules
//!
//! 1. **One owner** - the [`EcsContext`] owns all entity state and is passed explicitly
//! 2. **Mutate through the registry** - pools and caches are never touched directly
//! 3. **No mutation while iterating** - a [`SceneView`] borrows the registry
//!
//! ## Example
//!
//! ```rust,ignore
//! use purring_core::{EcsConfig, EcsContext, RigidBody, Transform};
//!
//! let mut ctx = EcsContext::new(EcsConfig::default())?;
//! let cat = ctx.create_from_prefab("GameObject")?;
//! ctx.registry.get_mut::<Transform>(cat)?.position.x = 4.0;
//!
//! for id in &ctx.registry.view::<(Transform, RigidBody)>()? {
//!     // physics step
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod context;
pub mod ecs;
pub mod error;
pub mod system;

pub use config::{EcsConfig, EntityConfig, PoolConfig};
pub use context::EcsContext;
pub use ecs::{
    Collider, Component, ComponentBundle, ComponentPool, ComponentSet, ComponentTag,
    EntityDescriptor, EntityFactory, EntityId, EntityRegistry, RequestedHandle, RigidBody,
    SceneView, TagRegistry, Transform, Vec2,
};
pub use error::{EcsError, EcsResult};
pub use system::{FnSystem, System, SystemSchedule};

//! # Entity Component System
//!
//! Storage core shared by every engine subsystem.
//!
//! ## Design Philosophy
//!
//! - Components are plain data stored in dense, type-erased pools
//! - Entity IDs are indices with generation counters
//! - Set membership is cached and kept exact on every structural mutation
//! - Iteration borrows the registry, so it cannot observe a half-applied change

mod bundle;
mod component;
mod descriptor;
mod entity;
mod factory;
mod membership;
mod registry;
mod signature;
mod storage;
mod tags;
mod view;

pub use bundle::ComponentBundle;
pub use component::{Collider, Component, RigidBody, Transform, Vec2};
pub use descriptor::EntityDescriptor;
pub use entity::{EntityAllocator, EntityId, EntitySlot};
pub use factory::{EntityFactory, DEFAULT_PREFAB};
pub use membership::MembershipCache;
pub use registry::{EntityRegistry, RequestedHandle};
pub use signature::{
    ComponentInfo, ComponentSet, ComponentTag, ComponentTypes, MAX_COMPONENT_ALIGN,
    MAX_COMPONENT_TYPES,
};
pub use storage::ComponentPool;
pub use tags::{TagRegistry, MAX_TAGS};
pub use view::{SceneIter, SceneView};

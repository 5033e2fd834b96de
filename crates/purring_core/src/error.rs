//! # Storage Error Types
//!
//! All errors that can occur in the entity storage core.
//!
//! Integrity errors (`AllocationFailure`, `HandleCollision`) are recoverable:
//! the registry logs them and leaves its state as it was before the call.
//! The remaining variants are programmer errors handed back to the caller.

use thiserror::Error;

use crate::ecs::{ComponentSet, ComponentTag, EntityId};

/// Errors that can occur in the storage core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A component name or tag was never registered.
    #[error("unknown component type: {0}")]
    UnknownComponentType(String),

    /// The entity is alive but does not hold the requested component.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// Name of the missing component.
        component: &'static str,
    },

    /// A pool could not grow to hold another component.
    #[error("allocation failure: pool for {component} could not grow from {capacity} to {requested} slots")]
    AllocationFailure {
        /// Name of the component whose pool failed to grow.
        component: &'static str,
        /// Capacity before the attempt.
        capacity: usize,
        /// Capacity that was requested.
        requested: usize,
    },

    /// A requested handle is already live or reserved.
    #[error("handle collision: {0} is already taken")]
    HandleCollision(EntityId),

    /// The handle was destroyed or never created.
    #[error("invalid entity handle: {0}")]
    InvalidHandle(EntityId),

    /// All component tag bits are in use.
    #[error("too many component types: limit is {limit}")]
    TooManyComponentTypes {
        /// Maximum number of component types.
        limit: usize,
    },

    /// The component layout cannot be stored in a word-aligned pool.
    #[error("component {component} has alignment {align}, pools support at most {max}")]
    UnsupportedComponentLayout {
        /// Name of the rejected component.
        component: &'static str,
        /// Alignment of the rejected component.
        align: usize,
        /// Largest supported alignment.
        max: usize,
    },

    /// Raw component bytes do not match the component size.
    #[error("invalid data for component {component}: expected {expected} bytes, got {actual}")]
    InvalidComponentData {
        /// Name of the component.
        component: &'static str,
        /// Size of the component in bytes.
        expected: usize,
        /// Size of the supplied data.
        actual: usize,
    },

    /// Re-parenting would make an entity its own ancestor.
    #[error("setting parent of {child} to {parent} would create a cycle")]
    HierarchyCycle {
        /// Entity being re-parented.
        child: EntityId,
        /// Requested parent.
        parent: EntityId,
    },

    /// No prefab with this name is registered.
    #[error("unknown prefab: {0}")]
    UnknownPrefab(String),

    /// All gameplay tag bits are in use.
    #[error("tag limit reached: cannot add tag {0}")]
    TagLimitReached(String),

    /// A membership bucket disagrees with the component pools.
    #[error("membership cache drift for set {set}: {detail}")]
    MembershipDrift {
        /// The component set whose bucket drifted.
        set: ComponentSet,
        /// Description of the mismatch.
        detail: String,
    },

    /// A pool's live count disagrees with its index map.
    #[error("pool {tag} out of sync: {detail}")]
    PoolDesync {
        /// Tag of the pool.
        tag: ComponentTag,
        /// Description of the mismatch.
        detail: String,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage operations.
pub type EcsResult<T> = Result<T, EcsError>;

//! # Entity Descriptor
//!
//! Bookkeeping every entity carries from creation to destruction.
//! Descriptors link entities into a parent/child forest that is
//! independent of which components they hold.

use super::entity::EntityId;

/// Mandatory per-entity record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Display name.
    pub name: String,
    /// Parent in the descriptor forest.
    pub parent: Option<EntityId>,
    /// Direct children in attach order.
    pub children: Vec<EntityId>,
    /// Stable identity that survives save/load. Starts equal to the handle.
    pub scene_id: EntityId,
    /// Whether the entity itself is active.
    pub active: bool,
    /// Render/collision layer.
    pub layer: u32,
    /// Identity recorded by the last save, if the entity was loaded.
    pub save_id: Option<EntityId>,
    /// Gameplay tag bits, see [`TagRegistry`](crate::ecs::TagRegistry).
    pub tags: u32,
}

impl EntityDescriptor {
    /// Creates the descriptor of a new entity named `{prefix}{index}`.
    #[must_use]
    pub fn new(id: EntityId, prefix: &str) -> Self {
        Self {
            name: format!("{prefix}{}", id.index()),
            parent: None,
            children: Vec::new(),
            scene_id: id,
            active: true,
            layer: 0,
            save_id: None,
            tags: 0,
        }
    }

    /// Checks if `bit` is set in the tag mask.
    #[inline]
    #[must_use]
    pub const fn has_tag_bit(&self, bit: u32) -> bool {
        self.tags & (1 << bit) != 0
    }
}

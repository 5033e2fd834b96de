//! # Scene Records
//!
//! The persisted form of a scene: one record per entity, each holding its
//! descriptor fields and a table of named component blocks.
//!
//! ```toml
//! version = 1
//!
//! [[entities]]
//! name = "GameObject0"
//! active = true
//! layer = 0
//! tags = ["Player"]
//! handle = { index = 0, generation = 0 }
//! scene_id = { index = 0, generation = 0 }
//!
//! [entities.components.Transform]
//! bytes = [0, 0, 128, 63, ...]
//! ```

use std::collections::BTreeMap;

use purring_core::EntityId;
use serde::{Deserialize, Serialize};

/// Format version written by this build.
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// A saved entity handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleRecord {
    /// Slot index.
    pub index: u32,
    /// Generation counter.
    pub generation: u32,
}

impl From<EntityId> for HandleRecord {
    fn from(id: EntityId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

impl From<HandleRecord> for EntityId {
    fn from(record: HandleRecord) -> Self {
        Self::new(record.index, record.generation)
    }
}

/// Raw bytes of one component value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentBlock {
    /// Component value as laid out in its pool.
    pub bytes: Vec<u8>,
}

/// One saved entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Display name.
    pub name: String,
    /// Own active flag.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Render/collision layer.
    #[serde(default)]
    pub layer: u32,
    /// Gameplay tag names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Handle the entity had when saved.
    pub handle: HandleRecord,
    /// Stable scene identity.
    pub scene_id: HandleRecord,
    /// Saved handle of the parent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<HandleRecord>,
    /// Identity recorded by an earlier load, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_id: Option<HandleRecord>,
    /// Component blocks keyed by component name.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentBlock>,
}

const fn default_active() -> bool {
    true
}

/// A saved scene.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Format version, see [`SCENE_FORMAT_VERSION`].
    pub version: u32,
    /// Entities in creation order.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

impl Default for SceneRecord {
    fn default() -> Self {
        Self {
            version: SCENE_FORMAT_VERSION,
            entities: Vec::new(),
        }
    }
}

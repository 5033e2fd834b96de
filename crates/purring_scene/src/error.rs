//! # Scene Error Types
//!
//! All errors that can occur while saving or loading a scene.

use purring_core::{EcsError, EntityId};
use thiserror::Error;

/// Errors that can occur while persisting scenes.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The storage core rejected an operation.
    #[error("storage error: {0}")]
    Ecs(#[from] EcsError),

    /// The document could not be written as TOML.
    #[error("failed to serialize scene: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The document is not valid TOML or does not match the scene format.
    #[error("failed to parse scene: {0}")]
    Deserialize(#[from] toml::de::Error),

    /// A scene file could not be read or written.
    #[error("scene file error: {0}")]
    Io(#[from] std::io::Error),

    /// The document was written by an incompatible format version.
    #[error("unsupported scene version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// Two records claim the same saved handle.
    #[error("entity {0} appears twice in the scene")]
    DuplicateEntity(EntityId),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

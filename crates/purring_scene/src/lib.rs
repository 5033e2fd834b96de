//! # Purring Scene
//!
//! Save and load for the storage core.
//!
//! A scene is a list of [`EntityRecord`]s written as a TOML document. Each
//! record keeps the entity's handle, descriptor fields, gameplay tags and
//! the raw bytes of every component keyed by component name. Restoring a
//! scene claims the saved handles where they are free and remaps the rest.
//!
//! ```rust,ignore
//! use purring_core::{EcsConfig, EcsContext};
//!
//! let mut ctx = EcsContext::new(EcsConfig::default())?;
//! ctx.create_from_prefab("GameObject")?;
//! purring_scene::save_to_file(&ctx, "level.toml")?;
//!
//! let mut fresh = EcsContext::new(EcsConfig::default())?;
//! let report = purring_scene::load_from_file(&mut fresh, "level.toml")?;
//! assert!(report.remapped.is_empty());
//! # Ok::<(), purring_scene::SceneError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod record;
pub mod serializer;

pub use error::{SceneError, SceneResult};
pub use record::{ComponentBlock, EntityRecord, HandleRecord, SceneRecord, SCENE_FORMAT_VERSION};
pub use serializer::{
    capture, from_toml_str, load_from_file, restore, save_to_file, to_toml_string, RestoreReport,
};

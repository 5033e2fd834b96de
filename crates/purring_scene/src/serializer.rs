//! # Scene Serializer
//!
//! Captures the live entities of an [`EcsContext`] into a [`SceneRecord`]
//! and restores records back into a context.
//!
//! ## Restore Order
//!
//! 1. Every record claims its saved handle. Records whose handle is already
//!    live get a fresh one, allocated only after all claims are made.
//! 2. Descriptor fields, tags and components are written.
//! 3. Parents are linked through the remap table.
//!
//! A failure in any pass destroys the entities created so far and erases the
//! tags the scene introduced.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use purring_core::{EcsContext, EcsError, EntityId};

use crate::error::{SceneError, SceneResult};
use crate::record::{ComponentBlock, EntityRecord, SceneRecord, SCENE_FORMAT_VERSION};

/// Outcome of [`restore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Restored handles, in record order.
    pub restored: Vec<EntityId>,
    /// `(saved, assigned)` pairs for handles that were already taken.
    pub remapped: Vec<(EntityId, EntityId)>,
    /// Components skipped because no type with that name is registered.
    pub skipped_components: Vec<(EntityId, String)>,
}

impl RestoreReport {
    /// Handle a saved entity was restored under.
    #[must_use]
    pub fn handle_of(&self, saved: EntityId) -> Option<EntityId> {
        if let Some((_, assigned)) = self.remapped.iter().find(|(from, _)| *from == saved) {
            return Some(*assigned);
        }
        self.restored.iter().copied().find(|id| *id == saved)
    }
}

// ============================================================================
// CAPTURE
// ============================================================================

/// Captures every live entity, in creation order.
#[must_use]
pub fn capture(ctx: &EcsContext) -> SceneRecord {
    let registry = &ctx.registry;
    let mut scene = SceneRecord::default();

    for &id in registry.entities() {
        let Some(descriptor) = registry.descriptor(id) else {
            continue;
        };

        let components = registry
            .component_types()
            .iter()
            .filter(|info| registry.has_tag(id, info.tag))
            .filter_map(|info| {
                registry.component_bytes(id, info.tag).ok().map(|bytes| {
                    (
                        info.name.to_owned(),
                        ComponentBlock {
                            bytes: bytes.to_vec(),
                        },
                    )
                })
            })
            .collect();

        scene.entities.push(EntityRecord {
            name: descriptor.name.clone(),
            active: descriptor.active,
            layer: descriptor.layer,
            tags: ctx.tags.tags_of(registry, id),
            handle: id.into(),
            scene_id: descriptor.scene_id.into(),
            parent: descriptor.parent.map(Into::into),
            save_id: descriptor.save_id.map(Into::into),
            components,
        });
    }

    tracing::debug!("Captured scene with {} entities", scene.entities.len());
    scene
}

// ============================================================================
// RESTORE
// ============================================================================

/// Restores a scene into `ctx`, alongside whatever entities already exist.
///
/// # Errors
///
/// - `UnsupportedVersion` if the scene was written by another format version
/// - `DuplicateEntity` if two records share a saved handle
/// - `Ecs` if a component block or tag cannot be applied; nothing from the
///   scene is left behind in that case
pub fn restore(ctx: &mut EcsContext, scene: &SceneRecord) -> SceneResult<RestoreReport> {
    if scene.version != SCENE_FORMAT_VERSION {
        return Err(SceneError::UnsupportedVersion {
            found: scene.version,
            expected: SCENE_FORMAT_VERSION,
        });
    }

    let mut seen = HashSet::with_capacity(scene.entities.len());
    for record in &scene.entities {
        let saved = EntityId::from(record.handle);
        if !seen.insert(saved) {
            return Err(SceneError::DuplicateEntity(saved));
        }
    }

    let mut report = RestoreReport::default();
    let mut added_tags = Vec::new();
    if let Err(err) = apply(ctx, scene, &mut report, &mut added_tags) {
        for id in report.restored.drain(..) {
            if let Err(cleanup) = ctx.registry.remove_entity(id) {
                tracing::warn!("Failed to discard restored entity {}: {}", id, cleanup);
            }
        }
        for name in added_tags.iter().rev() {
            ctx.tags.erase_tag(&mut ctx.registry, name);
        }
        return Err(err);
    }

    tracing::info!(
        "Restored {} entities ({} remapped)",
        report.restored.len(),
        report.remapped.len()
    );
    Ok(report)
}

fn apply(
    ctx: &mut EcsContext,
    scene: &SceneRecord,
    report: &mut RestoreReport,
    added_tags: &mut Vec<String>,
) -> SceneResult<()> {
    let mut remap = HashMap::with_capacity(scene.entities.len());

    // A fallback handle must never land on a slot a later record saved.
    let claims: Vec<_> = scene
        .entities
        .iter()
        .map(|record| ctx.registry.try_create_entity_requested(record.handle.into()))
        .collect();

    for (record, claim) in scene.entities.iter().zip(claims) {
        let saved = EntityId::from(record.handle);
        let id = claim.unwrap_or_else(|err| {
            let assigned = ctx.registry.create_entity();
            tracing::warn!("{}, restoring as {}", err, assigned);
            report.remapped.push((saved, assigned));
            assigned
        });
        report.restored.push(id);
        remap.insert(saved, id);
    }

    for (record, &id) in scene.entities.iter().zip(&report.restored) {
        ctx.registry.rename(id, record.name.clone())?;
        ctx.registry.set_active(id, record.active)?;
        ctx.registry.set_layer(id, record.layer)?;
        ctx.registry.set_scene_id(id, record.scene_id.into())?;
        ctx.registry.set_save_id(id, Some(record.handle.into()))?;

        for tag in &record.tags {
            let defined = ctx.tags.bit_of(tag).is_some();
            ctx.assign_tag(id, tag)?;
            if !defined {
                added_tags.push(tag.clone());
            }
        }

        for (name, block) in &record.components {
            match ctx
                .factory
                .load_component(&mut ctx.registry, id, name, Some(&block.bytes))
            {
                Ok(()) => {}
                Err(EcsError::UnknownComponentType(_)) => {
                    tracing::warn!("Skipping unknown component {} on entity {}", name, id);
                    report.skipped_components.push((id, name.clone()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    for (record, &id) in scene.entities.iter().zip(&report.restored) {
        let Some(parent) = record.parent else {
            continue;
        };
        match remap.get(&EntityId::from(parent)) {
            Some(&parent) => ctx.registry.set_parent(id, Some(parent))?,
            None => tracing::warn!(
                "Parent {} of entity {} is not in the scene",
                EntityId::from(parent),
                id
            ),
        }
    }

    Ok(())
}

// ============================================================================
// DOCUMENTS
// ============================================================================

/// Writes a scene as a TOML document.
///
/// # Errors
///
/// Returns `Serialize` if the record cannot be represented in TOML.
pub fn to_toml_string(scene: &SceneRecord) -> SceneResult<String> {
    Ok(toml::to_string_pretty(scene)?)
}

/// Parses a scene from a TOML document.
///
/// # Errors
///
/// Returns `Deserialize` if the document does not describe a scene.
pub fn from_toml_str(text: &str) -> SceneResult<SceneRecord> {
    Ok(toml::from_str(text)?)
}

/// Captures `ctx` and writes it to `path`.
///
/// # Errors
///
/// Returns `Serialize` or `Io` if the document cannot be written.
pub fn save_to_file(ctx: &EcsContext, path: impl AsRef<Path>) -> SceneResult<()> {
    let path = path.as_ref();
    let text = to_toml_string(&capture(ctx))?;
    fs::write(path, text)?;
    tracing::debug!("Saved scene to {}", path.display());
    Ok(())
}

/// Reads a scene from `path` and restores it into `ctx`.
///
/// # Errors
///
/// - `Io` or `Deserialize` if the file cannot be read
/// - anything [`restore`] returns
pub fn load_from_file(ctx: &mut EcsContext, path: impl AsRef<Path>) -> SceneResult<RestoreReport> {
    let text = fs::read_to_string(path)?;
    restore(ctx, &from_toml_str(&text)?)
}

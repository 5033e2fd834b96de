//! # Gameplay Tags
//!
//! Up to [`MAX_TAGS`] named labels such as `"Player"` or `"Obstacle"`.
//! Each tag owns one bit of the `tags` mask on every entity descriptor.
//! Tags are unrelated to component types.

use super::entity::EntityId;
use super::registry::EntityRegistry;
use crate::error::{EcsError, EcsResult};

/// Maximum number of gameplay tags.
pub const MAX_TAGS: usize = 32;

/// Names of the gameplay tags, indexed by bit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagRegistry {
    names: Vec<String>,
}

impl TagRegistry {
    /// Creates an empty tag registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of defined tags.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Checks if no tags are defined.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Tag names in bit order.
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the bit of a tag.
    #[must_use]
    pub fn bit_of(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Returns the name of the tag on `bit`.
    #[must_use]
    pub fn name_of(&self, bit: u32) -> Option<&str> {
        self.names.get(bit as usize).map(String::as_str)
    }

    /// Defines a tag, returning its bit. Defining an existing tag is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TagLimitReached` if all bits are taken.
    pub fn add_tag(&mut self, name: &str) -> EcsResult<u32> {
        if let Some(bit) = self.bit_of(name) {
            return Ok(bit);
        }
        if self.names.len() >= MAX_TAGS {
            return Err(EcsError::TagLimitReached(name.to_owned()));
        }
        self.names.push(name.to_owned());
        Ok(self.names.len() as u32 - 1)
    }

    /// Renames a tag. Fails if `old` is undefined or `new` is taken.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> bool {
        if self.bit_of(new).is_some() {
            return false;
        }
        match self.names.iter_mut().find(|n| *n == old) {
            Some(name) => {
                new.clone_into(name);
                true
            }
            None => false,
        }
    }

    /// Deletes a tag and clears it from every entity.
    ///
    /// The last tag moves into the freed bit so bits stay contiguous.
    pub fn erase_tag(&mut self, registry: &mut EntityRegistry, name: &str) -> bool {
        let Some(bit) = self.bit_of(name) else {
            return false;
        };
        let last = self.names.len() as u32 - 1;

        for descriptor in registry.descriptors_mut() {
            let had_last = descriptor.has_tag_bit(last);
            descriptor.tags &= !(1 << bit);
            if bit != last {
                descriptor.tags &= !(1 << last);
                if had_last {
                    descriptor.tags |= 1 << bit;
                }
            }
        }
        self.names.swap_remove(bit as usize);
        tracing::debug!("Erased tag {}", name);
        true
    }

    /// Tags an entity, defining the tag if needed.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `TagLimitReached` if the tag is new and all bits are taken
    pub fn assign_tag(
        &mut self,
        registry: &mut EntityRegistry,
        id: EntityId,
        name: &str,
    ) -> EcsResult<()> {
        let descriptor = registry.descriptor_mut(id)?;
        let bit = self.add_tag(name)?;
        descriptor.tags |= 1 << bit;
        Ok(())
    }

    /// Removes a tag from an entity. Returns `false` if it was not set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn remove_tag(
        &self,
        registry: &mut EntityRegistry,
        id: EntityId,
        name: &str,
    ) -> EcsResult<bool> {
        let descriptor = registry.descriptor_mut(id)?;
        let Some(bit) = self.bit_of(name) else {
            return Ok(false);
        };
        let had = descriptor.has_tag_bit(bit);
        descriptor.tags &= !(1 << bit);
        Ok(had)
    }

    /// Checks if an entity holds every named tag.
    ///
    /// Undefined names and dead entities never match.
    #[must_use]
    pub fn has_tags(&self, registry: &EntityRegistry, id: EntityId, names: &[&str]) -> bool {
        let Some(mask) = self.mask_of(names) else {
            return false;
        };
        registry
            .descriptor(id)
            .is_some_and(|d| d.tags & mask == mask)
    }

    /// Returns the names of the tags an entity holds, in bit order.
    #[must_use]
    pub fn tags_of(&self, registry: &EntityRegistry, id: EntityId) -> Vec<String> {
        let Some(descriptor) = registry.descriptor(id) else {
            return Vec::new();
        };
        self.names
            .iter()
            .enumerate()
            .filter(|(bit, _)| descriptor.has_tag_bit(*bit as u32))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Returns every entity holding all named tags, in creation order.
    #[must_use]
    pub fn entities_with(&self, registry: &EntityRegistry, names: &[&str]) -> Vec<EntityId> {
        if self.mask_of(names).is_none() {
            return Vec::new();
        }
        registry
            .entities()
            .iter()
            .copied()
            .filter(|id| self.has_tags(registry, *id, names))
            .collect()
    }

    fn mask_of(&self, names: &[&str]) -> Option<u32> {
        names
            .iter()
            .try_fold(0u32, |mask, name| Some(mask | (1 << self.bit_of(name)?)))
    }
}

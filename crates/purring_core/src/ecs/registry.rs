//! # Entity Registry
//!
//! The central container for all entities and components.
//!
//! The registry exclusively owns:
//! - the handle allocator and every entity's descriptor
//! - one [`ComponentPool`] per registered component type
//! - the [`MembershipCache`] consumed by scene views
//!
//! Every structural mutation goes through here so the three stay in step.
//! A failed mutation leaves all of them as they were before the call.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::bundle::ComponentBundle;
use super::component::Component;
use super::descriptor::EntityDescriptor;
use super::entity::{EntityAllocator, EntityId};
use super::membership::MembershipCache;
use super::signature::{ComponentSet, ComponentTag, ComponentTypes};
use super::storage::ComponentPool;
use super::view::SceneView;
use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult};

/// Outcome of asking for a specific handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestedHandle {
    /// The requested handle was free and is now live.
    Granted(EntityId),
    /// The requested handle was taken; a fresh one was allocated instead.
    Remapped {
        /// Handle the caller asked for.
        requested: EntityId,
        /// Handle actually assigned.
        assigned: EntityId,
    },
}

impl RequestedHandle {
    /// Returns the live handle, whichever way it was obtained.
    #[inline]
    #[must_use]
    pub const fn handle(self) -> EntityId {
        match self {
            Self::Granted(id) => id,
            Self::Remapped { assigned, .. } => assigned,
        }
    }

    /// Checks if the request fell back to a different handle.
    #[inline]
    #[must_use]
    pub const fn is_remapped(self) -> bool {
        matches!(self, Self::Remapped { .. })
    }
}

/// The entity registry: owner of all game object state.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = EntityRegistry::default();
///
/// let entity = registry.create_entity();
/// registry.assign_with(entity, Transform::at(1.0, 2.0))?;
/// assert!(registry.has::<Transform>(entity));
/// ```
#[derive(Debug)]
pub struct EntityRegistry {
    /// Pool sizing and naming policy.
    config: EcsConfig,
    /// Handle allocator and per-entity signatures.
    allocator: EntityAllocator,
    /// Registered component types.
    types: ComponentTypes,
    /// One pool per registered type, indexed by tag.
    pools: Vec<ComponentPool>,
    /// Descriptor of every live entity.
    descriptors: HashMap<EntityId, EntityDescriptor>,
    /// Cached set membership.
    membership: MembershipCache,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::with_config(EcsConfig::default())
    }
}

impl EntityRegistry {
    /// Creates an empty registry after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a pool setting is out of range.
    pub fn new(config: EcsConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: EcsConfig) -> Self {
        Self {
            config,
            allocator: EntityAllocator::new(),
            types: ComponentTypes::new(),
            pools: Vec::new(),
            descriptors: HashMap::new(),
            membership: MembershipCache::new(),
        }
    }

    /// Returns the active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Checks if no entities are alive.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allocator.alive_count() == 0
    }

    /// Returns every live entity in creation order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        self.membership.all()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity with a fresh handle and a default descriptor.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.finish_create(id);
        id
    }

    /// Creates an entity with exactly `requested`, or fails.
    ///
    /// # Errors
    ///
    /// Returns `HandleCollision` if the handle is live, older than the
    /// slot's last generation, null, or further past the slot range than
    /// `entities.max_handle_gap` allows.
    pub fn try_create_entity_requested(&mut self, requested: EntityId) -> EcsResult<EntityId> {
        let id = self
            .allocator
            .claim(requested, self.config.entities.max_handle_gap)?;
        self.finish_create(id);
        Ok(id)
    }

    /// Creates an entity with `requested` if it is free, otherwise with a
    /// fresh handle.
    ///
    /// Two live entities never share a handle: a collision is logged and
    /// reported through [`RequestedHandle::Remapped`].
    pub fn create_entity_requested(&mut self, requested: EntityId) -> RequestedHandle {
        match self.try_create_entity_requested(requested) {
            Ok(id) => RequestedHandle::Granted(id),
            Err(err) => {
                let assigned = self.create_entity();
                tracing::warn!("{}, assigned {} instead", err, assigned);
                RequestedHandle::Remapped {
                    requested,
                    assigned,
                }
            }
        }
    }

    fn finish_create(&mut self, id: EntityId) {
        let descriptor = EntityDescriptor::new(id, &self.config.entities.default_name_prefix);
        self.descriptors.insert(id, descriptor);
        self.membership.on_create(id);
    }

    /// Checks if `id` refers to a live entity.
    #[inline]
    #[must_use]
    pub fn is_entity_valid(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    fn ensure_valid(&self, id: EntityId) -> EcsResult<()> {
        if self.is_entity_valid(id) {
            Ok(())
        } else {
            Err(EcsError::InvalidHandle(id))
        }
    }

    /// Destroys an entity.
    ///
    /// Children are handed to the entity's own parent, every component is
    /// removed, the handle is recycled and every bucket forgets it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn remove_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let signature = self
            .allocator
            .get(id)
            .ok_or(EcsError::InvalidHandle(id))?
            .signature;

        if let Some(descriptor) = self.descriptors.remove(&id) {
            let grandparent = descriptor.parent;
            if let Some(gp) = grandparent.and_then(|gp| self.descriptors.get_mut(&gp)) {
                gp.children.retain(|c| *c != id);
                gp.children.extend(descriptor.children.iter().copied());
            }
            for child in &descriptor.children {
                if let Some(child) = self.descriptors.get_mut(child) {
                    child.parent = grandparent;
                }
            }
        }

        for tag in signature.tags() {
            if let Some(pool) = self.pools.get_mut(tag.index()) {
                pool.remove(id);
            }
        }
        self.membership.on_destroy(id, signature);
        self.allocator.release(id);

        tracing::debug!("Removed entity {}", id);
        Ok(())
    }

    // =========================================================================
    // Component types
    // =========================================================================

    /// Returns the tag of `T`, registering it and creating its pool on first use.
    ///
    /// # Errors
    ///
    /// - `TooManyComponentTypes` if every tag is taken
    /// - `UnsupportedComponentLayout` if `T` is over-aligned
    /// - `AllocationFailure` if the initial pool cannot be allocated
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentTag> {
        if let Some(tag) = self.types.tag_of::<T>() {
            return Ok(tag);
        }

        let tag = self.types.register::<T>()?;
        let info = *self
            .types
            .info(tag)
            .ok_or_else(|| EcsError::UnknownComponentType(T::NAME.to_owned()))?;
        match ComponentPool::new::<T>(info, self.config.pools.initial_capacity) {
            Ok(pool) => {
                self.pools.push(pool);
                Ok(tag)
            }
            Err(err) => {
                self.types.pop_last();
                tracing::warn!("Could not create pool for {}: {}", T::NAME, err);
                Err(err)
            }
        }
    }

    /// Looks up the tag of `T` without registering it.
    #[inline]
    #[must_use]
    pub fn tag_of<T: Component>(&self) -> Option<ComponentTag> {
        self.types.tag_of::<T>()
    }

    /// Returns the registered component types.
    #[inline]
    #[must_use]
    pub const fn component_types(&self) -> &ComponentTypes {
        &self.types
    }

    /// Returns the pool of a registered type, for reflection tooling.
    #[inline]
    #[must_use]
    pub fn pool(&self, tag: ComponentTag) -> Option<&ComponentPool> {
        self.pools.get(tag.index())
    }

    /// Iterates over every pool in tag order.
    pub fn pools(&self) -> impl Iterator<Item = &ComponentPool> {
        self.pools.iter()
    }

    fn pool_of(&self, tag: ComponentTag) -> EcsResult<&ComponentPool> {
        self.pools
            .get(tag.index())
            .ok_or_else(|| EcsError::UnknownComponentType(tag.to_string()))
    }

    /// Returns the component set held by a live entity.
    #[inline]
    #[must_use]
    pub fn signature(&self, id: EntityId) -> Option<ComponentSet> {
        self.allocator.get(id).map(|slot| slot.signature)
    }

    fn satisfies(&self, id: EntityId, set: ComponentSet) -> bool {
        self.signature(id)
            .is_some_and(|signature| signature.is_superset_of(set))
    }

    // =========================================================================
    // Component access
    // =========================================================================

    /// Checks if a live entity holds `T`.
    #[inline]
    #[must_use]
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.tag_of::<T>()
            .is_some_and(|tag| self.has_tag(id, tag))
    }

    /// Checks if a live entity holds the component with `tag`.
    #[inline]
    #[must_use]
    pub fn has_tag(&self, id: EntityId, tag: ComponentTag) -> bool {
        self.signature(id)
            .is_some_and(|signature| signature.contains(tag))
    }

    /// Gets a component of a live entity.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `MissingComponent` if it does not hold `T`
    pub fn get<T: Component>(&self, id: EntityId) -> EcsResult<&T> {
        self.ensure_valid(id)?;
        self.try_get(id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: T::NAME,
        })
    }

    /// Gets a component of a live entity mutably.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `MissingComponent` if it does not hold `T`
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> EcsResult<&mut T> {
        self.ensure_valid(id)?;
        self.try_get_mut(id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: T::NAME,
        })
    }

    /// Gets a component, or `None` if the entity is dead or lacks it.
    #[inline]
    #[must_use]
    pub fn try_get<T: Component>(&self, id: EntityId) -> Option<&T> {
        let tag = self.tag_of::<T>()?;
        if !self.has_tag(id, tag) {
            return None;
        }
        self.pools.get(tag.index())?.get::<T>(id)
    }

    /// Gets a component mutably, or `None` if the entity is dead or lacks it.
    #[inline]
    pub fn try_get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let tag = self.tag_of::<T>()?;
        if !self.has_tag(id, tag) {
            return None;
        }
        self.pools.get_mut(tag.index())?.get_mut::<T>(id)
    }

    /// Assigns `T::default()` to an entity.
    ///
    /// If the entity already holds `T` nothing changes and the existing
    /// value is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `AllocationFailure` if the pool is full and cannot grow
    pub fn assign<T: Component>(&mut self, id: EntityId) -> EcsResult<&mut T> {
        self.assign_with(id, T::default())
    }

    /// Assigns `value` to an entity unless it already holds `T`.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `AllocationFailure` if the pool is full and cannot grow
    pub fn assign_with<T: Component>(&mut self, id: EntityId, value: T) -> EcsResult<&mut T> {
        self.ensure_valid(id)?;
        let tag = self.register::<T>()?;
        self.attach(id, tag, Some(bytemuck::bytes_of(&value)))?;
        self.try_get_mut(id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: T::NAME,
        })
    }

    /// Assigns the default value of a registered type by tag.
    ///
    /// Returns `false` if the entity already held it.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `UnknownComponentType` if `tag` was never registered
    /// - `AllocationFailure` if the pool is full and cannot grow
    pub fn assign_by_tag(&mut self, id: EntityId, tag: ComponentTag) -> EcsResult<bool> {
        self.attach(id, tag, None)
    }

    /// Overwrites `T`, assigning it first if missing.
    ///
    /// # Errors
    ///
    /// Same as [`assign_with`](Self::assign_with).
    pub fn copy<T: Component>(&mut self, id: EntityId, value: T) -> EcsResult<&mut T> {
        let slot = self.assign_with(id, value)?;
        *slot = value;
        Ok(slot)
    }

    /// Copies the component with `tag` from `src` to `dst`, assigning it on
    /// `dst` first if missing.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if either entity is not alive
    /// - `UnknownComponentType` if `tag` was never registered
    /// - `MissingComponent` if `src` does not hold the component
    /// - `AllocationFailure` if `dst` needs a slot and the pool cannot grow
    pub fn copy_component(
        &mut self,
        src: EntityId,
        dst: EntityId,
        tag: ComponentTag,
    ) -> EcsResult<()> {
        self.ensure_valid(src)?;
        self.ensure_valid(dst)?;
        let name = self.pool_of(tag)?.info().name;
        if !self.has_tag(src, tag) {
            return Err(EcsError::MissingComponent {
                entity: src,
                component: name,
            });
        }

        self.attach(dst, tag, None)?;
        self.pools[tag.index()].copy_between(src, dst);
        Ok(())
    }

    /// Reads the raw bytes of a component.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `UnknownComponentType` if `tag` was never registered
    /// - `MissingComponent` if the entity does not hold the component
    pub fn component_bytes(&self, id: EntityId, tag: ComponentTag) -> EcsResult<&[u8]> {
        self.ensure_valid(id)?;
        let pool = self.pool_of(tag)?;
        pool.get_bytes(id).ok_or(EcsError::MissingComponent {
            entity: id,
            component: pool.info().name,
        })
    }

    /// Writes the raw bytes of a component, assigning it first if missing.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `UnknownComponentType` if `tag` was never registered
    /// - `InvalidComponentData` if `bytes` has the wrong length
    /// - `AllocationFailure` if a slot is needed and the pool cannot grow
    pub fn write_component_bytes(
        &mut self,
        id: EntityId,
        tag: ComponentTag,
        bytes: &[u8],
    ) -> EcsResult<()> {
        if !self.attach(id, tag, Some(bytes))? {
            let pool = &mut self.pools[tag.index()];
            pool.insert(id, bytes)?;
        }
        Ok(())
    }

    /// Removes `T` from an entity.
    ///
    /// Returns `Ok(false)` if the entity did not hold it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> EcsResult<bool> {
        self.ensure_valid(id)?;
        match self.tag_of::<T>() {
            Some(tag) => self.remove_by_tag(id, tag),
            None => {
                tracing::debug!("Entity {} has no {} to remove", id, T::NAME);
                Ok(false)
            }
        }
    }

    /// Removes the component with `tag` from an entity.
    ///
    /// Returns `Ok(false)` if the entity did not hold it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn remove_by_tag(&mut self, id: EntityId, tag: ComponentTag) -> EcsResult<bool> {
        let old = self.signature(id).ok_or(EcsError::InvalidHandle(id))?;
        if !old.contains(tag) {
            tracing::debug!("Entity {} has no component {} to remove", id, tag);
            return Ok(false);
        }

        if let Some(pool) = self.pools.get_mut(tag.index()) {
            pool.remove(id);
        }
        let new = old.without(tag);
        if let Some(slot) = self.allocator.get_mut(id) {
            slot.signature = new;
        }
        self.membership.on_change(id, old, new);
        Ok(true)
    }

    /// Attaches a component slot, from `bytes` or the type's default.
    ///
    /// Returns `false` without touching anything if the entity already holds it.
    fn attach(&mut self, id: EntityId, tag: ComponentTag, bytes: Option<&[u8]>) -> EcsResult<bool> {
        let old = self.signature(id).ok_or(EcsError::InvalidHandle(id))?;
        let pool = self
            .pools
            .get_mut(tag.index())
            .ok_or_else(|| EcsError::UnknownComponentType(tag.to_string()))?;
        if old.contains(tag) {
            return Ok(false);
        }
        if let Some(bytes) = bytes {
            if bytes.len() != pool.info().size {
                return Err(EcsError::InvalidComponentData {
                    component: pool.info().name,
                    expected: pool.info().size,
                    actual: bytes.len(),
                });
            }
        }

        if let Err(err) = pool.reserve_one(&self.config.pools) {
            tracing::warn!("Rejected {} assignment on entity {}: {}", pool.info().name, id, err);
            return Err(err);
        }
        match bytes {
            Some(bytes) => pool.insert(id, bytes)?,
            None => pool.insert_default(id)?,
        };

        let new = old.with(tag);
        if let Some(slot) = self.allocator.get_mut(id) {
            slot.signature = new;
        }
        self.membership.on_change(id, old, new);
        Ok(true)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Returns the entities holding every type in `set`, building the bucket
    /// on first request.
    ///
    /// `ComponentSet::ALL` lists every live entity in creation order.
    pub fn entities_in_pool(&mut self, set: ComponentSet) -> &[EntityId] {
        let allocator = &self.allocator;
        self.membership.get_or_build(set, |id| {
            allocator
                .get(*id)
                .is_some_and(|slot| slot.signature.is_superset_of(set))
        })
    }

    /// Returns a view over the entities holding every type in `F`.
    ///
    /// Registers `F` and builds its bucket on first use, so every later view
    /// of the same filter reads the cache instead of scanning.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn view<F: ComponentBundle>(&mut self) -> EcsResult<SceneView<'_, F>> {
        let set = F::register(self)?;
        self.entities_in_pool(set);
        let registry: &Self = self;
        Ok(SceneView::new(registry))
    }

    /// Returns the bucket for `set` if it has already been built.
    #[inline]
    #[must_use]
    pub fn cached_bucket(&self, set: ComponentSet) -> Option<&[EntityId]> {
        self.membership.get(set)
    }

    /// Computes the entities holding every type in `set` from scratch,
    /// in creation order, without touching the cache.
    #[must_use]
    pub fn matching(&self, set: ComponentSet) -> Vec<EntityId> {
        self.membership.scan(|id| self.satisfies(*id, set))
    }

    /// Rebuilds the bucket for `set` from entity signatures.
    ///
    /// Logs a warning if the cached bucket had drifted.
    pub fn recompute(&mut self, set: ComponentSet) -> &[EntityId] {
        let truth = self.matching(set);
        if let Some(previous) = self.membership.replace(set, truth) {
            let current = self.membership.get(set).unwrap_or(&[]);
            let drifted = previous.len() != current.len()
                || previous.iter().any(|id| !current.contains(id));
            if drifted {
                tracing::warn!("Membership bucket {} had drifted and was rebuilt", set);
            }
        }
        self.membership.get(set).unwrap_or(&[])
    }

    /// Drops a cached bucket so the next request rebuilds it.
    pub fn invalidate(&mut self, set: ComponentSet) -> bool {
        self.membership.invalidate(set)
    }

    /// Checks every pool and every cached bucket against entity signatures.
    ///
    /// # Errors
    ///
    /// - `PoolDesync` if a pool's slots disagree with the entities holding it
    /// - `MembershipDrift` if a bucket lists the wrong entities
    pub fn validate(&self) -> EcsResult<()> {
        for pool in &self.pools {
            pool.validate()?;
            let tag = pool.tag();
            for &owner in pool.entities() {
                if !self.has_tag(owner, tag) {
                    return Err(EcsError::PoolDesync {
                        tag,
                        detail: format!("slot owner {owner} is dead or lacks the component"),
                    });
                }
            }
            let holders = self
                .allocator
                .iter_alive()
                .filter(|slot| slot.signature.contains(tag))
                .count();
            if holders != pool.len() {
                return Err(EcsError::PoolDesync {
                    tag,
                    detail: format!("{holders} entities hold it, pool has {} slots", pool.len()),
                });
            }
        }

        let all = self.membership.all();
        if all.len() != self.len() || all.iter().any(|id| !self.is_entity_valid(*id)) {
            return Err(EcsError::MembershipDrift {
                set: ComponentSet::ALL,
                detail: format!("{} listed, {} alive", all.len(), self.len()),
            });
        }

        for set in self.membership.sets() {
            let bucket = self.membership.get(set).unwrap_or(&[]);
            let mut seen = HashSet::with_capacity(bucket.len());
            for &id in bucket {
                if !seen.insert(id) {
                    return Err(EcsError::MembershipDrift {
                        set,
                        detail: format!("{id} listed twice"),
                    });
                }
                if !self.satisfies(id, set) {
                    return Err(EcsError::MembershipDrift {
                        set,
                        detail: format!("{id} does not hold the set"),
                    });
                }
            }
            let expected = self.matching(set).len();
            if expected != bucket.len() {
                return Err(EcsError::MembershipDrift {
                    set,
                    detail: format!("{} listed, {expected} qualify", bucket.len()),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Descriptors
    // =========================================================================

    /// Returns the descriptor of a live entity.
    #[inline]
    #[must_use]
    pub fn descriptor(&self, id: EntityId) -> Option<&EntityDescriptor> {
        if !self.is_entity_valid(id) {
            return None;
        }
        self.descriptors.get(&id)
    }

    pub(crate) fn descriptor_mut(&mut self, id: EntityId) -> EcsResult<&mut EntityDescriptor> {
        if !self.is_entity_valid(id) {
            return Err(EcsError::InvalidHandle(id));
        }
        self.descriptors
            .get_mut(&id)
            .ok_or(EcsError::InvalidHandle(id))
    }

    pub(crate) fn descriptors_mut(&mut self) -> impl Iterator<Item = &mut EntityDescriptor> {
        self.descriptors.values_mut()
    }

    /// Returns the display name of a live entity.
    #[must_use]
    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.descriptor(id).map(|d| d.name.as_str())
    }

    /// Renames an entity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn rename(&mut self, id: EntityId, name: impl Into<String>) -> EcsResult<()> {
        self.descriptor_mut(id)?.name = name.into();
        Ok(())
    }

    /// Returns the scene id of a live entity.
    #[must_use]
    pub fn scene_id(&self, id: EntityId) -> Option<EntityId> {
        self.descriptor(id).map(|d| d.scene_id)
    }

    /// Overrides the scene id, as done when restoring a saved entity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn set_scene_id(&mut self, id: EntityId, scene_id: EntityId) -> EcsResult<()> {
        self.descriptor_mut(id)?.scene_id = scene_id;
        Ok(())
    }

    /// Records the identity an entity was saved under.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn set_save_id(&mut self, id: EntityId, save_id: Option<EntityId>) -> EcsResult<()> {
        self.descriptor_mut(id)?.save_id = save_id;
        Ok(())
    }

    /// Sets the layer of an entity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn set_layer(&mut self, id: EntityId, layer: u32) -> EcsResult<()> {
        self.descriptor_mut(id)?.layer = layer;
        Ok(())
    }

    /// Sets the entity's own active flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn set_active(&mut self, id: EntityId, active: bool) -> EcsResult<()> {
        self.descriptor_mut(id)?.active = active;
        Ok(())
    }

    /// Checks the entity's own active flag.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.descriptor(id).is_some_and(|d| d.active)
    }

    /// Checks that the entity and every ancestor are active.
    #[must_use]
    pub fn is_active_in_hierarchy(&self, id: EntityId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.descriptor(current) {
                Some(d) if d.active => cursor = d.parent,
                _ => return false,
            }
        }
        true
    }

    /// Returns the parent of a live entity.
    #[must_use]
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.descriptor(id).and_then(|d| d.parent)
    }

    /// Returns the direct children of a live entity in attach order.
    ///
    /// Children adopted from a removed entity come after the existing ones.
    #[must_use]
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.descriptor(id)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    /// Moves `child` under `parent`, or to the root if `parent` is `None`.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if either entity is not alive
    /// - `HierarchyCycle` if `parent` is `child` or one of its descendants
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> EcsResult<()> {
        self.ensure_valid(child)?;
        if let Some(parent) = parent {
            self.ensure_valid(parent)?;
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                if ancestor == child {
                    return Err(EcsError::HierarchyCycle { child, parent });
                }
                cursor = self.parent(ancestor);
            }
        }

        if self.parent(child) == parent {
            return Ok(());
        }
        if let Some(old) = self.parent(child) {
            if let Some(d) = self.descriptors.get_mut(&old) {
                d.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = parent {
            if let Some(d) = self.descriptors.get_mut(&parent) {
                d.children.push(child);
            }
        }
        self.descriptor_mut(child)?.parent = parent;
        Ok(())
    }

    /// Returns every descendant of `id`, depth first.
    #[must_use]
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(id).into_iter().rev().collect();
        let mut visited = BTreeSet::new();
        while let Some(next) = stack.pop() {
            if !visited.insert(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::ecs::component::{Collider, RigidBody, Transform};

    #[test]
    fn test_create_and_destroy() {
        let mut registry = EntityRegistry::default();
        let ids: Vec<_> = (0..6).map(|_| registry.create_entity()).collect();
        assert_eq!(ids[5].to_bits(), 5);
        assert_eq!(registry.len(), 6);

        registry.assign::<Transform>(ids[5]).unwrap();
        assert!(registry.has::<Transform>(ids[5]));

        registry.remove_entity(ids[5]).unwrap();
        assert!(!registry.has::<Transform>(ids[5]));
        assert!(!registry.is_entity_valid(ids[5]));
        assert_eq!(registry.len(), 5);
        assert!(matches!(
            registry.remove_entity(ids[5]),
            Err(EcsError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_descriptor_defaults() {
        let mut registry = EntityRegistry::default();
        let e = registry.create_entity();
        assert_eq!(registry.name(e), Some("GameObject0"));
        assert_eq!(registry.scene_id(e), Some(e));
        assert!(registry.is_active(e));
    }

    #[test]
    fn test_assign_is_noop_when_present() {
        let mut registry = EntityRegistry::default();
        let e = registry.create_entity();
        registry.assign_with(e, Transform::at(1.0, 1.0)).unwrap();
        let existing = registry.assign_with(e, Transform::at(9.0, 9.0)).unwrap();
        assert!((existing.position.x - 1.0).abs() < f32::EPSILON);

        registry.copy(e, Transform::at(9.0, 9.0)).unwrap();
        assert!((registry.get::<Transform>(e).unwrap().position.x - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_get_errors() {
        let mut registry = EntityRegistry::default();
        let e = registry.create_entity();
        assert!(matches!(
            registry.get::<RigidBody>(e),
            Err(EcsError::MissingComponent { component: "RigidBody", .. })
        ));
        registry.remove_entity(e).unwrap();
        assert!(matches!(
            registry.get::<RigidBody>(e),
            Err(EcsError::InvalidHandle(_))
        ));
        assert!(matches!(
            registry.assign::<RigidBody>(e),
            Err(EcsError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_remove_absent_component() {
        let mut registry = EntityRegistry::default();
        let e = registry.create_entity();
        assert!(!registry.remove::<Collider>(e).unwrap());
        registry.assign::<Collider>(e).unwrap();
        assert!(registry.remove::<Collider>(e).unwrap());
        assert!(!registry.remove::<Collider>(e).unwrap());
        registry.validate().unwrap();
    }

    #[test]
    fn test_requested_handle_collision() {
        let mut registry = EntityRegistry::default();
        let ids: Vec<_> = (0..8).map(|_| registry.create_entity()).collect();
        registry.assign_with(ids[7], Transform::at(7.0, 7.0)).unwrap();

        let outcome = registry.create_entity_requested(EntityId::new(7, 0));
        assert!(outcome.is_remapped());
        assert_ne!(outcome.handle(), ids[7]);
        assert!((registry.get::<Transform>(ids[7]).unwrap().position.x - 7.0).abs() < f32::EPSILON);
        assert!(!registry.has::<Transform>(outcome.handle()));

        assert!(matches!(
            registry.try_create_entity_requested(ids[7]),
            Err(EcsError::HandleCollision(_))
        ));
    }

    #[test]
    fn test_requested_handle_granted() {
        let mut registry = EntityRegistry::default();
        let outcome = registry.create_entity_requested(EntityId::new(3, 0));
        assert_eq!(outcome, RequestedHandle::Granted(EntityId::new(3, 0)));
        assert_eq!(registry.create_entity().index(), 0);
    }

    #[test]
    fn test_far_requested_handle_is_remapped() {
        let mut registry = EntityRegistry::default();
        let outcome = registry.create_entity_requested(EntityId::new(u32::MAX - 1, 0));
        assert!(outcome.is_remapped());
        assert_eq!(outcome.handle(), EntityId::new(0, 0));
        assert_eq!(registry.len(), 1);
        registry.validate().unwrap();
    }

    #[test]
    fn test_bucket_maintenance() {
        let mut registry = EntityRegistry::default();
        let a = registry.create_entity();
        let b = registry.create_entity();
        let tf = registry.register::<Transform>().unwrap();
        let rb = registry.register::<RigidBody>().unwrap();
        let both = tf.as_set().with(rb);

        assert!(registry.entities_in_pool(both).is_empty());
        for e in [a, b] {
            registry.assign::<Transform>(e).unwrap();
            registry.assign::<RigidBody>(e).unwrap();
        }
        assert_eq!(registry.entities_in_pool(both), &[a, b]);

        registry.remove::<RigidBody>(a).unwrap();
        assert_eq!(registry.cached_bucket(both).unwrap(), &[b]);
        assert_eq!(registry.cached_bucket(tf.as_set()), None);
        assert_eq!(registry.entities_in_pool(tf.as_set()), &[a, b]);
        registry.validate().unwrap();
    }

    #[test]
    fn test_allocation_failure_leaves_state() {
        let config = EcsConfig {
            pools: PoolConfig {
                initial_capacity: 2,
                growth_factor: 2,
                max_capacity: Some(2),
            },
            ..EcsConfig::default()
        };
        let mut registry = EntityRegistry::new(config).unwrap();
        let ids: Vec<_> = (0..3).map(|_| registry.create_entity()).collect();
        registry.assign::<Transform>(ids[0]).unwrap();
        registry.assign::<Transform>(ids[1]).unwrap();

        let tf = registry.tag_of::<Transform>().unwrap();
        let before = registry.entities_in_pool(tf.as_set()).to_vec();
        assert!(matches!(
            registry.assign::<Transform>(ids[2]),
            Err(EcsError::AllocationFailure { .. })
        ));
        assert!(!registry.has::<Transform>(ids[2]));
        assert_eq!(registry.entities_in_pool(tf.as_set()), before.as_slice());
        registry.validate().unwrap();
    }

    #[test]
    fn test_copy_component() {
        let mut registry = EntityRegistry::default();
        let src = registry.create_entity();
        let dst = registry.create_entity();
        registry.assign_with(src, RigidBody::dynamic(4.0)).unwrap();
        let rb = registry.tag_of::<RigidBody>().unwrap();

        registry.copy_component(src, dst, rb).unwrap();
        assert_eq!(registry.get::<RigidBody>(dst).unwrap(), registry.get::<RigidBody>(src).unwrap());
        let empty = registry.create_entity();
        assert!(matches!(
            registry.copy_component(empty, dst, rb),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn test_component_bytes() {
        let mut registry = EntityRegistry::default();
        let e = registry.create_entity();
        let tf = registry.register::<Transform>().unwrap();
        let value = Transform::at(2.0, 3.0);

        registry
            .write_component_bytes(e, tf, bytemuck::bytes_of(&value))
            .unwrap();
        assert_eq!(registry.get::<Transform>(e).unwrap(), &value);
        assert_eq!(registry.component_bytes(e, tf).unwrap(), bytemuck::bytes_of(&value));
        assert!(matches!(
            registry.write_component_bytes(e, tf, &[1, 2, 3]),
            Err(EcsError::InvalidComponentData { .. })
        ));
    }

    #[test]
    fn test_hierarchy() {
        let mut registry = EntityRegistry::default();
        let root = registry.create_entity();
        let mid = registry.create_entity();
        let leaf = registry.create_entity();
        registry.set_parent(mid, Some(root)).unwrap();
        registry.set_parent(leaf, Some(mid)).unwrap();

        assert_eq!(registry.children(root), vec![mid]);
        assert_eq!(registry.descendants(root), vec![mid, leaf]);
        assert!(matches!(
            registry.set_parent(root, Some(leaf)),
            Err(EcsError::HierarchyCycle { .. })
        ));

        registry.set_active(root, false).unwrap();
        assert!(registry.is_active(leaf));
        assert!(!registry.is_active_in_hierarchy(leaf));

        // children of a removed entity move up to its parent
        registry.remove_entity(mid).unwrap();
        assert_eq!(registry.parent(leaf), Some(root));
        assert_eq!(registry.children(root), vec![leaf]);
    }

    #[test]
    fn test_children_keep_attach_order() {
        let mut registry = EntityRegistry::default();
        let ids: Vec<_> = (0..5).map(|_| registry.create_entity()).collect();
        let (root, mid) = (ids[0], ids[1]);
        for &child in &[ids[4], mid, ids[2]] {
            registry.set_parent(child, Some(root)).unwrap();
        }
        registry.set_parent(ids[3], Some(mid)).unwrap();
        assert_eq!(registry.children(root), vec![ids[4], mid, ids[2]]);

        // re-attaching to the same parent keeps the position
        registry.set_parent(ids[4], Some(root)).unwrap();
        assert_eq!(registry.children(root), vec![ids[4], mid, ids[2]]);

        registry.remove_entity(mid).unwrap();
        assert_eq!(registry.children(root), vec![ids[4], ids[2], ids[3]]);
    }

    #[test]
    fn test_first_view_builds_bucket() {
        let mut registry = EntityRegistry::default();
        let a = registry.create_entity();
        registry.assign::<Transform>(a).unwrap();
        registry.assign::<Collider>(a).unwrap();
        let set = <(Transform, Collider)>::component_set(registry.component_types()).unwrap();
        assert!(registry.cached_bucket(set).is_none());

        let view = registry.view::<(Transform, Collider)>().unwrap();
        assert!(view.is_cached());
        assert_eq!(view.snapshot(), vec![a]);
        assert_eq!(registry.cached_bucket(set), Some(&[a][..]));

        // the filter types need not be registered beforehand
        assert!(registry.view::<(RigidBody,)>().unwrap().is_empty());
        assert!(registry.tag_of::<RigidBody>().is_some());
    }

    #[test]
    fn test_recompute_matches_cache() {
        let mut registry = EntityRegistry::default();
        let e = registry.create_entity();
        registry.assign::<Transform>(e).unwrap();
        let tf = registry.tag_of::<Transform>().unwrap();
        let cached = registry.entities_in_pool(tf.as_set()).to_vec();
        assert_eq!(registry.recompute(tf.as_set()), cached.as_slice());
        assert!(registry.invalidate(tf.as_set()));
        assert!(registry.cached_bucket(tf.as_set()).is_none());
    }
}

//! # Component Storage
//!
//! Dense, type-erased storage for one component type.
//!
//! The pool uses a dense array strategy:
//! - Live components occupy slots `[0, len)` of a raw byte buffer
//! - An index map decouples the entity handle from the slot
//! - Removal swaps the last slot into the hole, so iteration stays contiguous
//!
//! The buffer is word-aligned and typed access goes through a checked
//! `bytemuck` cast, so a wrong type or layout yields `None` rather than
//! garbage.

use std::any::TypeId;
use std::collections::HashMap;
use std::ops::Range;

use super::component::Component;
use super::entity::EntityId;
use super::signature::{ComponentInfo, ComponentTag};
use crate::config::PoolConfig;
use crate::error::{EcsError, EcsResult};

/// Storage for a single component type.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = ComponentPool::new::<Transform>(info, 16)?;
/// pool.insert(id, bytemuck::bytes_of(&Transform::at(1.0, 2.0)));
/// let t: &Transform = pool.get(id).unwrap();
/// ```
#[derive(Debug)]
pub struct ComponentPool {
    /// Layout of the stored type.
    info: ComponentInfo,
    /// Raw component bytes, `capacity * info.size` long (rounded up to words).
    data: Vec<u64>,
    /// Entity handle to slot index.
    index: HashMap<EntityId, usize>,
    /// Slot index to owning entity. Its length is the live count.
    owners: Vec<EntityId>,
    /// Number of slots the buffer can hold.
    capacity: usize,
    /// Bytes of `C::default()`, used for type-erased assignment.
    default_value: Box<[u8]>,
}

impl ComponentPool {
    /// Creates a pool for `C` with room for `capacity` components.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if the buffer cannot be allocated.
    pub fn new<C: Component>(info: ComponentInfo, capacity: usize) -> EcsResult<Self> {
        debug_assert_eq!(info.type_id, TypeId::of::<C>());
        let mut pool = Self {
            info,
            data: Vec::new(),
            index: HashMap::new(),
            owners: Vec::new(),
            capacity: 0,
            default_value: bytemuck::bytes_of(&C::default()).into(),
        };
        pool.resize(capacity)?;
        Ok(pool)
    }

    /// Returns the layout of the stored type.
    #[inline]
    #[must_use]
    pub const fn info(&self) -> &ComponentInfo {
        &self.info
    }

    /// Returns the tag of the stored type.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> ComponentTag {
        self.info.tag
    }

    /// Returns the number of live components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Checks if the pool holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Returns the number of slots allocated.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the owners of slots `[0, len)` in slot order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.owners
    }

    /// Checks if `id` owns a slot in this pool.
    #[inline]
    #[must_use]
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Returns the slot index owned by `id`.
    #[inline]
    #[must_use]
    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Returns the default value of the stored type as bytes.
    #[inline]
    #[must_use]
    pub fn default_bytes(&self) -> &[u8] {
        &self.default_value
    }

    #[inline]
    fn slot_range(&self, slot: usize) -> Range<usize> {
        let start = slot * self.info.size;
        start..start + self.info.size
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Gets the raw bytes of `id`'s component.
    ///
    /// Returns `None` if the entity has no slot in this pool.
    #[inline]
    #[must_use]
    pub fn get_bytes(&self, id: EntityId) -> Option<&[u8]> {
        let range = self.slot_range(self.slot_of(id)?);
        Some(&self.bytes()[range])
    }

    /// Gets the raw mutable bytes of `id`'s component.
    #[inline]
    pub fn get_bytes_mut(&mut self, id: EntityId) -> Option<&mut [u8]> {
        let range = self.slot_range(self.slot_of(id)?);
        Some(&mut self.bytes_mut()[range])
    }

    /// Gets `id`'s component as `C`.
    ///
    /// Returns `None` if the entity has no slot or `C` is not the stored type.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        if self.info.type_id != TypeId::of::<C>() {
            return None;
        }
        bytemuck::try_from_bytes(self.get_bytes(id)?).ok()
    }

    /// Gets `id`'s component mutably as `C`.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        if self.info.type_id != TypeId::of::<C>() {
            return None;
        }
        bytemuck::try_from_bytes_mut(self.get_bytes_mut(id)?).ok()
    }

    /// Resizes the buffer to hold `new_capacity` components.
    ///
    /// Live slots are preserved. On failure the pool is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if `new_capacity` is below the live count
    /// or the memory cannot be reserved.
    pub fn resize(&mut self, new_capacity: usize) -> EcsResult<()> {
        let failure = EcsError::AllocationFailure {
            component: self.info.name,
            capacity: self.capacity,
            requested: new_capacity,
        };
        if new_capacity < self.len() {
            return Err(failure);
        }

        let byte_len = new_capacity
            .checked_mul(self.info.size)
            .ok_or_else(|| failure.clone())?;
        let words = byte_len.div_ceil(8);

        let mut data: Vec<u64> = Vec::new();
        data.try_reserve_exact(words).map_err(|_| failure.clone())?;
        let additional = new_capacity - self.len();
        self.owners
            .try_reserve(additional)
            .map_err(|_| failure.clone())?;
        self.index.try_reserve(additional).map_err(|_| failure)?;

        let keep = words.min(self.data.len());
        data.extend_from_slice(&self.data[..keep]);
        data.resize(words, 0);

        self.data = data;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Makes room for one more component, growing geometrically if full.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if growth would exceed `policy.max_capacity`
    /// or memory cannot be reserved. The pool is left unchanged.
    pub fn reserve_one(&mut self, policy: &PoolConfig) -> EcsResult<()> {
        if self.len() < self.capacity {
            return Ok(());
        }

        let mut target = self
            .capacity
            .max(1)
            .saturating_mul(policy.growth_factor.max(2));
        if let Some(max) = policy.max_capacity {
            target = target.min(max);
        }
        if target <= self.capacity {
            return Err(EcsError::AllocationFailure {
                component: self.info.name,
                capacity: self.capacity,
                requested: self.capacity + 1,
            });
        }

        tracing::trace!(
            "Growing {} pool from {} to {} slots",
            self.info.name,
            self.capacity,
            target
        );
        self.resize(target)
    }

    /// Appends a component for `id` in the next free slot.
    ///
    /// The caller must have made room with [`reserve_one`](Self::reserve_one).
    /// Returns the slot index.
    ///
    /// # Errors
    ///
    /// - `InvalidComponentData` if `bytes` is not exactly one component long
    /// - `AllocationFailure` if the pool is full
    pub fn insert(&mut self, id: EntityId, bytes: &[u8]) -> EcsResult<usize> {
        if bytes.len() != self.info.size {
            return Err(EcsError::InvalidComponentData {
                component: self.info.name,
                expected: self.info.size,
                actual: bytes.len(),
            });
        }
        if let Some(slot) = self.slot_of(id) {
            let range = self.slot_range(slot);
            self.bytes_mut()[range].copy_from_slice(bytes);
            return Ok(slot);
        }
        if self.len() >= self.capacity {
            return Err(EcsError::AllocationFailure {
                component: self.info.name,
                capacity: self.capacity,
                requested: self.capacity + 1,
            });
        }

        let slot = self.owners.len();
        let range = self.slot_range(slot);
        self.bytes_mut()[range].copy_from_slice(bytes);
        self.owners.push(id);
        self.index.insert(id, slot);
        Ok(slot)
    }

    /// Appends `C::default()` for `id`, as captured at pool creation.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailure` if the pool is full.
    pub fn insert_default(&mut self, id: EntityId) -> EcsResult<usize> {
        let default = std::mem::take(&mut self.default_value);
        let result = self.insert(id, &default);
        self.default_value = default;
        result
    }

    /// Copies `src`'s component over `dst`'s. Both must own a slot.
    ///
    /// Returns `false` if either entity is missing.
    pub fn copy_between(&mut self, src: EntityId, dst: EntityId) -> bool {
        let (Some(from), Some(to)) = (self.slot_of(src), self.slot_of(dst)) else {
            return false;
        };
        if from != to {
            let source = self.slot_range(from);
            let start = self.slot_range(to).start;
            self.bytes_mut().copy_within(source, start);
        }
        true
    }

    /// Removes `id`'s component, moving the last slot into the hole.
    ///
    /// The vacated tail slot is zeroed. Returns `false` if `id` had no slot.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(hole) = self.index.remove(&id) else {
            return false;
        };

        let last = self.owners.len() - 1;
        let tail = self.slot_range(last);
        if hole != last {
            let start = self.slot_range(hole).start;
            self.bytes_mut().copy_within(tail.clone(), start);
            let moved = self.owners[last];
            self.owners[hole] = moved;
            self.index.insert(moved, hole);
        }
        self.bytes_mut()[tail].fill(0);
        self.owners.pop();
        true
    }

    /// Checks that the index map and the owner list agree.
    ///
    /// # Errors
    ///
    /// Returns `PoolDesync` describing the first mismatch.
    pub fn validate(&self) -> EcsResult<()> {
        let desync = |detail: String| EcsError::PoolDesync {
            tag: self.info.tag,
            detail,
        };
        if self.index.len() != self.owners.len() {
            return Err(desync(format!(
                "index holds {} entries, {} slots are live",
                self.index.len(),
                self.owners.len()
            )));
        }
        if self.owners.len() > self.capacity {
            return Err(desync(format!(
                "{} live slots exceed capacity {}",
                self.owners.len(),
                self.capacity
            )));
        }
        for (slot, owner) in self.owners.iter().enumerate() {
            if self.index.get(owner) != Some(&slot) {
                return Err(desync(format!("slot {slot} owner {owner} is not indexed there")));
            }
        }
        Ok(())
    }
}

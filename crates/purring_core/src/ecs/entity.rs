//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the slot table
//! - A generation counter for safe reuse
//!
//! The allocator hands out the smallest free index first so the live range
//! stays dense.

use std::collections::BTreeSet;
use std::fmt;

use super::signature::ComponentSet;
use crate::error::{EcsError, EcsResult};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the slot table
/// - Upper 32 bits: Generation counter for detecting stale references
///
/// First-generation handles are numerically equal to their index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The slot index (0 to 2^32-1)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Reconstructs an ID from its raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID. Also the end sentinel of scene iteration.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else if self.generation() == 0 {
            write!(f, "{}", self.index())
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// One row of the slot table.
///
/// Tracks which component types are attached via a bitmask.
#[derive(Clone, Copy, Debug)]
pub struct EntitySlot {
    /// The most recently issued ID for this slot.
    pub id: EntityId,
    /// Component types currently attached.
    pub signature: ComponentSet,
    /// Whether this entity slot is currently alive.
    pub alive: bool,
    /// Creation sequence number, used to rebuild buckets in creation order.
    pub created: u64,
}

impl EntitySlot {
    /// Creates a dead/empty entity slot.
    #[inline]
    #[must_use]
    const fn dead(index: u32) -> Self {
        Self {
            id: EntityId::new(index, 0),
            signature: ComponentSet::EMPTY,
            alive: false,
            created: 0,
        }
    }
}

/// Index allocator with smallest-first recycling.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Every slot that has ever been reserved.
    slots: Vec<EntitySlot>,
    /// Dead slot indices available for reuse.
    free: BTreeSet<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Monotonic creation counter.
    sequence: u64,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of reserved slots, alive or not.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Allocates a fresh handle, reusing the smallest free index if any.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free.pop_first() {
            // Increment generation to invalidate old references
            let generation = self.slots[index as usize].id.generation().wrapping_add(1);
            let id = EntityId::new(index, generation);
            self.revive(index, id);
            return id;
        }

        // The slot table never reaches u32::MAX entries in practice; the
        // last index is kept out of reach so NULL stays unambiguous.
        let index = self.slots.len() as u32;
        let id = EntityId::new(index, 0);
        self.slots.push(EntitySlot::dead(index));
        self.revive(index, id);
        id
    }

    /// Claims an exact handle, as requested when restoring saved identities.
    ///
    /// The slot must be free and the requested generation must not be older
    /// than the slot's last issued generation. Skipped indices beyond the
    /// current range become free slots, at most `max_gap` of them.
    ///
    /// # Errors
    ///
    /// Returns `HandleCollision` if the handle is live, reserved, null, or
    /// more than `max_gap` slots past the current range.
    pub fn claim(&mut self, requested: EntityId, max_gap: u32) -> EcsResult<EntityId> {
        if requested.is_null() || requested.index() == u32::MAX {
            return Err(EcsError::HandleCollision(requested));
        }

        let index = requested.index();
        let idx = index as usize;

        if idx < self.slots.len() {
            let slot = &self.slots[idx];
            if slot.alive || requested.generation() < slot.id.generation() {
                return Err(EcsError::HandleCollision(requested));
            }
            self.free.remove(&index);
        } else {
            if idx - self.slots.len() > max_gap as usize {
                return Err(EcsError::HandleCollision(requested));
            }
            let extra = idx + 1 - self.slots.len();
            self.slots
                .try_reserve(extra)
                .map_err(|_| EcsError::HandleCollision(requested))?;
            for gap in self.slots.len() as u32..index {
                self.slots.push(EntitySlot::dead(gap));
                self.free.insert(gap);
            }
            self.slots.push(EntitySlot::dead(index));
        }

        self.revive(index, requested);
        Ok(requested)
    }

    fn revive(&mut self, index: u32, id: EntityId) {
        let slot = &mut self.slots[index as usize];
        slot.id = id;
        slot.signature = ComponentSet::EMPTY;
        slot.alive = true;
        slot.created = self.sequence;
        self.sequence += 1;
        self.alive_count += 1;
    }

    /// Releases a live handle, returning its index to the free set.
    ///
    /// Returns `false` if the handle was already dead or stale.
    pub fn release(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = &mut self.slots[id.index() as usize];
        slot.alive = false;
        slot.signature = ComponentSet::EMPTY;
        self.alive_count -= 1;
        self.free.insert(id.index());
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Gets the slot of a live entity.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySlot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.alive && slot.id == id)
    }

    /// Gets the mutable slot of a live entity.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntitySlot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.alive && slot.id == id)
    }

    /// Iterates over all alive slots in index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &EntitySlot> {
        self.slots.iter().filter(|slot| slot.alive)
    }
}

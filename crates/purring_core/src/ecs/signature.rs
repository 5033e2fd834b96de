//! # Component Tags and Sets
//!
//! Every registered component type owns one bit of a 32-bit mask, handed
//! out in order of first registration. A [`ComponentSet`] is any OR of those
//! bits; the empty set matches every entity.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use super::component::Component;
use crate::error::{EcsError, EcsResult};

/// Maximum number of distinct component types.
pub const MAX_COMPONENT_TYPES: usize = 32;

/// Largest component alignment a pool can store.
pub const MAX_COMPONENT_ALIGN: usize = std::mem::align_of::<u64>();

/// Bit position identifying one component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTag(u8);

impl ComponentTag {
    /// Creates a tag from a bit index.
    ///
    /// Returns `None` if the index is out of range.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < MAX_COMPONENT_TYPES {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Returns the bit index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the single-bit set for this tag.
    #[inline]
    #[must_use]
    pub const fn as_set(self) -> ComponentSet {
        ComponentSet(1 << self.0)
    }
}

// Reflection tooling keys descriptors by the stringified tag.
impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bitmask of component types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentSet(u32);

impl ComponentSet {
    /// The universal set key: every live entity satisfies it.
    pub const ALL: Self = Self(0);

    /// No component types.
    pub const EMPTY: Self = Self(0);

    /// Creates a set from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns this set with `tag` added.
    #[inline]
    #[must_use]
    pub const fn with(self, tag: ComponentTag) -> Self {
        Self(self.0 | (1 << tag.0))
    }

    /// Returns this set with `tag` removed.
    #[inline]
    #[must_use]
    pub const fn without(self, tag: ComponentTag) -> Self {
        Self(self.0 & !(1 << tag.0))
    }

    /// Returns the union of two sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Checks if `tag` is in this set.
    #[inline]
    #[must_use]
    pub const fn contains(self, tag: ComponentTag) -> bool {
        self.0 & (1 << tag.0) != 0
    }

    /// Checks if every type in `other` is also in this set.
    #[inline]
    #[must_use]
    pub const fn is_superset_of(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks if the set holds no types.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of types in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the tags in ascending bit order.
    pub fn tags(self) -> impl Iterator<Item = ComponentTag> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let bit = bits.trailing_zeros();
            bits &= bits - 1;
            Some(ComponentTag(bit as u8))
        })
    }
}

impl FromIterator<ComponentTag> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentTag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for ComponentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{ALL}");
        }
        f.write_str("{")?;
        for (i, tag) in self.tags().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{tag}")?;
        }
        f.write_str("}")
    }
}

/// Layout and identity of one registered component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Assigned tag.
    pub tag: ComponentTag,
    /// Stable component name.
    pub name: &'static str,
    /// Rust type identity.
    pub type_id: TypeId,
    /// Size of one value in bytes.
    pub size: usize,
    /// Alignment of one value in bytes.
    pub align: usize,
}

/// Registry of component types and their tags.
#[derive(Debug, Default)]
pub struct ComponentTypes {
    /// Registered types, indexed by tag.
    infos: Vec<ComponentInfo>,
    /// Lookup from type identity to tag.
    by_type: HashMap<TypeId, ComponentTag>,
}

impl ComponentTypes {
    /// Creates an empty type registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag of `C`, registering it on first use.
    ///
    /// # Errors
    ///
    /// - `TooManyComponentTypes` if every tag bit is taken
    /// - `UnsupportedComponentLayout` if `C` is over-aligned
    pub fn register<C: Component>(&mut self) -> EcsResult<ComponentTag> {
        if let Some(tag) = self.tag_of::<C>() {
            return Ok(tag);
        }

        let align = std::mem::align_of::<C>();
        if align > MAX_COMPONENT_ALIGN {
            return Err(EcsError::UnsupportedComponentLayout {
                component: C::NAME,
                align,
                max: MAX_COMPONENT_ALIGN,
            });
        }

        let tag = ComponentTag::from_index(self.infos.len()).ok_or(
            EcsError::TooManyComponentTypes {
                limit: MAX_COMPONENT_TYPES,
            },
        )?;

        self.infos.push(ComponentInfo {
            tag,
            name: C::NAME,
            type_id: TypeId::of::<C>(),
            size: std::mem::size_of::<C>(),
            align,
        });
        self.by_type.insert(TypeId::of::<C>(), tag);
        Ok(tag)
    }

    /// Forgets the most recently registered type.
    ///
    /// Used to undo a registration whose pool could not be allocated.
    pub(crate) fn pop_last(&mut self) {
        if let Some(info) = self.infos.pop() {
            self.by_type.remove(&info.type_id);
        }
    }

    /// Looks up the tag of `C` without registering it.
    #[inline]
    #[must_use]
    pub fn tag_of<C: Component>(&self) -> Option<ComponentTag> {
        self.by_type.get(&TypeId::of::<C>()).copied()
    }

    /// Looks up a registered type by tag.
    #[inline]
    #[must_use]
    pub fn info(&self, tag: ComponentTag) -> Option<&ComponentInfo> {
        self.infos.get(tag.index())
    }

    /// Looks up a registered type by name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ComponentInfo> {
        self.infos.iter().find(|info| info.name == name)
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Checks if no types are registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterates over registered types in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }
}

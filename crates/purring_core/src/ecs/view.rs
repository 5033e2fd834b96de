//! # Scene View
//!
//! Read-only iteration over the entities holding a static set of component
//! types. `SceneView<()>` walks every live entity.
//!
//! A view borrows the registry immutably, so structural mutation is
//! impossible while it or one of its iterators is alive. Systems that need
//! to write components while walking take a [`SceneView::snapshot`] first.

use std::borrow::Cow;
use std::marker::PhantomData;

use super::bundle::ComponentBundle;
use super::component::Component;
use super::entity::EntityId;
use super::registry::EntityRegistry;
use super::signature::ComponentSet;
use crate::error::EcsResult;

/// Filtered view over a registry.
///
/// Order follows the membership bucket for the filter set: creation order
/// for `()`, bucket insertion order otherwise.
///
/// # Example
///
/// ```rust,ignore
/// let view = registry.view::<(Transform, RigidBody)>()?;
/// for id in &view {
///     let body = view.get::<RigidBody>(id);
/// }
/// ```
pub struct SceneView<'r, F: ComponentBundle = ()> {
    registry: &'r EntityRegistry,
    set: Option<ComponentSet>,
    entities: Cow<'r, [EntityId]>,
    _filter: PhantomData<fn() -> F>,
}

impl<'r, F: ComponentBundle> SceneView<'r, F> {
    /// Creates a view over the entities currently holding every type in `F`.
    ///
    /// Reads the cached bucket when one exists and otherwise computes the
    /// list privately, scanning every live entity. Per-frame callers use
    /// [`EntityRegistry::view`], which builds the bucket once. A filter
    /// naming an unregistered type is empty.
    #[must_use]
    pub fn new(registry: &'r EntityRegistry) -> Self {
        let set = F::component_set(registry.component_types());
        let entities = match set {
            None => Cow::Borrowed(&[][..]),
            Some(set) => registry
                .cached_bucket(set)
                .map_or_else(|| Cow::Owned(registry.matching(set)), Cow::Borrowed),
        };
        Self {
            registry,
            set,
            entities,
            _filter: PhantomData,
        }
    }

    /// Registers `F` and builds its membership bucket so later views read
    /// it directly.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn prepare(registry: &mut EntityRegistry) -> EcsResult<ComponentSet> {
        let set = F::register(registry)?;
        registry.entities_in_pool(set);
        Ok(set)
    }

    /// Returns the filter set, or `None` if a filter type is unregistered.
    #[inline]
    #[must_use]
    pub const fn set(&self) -> Option<ComponentSet> {
        self.set
    }

    /// Checks if the view reads a cached bucket rather than a private list.
    #[inline]
    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(self.entities, Cow::Borrowed(_)) && self.set.is_some()
    }

    /// Returns the registry behind this view.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &'r EntityRegistry {
        self.registry
    }

    /// Number of matching entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if no entity matches.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Checks if `id` is in the view.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    /// Returns the matching entities in iteration order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.entities
    }

    /// Copies the work list out of the view.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntityId> {
        self.entities.to_vec()
    }

    /// Reads a component of a viewed entity.
    #[inline]
    #[must_use]
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&'r T> {
        self.registry.try_get(id)
    }

    /// Returns an iterator positioned at the first matching entity.
    #[must_use]
    pub fn iter(&self) -> SceneIter<'_> {
        SceneIter {
            entities: &self.entities,
            position: 0,
        }
    }
}

impl<'v, 'r, F: ComponentBundle> IntoIterator for &'v SceneView<'r, F> {
    type Item = EntityId;
    type IntoIter = SceneIter<'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward-only cursor over a [`SceneView`].
#[derive(Clone, Debug)]
pub struct SceneIter<'v> {
    entities: &'v [EntityId],
    position: usize,
}

impl SceneIter<'_> {
    /// Returns the entity under the cursor, or [`EntityId::NULL`] past the end.
    #[inline]
    #[must_use]
    pub fn current(&self) -> EntityId {
        self.entities
            .get(self.position)
            .copied()
            .unwrap_or(EntityId::NULL)
    }

    /// Checks if the cursor has passed the last entity.
    #[inline]
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.current().is_null()
    }
}

impl Iterator for SceneIter<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.entities.get(self.position).copied()?;
        self.position += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entities.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SceneIter<'_> {}

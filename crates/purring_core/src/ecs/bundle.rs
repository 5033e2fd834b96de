//! # Component Bundles
//!
//! Tuples of components handled as one unit: the static filter of a
//! [`SceneView`](super::SceneView) and the initial component list of a
//! factory-created entity.

use super::component::Component;
use super::entity::EntityId;
use super::registry::EntityRegistry;
use super::signature::{ComponentSet, ComponentTypes};
use crate::error::EcsResult;

/// A statically known list of component types.
///
/// Implemented for `()` (no types, matching every entity) and for tuples of
/// up to eight components.
pub trait ComponentBundle: Sized {
    /// Names of the types in declaration order.
    fn names() -> Vec<&'static str>;

    /// Registers every type, returning the combined set.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    fn register(registry: &mut EntityRegistry) -> EcsResult<ComponentSet>;

    /// Returns the combined set, or `None` if any type is unregistered.
    fn component_set(types: &ComponentTypes) -> Option<ComponentSet>;

    /// Assigns each type's default value in declaration order.
    ///
    /// Types the entity already holds are left alone.
    ///
    /// # Errors
    ///
    /// Returns the first assignment error.
    fn assign_defaults(registry: &mut EntityRegistry, id: EntityId) -> EcsResult<()>;

    /// Writes each value in declaration order, assigning missing types first.
    ///
    /// # Errors
    ///
    /// Returns the first assignment error.
    fn write(self, registry: &mut EntityRegistry, id: EntityId) -> EcsResult<()>;
}

impl ComponentBundle for () {
    fn names() -> Vec<&'static str> {
        Vec::new()
    }

    fn register(_registry: &mut EntityRegistry) -> EcsResult<ComponentSet> {
        Ok(ComponentSet::ALL)
    }

    fn component_set(_types: &ComponentTypes) -> Option<ComponentSet> {
        Some(ComponentSet::ALL)
    }

    fn assign_defaults(_registry: &mut EntityRegistry, _id: EntityId) -> EcsResult<()> {
        Ok(())
    }

    fn write(self, _registry: &mut EntityRegistry, _id: EntityId) -> EcsResult<()> {
        Ok(())
    }
}

macro_rules! impl_bundle_tuple {
    ($($C:ident),+) => {
        impl<$($C: Component),+> ComponentBundle for ($($C,)+) {
            fn names() -> Vec<&'static str> {
                vec![$(<$C as Component>::NAME),+]
            }

            fn register(registry: &mut EntityRegistry) -> EcsResult<ComponentSet> {
                Ok(ComponentSet::EMPTY $(.with(registry.register::<$C>()?))+)
            }

            fn component_set(types: &ComponentTypes) -> Option<ComponentSet> {
                Some(ComponentSet::EMPTY $(.with(types.tag_of::<$C>()?))+)
            }

            fn assign_defaults(registry: &mut EntityRegistry, id: EntityId) -> EcsResult<()> {
                $(registry.assign::<$C>(id)?;)+
                Ok(())
            }

            #[allow(non_snake_case)]
            fn write(self, registry: &mut EntityRegistry, id: EntityId) -> EcsResult<()> {
                let ($($C,)+) = self;
                $(registry.copy(id, $C)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle_tuple!(C1);
impl_bundle_tuple!(C1, C2);
impl_bundle_tuple!(C1, C2, C3);
impl_bundle_tuple!(C1, C2, C3, C4);
impl_bundle_tuple!(C1, C2, C3, C4, C5);
impl_bundle_tuple!(C1, C2, C3, C4, C5, C6);
impl_bundle_tuple!(C1, C2, C3, C4, C5, C6, C7);
impl_bundle_tuple!(C1, C2, C3, C4, C5, C6, C7, C8);

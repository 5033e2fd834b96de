//! # Entity Factory
//!
//! Construction helpers built only on the registry's public operations:
//! entities with an initial component list, name-based assignment for
//! data-driven content, cloning and prefabs.
//!
//! Every multi-step operation is all-or-nothing. If one step fails, the
//! entities and components it already created are removed again.

use std::collections::BTreeMap;

use super::bundle::ComponentBundle;
use super::component::{Collider, Component, RigidBody, Transform};
use super::descriptor::EntityDescriptor;
use super::entity::EntityId;
use super::registry::EntityRegistry;
use super::signature::{ComponentSet, ComponentTag};
use crate::error::{EcsError, EcsResult};

/// Name of the prefab available in every factory.
pub const DEFAULT_PREFAB: &str = "GameObject";

/// Name to tag map and prefab table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFactory {
    /// Component names registered by the subsystems that define them.
    names: BTreeMap<String, ComponentTag>,
    /// Component name lists keyed by prefab name.
    prefabs: BTreeMap<String, Vec<String>>,
}

impl Default for EntityFactory {
    fn default() -> Self {
        let mut prefabs = BTreeMap::new();
        prefabs.insert(
            DEFAULT_PREFAB.to_owned(),
            vec![
                Transform::NAME.to_owned(),
                RigidBody::NAME.to_owned(),
                Collider::NAME.to_owned(),
            ],
        );
        Self {
            names: BTreeMap::new(),
            prefabs,
        }
    }
}

impl EntityFactory {
    /// Creates a factory holding only the default prefab.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` with the registry and makes it assignable by name.
    ///
    /// # Errors
    ///
    /// Returns the registry's registration error.
    pub fn register<T: Component>(&mut self, registry: &mut EntityRegistry) -> EcsResult<ComponentTag> {
        let tag = registry.register::<T>()?;
        self.names.insert(T::NAME.to_owned(), tag);
        Ok(tag)
    }

    /// Registers the engine's built-in components.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn register_builtin(&mut self, registry: &mut EntityRegistry) -> EcsResult<()> {
        self.register::<Transform>(registry)?;
        self.register::<RigidBody>(registry)?;
        self.register::<Collider>(registry)?;
        Ok(())
    }

    /// Looks up a registered component name.
    #[inline]
    #[must_use]
    pub fn tag_by_name(&self, name: &str) -> Option<ComponentTag> {
        self.names.get(name).copied()
    }

    /// Iterates over registered component names in sorted order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    fn resolve(&self, names: &[&str]) -> EcsResult<Vec<ComponentTag>> {
        names
            .iter()
            .map(|name| {
                self.tag_by_name(name)
                    .ok_or_else(|| EcsError::UnknownComponentType((*name).to_owned()))
            })
            .collect()
    }

    /// Creates an entity holding the default value of every type in `B`.
    ///
    /// # Errors
    ///
    /// Returns the first assignment error. The entity is not kept.
    pub fn create_entity<B: ComponentBundle>(&self, registry: &mut EntityRegistry) -> EcsResult<EntityId> {
        let id = registry.create_entity();
        if let Err(err) = B::assign_defaults(registry, id) {
            discard(registry, id);
            return Err(err);
        }
        Ok(id)
    }

    /// Creates an entity holding the given values, assigned in order.
    ///
    /// # Errors
    ///
    /// Returns the first assignment error. The entity is not kept.
    pub fn create_entity_with<B: ComponentBundle>(
        &self,
        registry: &mut EntityRegistry,
        bundle: B,
    ) -> EcsResult<EntityId> {
        let id = registry.create_entity();
        if let Err(err) = bundle.write(registry, id) {
            discard(registry, id);
            return Err(err);
        }
        Ok(id)
    }

    /// Assigns default values of named components.
    ///
    /// Components the entity already holds are left alone.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `UnknownComponentType` for an unregistered name, before anything is assigned
    /// - the first assignment error, after undoing earlier assignments
    pub fn assign(&self, registry: &mut EntityRegistry, id: EntityId, names: &[&str]) -> EcsResult<()> {
        if !registry.is_entity_valid(id) {
            return Err(EcsError::InvalidHandle(id));
        }
        let tags = self.resolve(names)?;

        let mut added = Vec::with_capacity(tags.len());
        for tag in tags {
            match registry.assign_by_tag(id, tag) {
                Ok(true) => added.push(tag),
                Ok(false) => {}
                Err(err) => {
                    for tag in added {
                        if let Err(undo) = registry.remove_by_tag(id, tag) {
                            tracing::warn!(
                                "Could not undo component {} on entity {}: {}",
                                tag,
                                id,
                                undo
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Writes the values of `bundle` onto an entity, assigning missing types.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - the first assignment error
    pub fn copy<B: ComponentBundle>(
        &self,
        registry: &mut EntityRegistry,
        id: EntityId,
        bundle: B,
    ) -> EcsResult<()> {
        if !registry.is_entity_valid(id) {
            return Err(EcsError::InvalidHandle(id));
        }
        bundle.write(registry, id)
    }

    /// Creates a copy of an entity and every component it holds.
    ///
    /// The clone takes the source's name, active flag, layer, tags and
    /// parent. It keeps its own handle and scene id and has no children.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the source is not alive
    /// - the first copy error. The clone is not kept.
    pub fn clone_entity(&self, registry: &mut EntityRegistry, id: EntityId) -> EcsResult<EntityId> {
        let (signature, source) = match (registry.signature(id), registry.descriptor(id)) {
            (Some(signature), Some(source)) => (signature, source.clone()),
            _ => return Err(EcsError::InvalidHandle(id)),
        };

        let clone = registry.create_entity();
        match fill_clone(registry, id, clone, signature, source) {
            Ok(()) => Ok(clone),
            Err(err) => {
                discard(registry, clone);
                Err(err)
            }
        }
    }

    /// Defines or replaces a prefab as a list of component names.
    pub fn register_prefab(&mut self, name: impl Into<String>, components: &[&str]) {
        let components = components.iter().map(|c| (*c).to_owned()).collect();
        self.prefabs.insert(name.into(), components);
    }

    /// Returns the component names of a prefab.
    #[must_use]
    pub fn prefab(&self, name: &str) -> Option<&[String]> {
        self.prefabs.get(name).map(Vec::as_slice)
    }

    /// Creates an entity holding the default value of every prefab component.
    ///
    /// # Errors
    ///
    /// - `UnknownPrefab` if no prefab has this name
    /// - `UnknownComponentType` if the prefab lists an unregistered name
    /// - the first assignment error. The entity is not kept.
    pub fn create_from_prefab(&self, registry: &mut EntityRegistry, name: &str) -> EcsResult<EntityId> {
        let components = self
            .prefabs
            .get(name)
            .ok_or_else(|| EcsError::UnknownPrefab(name.to_owned()))?;
        let names: Vec<&str> = components.iter().map(String::as_str).collect();
        self.resolve(&names)?;

        let id = registry.create_entity();
        if let Err(err) = self.assign(registry, id, &names) {
            discard(registry, id);
            return Err(err);
        }
        Ok(id)
    }

    /// Writes raw bytes of a named component, assigning it first if missing.
    ///
    /// With `None` the component is assigned its default value and an existing
    /// value is left untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if the entity is not alive
    /// - `UnknownComponentType` for an unregistered name
    /// - `InvalidComponentData` if the bytes have the wrong length
    pub fn load_component(
        &self,
        registry: &mut EntityRegistry,
        id: EntityId,
        name: &str,
        bytes: Option<&[u8]>,
    ) -> EcsResult<()> {
        if !registry.is_entity_valid(id) {
            return Err(EcsError::InvalidHandle(id));
        }
        let tag = self
            .tag_by_name(name)
            .ok_or_else(|| EcsError::UnknownComponentType(name.to_owned()))?;
        match bytes {
            Some(bytes) => registry.write_component_bytes(id, tag, bytes),
            None => registry.assign_by_tag(id, tag).map(|_| ()),
        }
    }
}

fn fill_clone(
    registry: &mut EntityRegistry,
    source: EntityId,
    clone: EntityId,
    signature: ComponentSet,
    descriptor: EntityDescriptor,
) -> EcsResult<()> {
    let target = registry.descriptor_mut(clone)?;
    target.name = descriptor.name;
    target.active = descriptor.active;
    target.layer = descriptor.layer;
    target.tags = descriptor.tags;
    if descriptor.parent.is_some() {
        registry.set_parent(clone, descriptor.parent)?;
    }
    for tag in signature.tags() {
        registry.copy_component(source, clone, tag)?;
    }
    Ok(())
}

fn discard(registry: &mut EntityRegistry, id: EntityId) {
    if let Err(err) = registry.remove_entity(id) {
        tracing::warn!("Could not discard partially built entity {}: {}", id, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcsConfig, PoolConfig};

    fn setup() -> (EntityRegistry, EntityFactory) {
        let mut registry = EntityRegistry::default();
        let mut factory = EntityFactory::new();
        factory.register_builtin(&mut registry).unwrap();
        (registry, factory)
    }

    #[test]
    fn test_create_with_values() {
        let (mut registry, factory) = setup();
        let e = factory
            .create_entity_with(&mut registry, (Transform::at(4.0, 2.0), RigidBody::dynamic(3.0)))
            .unwrap();
        assert!((registry.get::<Transform>(e).unwrap().position.x - 4.0).abs() < f32::EPSILON);
        assert!(!registry.has::<Collider>(e));

        let d = factory.create_entity::<(Collider,)>(&mut registry).unwrap();
        assert!(registry.has::<Collider>(d));
    }

    #[test]
    fn test_assign_by_name() {
        let (mut registry, factory) = setup();
        let e = registry.create_entity();
        factory.assign(&mut registry, e, &["Transform", "Collider"]).unwrap();
        assert!(registry.has::<Transform>(e));
        assert!(registry.has::<Collider>(e));

        let err = factory.assign(&mut registry, e, &["RigidBody", "Sprite"]);
        assert_eq!(err, Err(EcsError::UnknownComponentType("Sprite".to_owned())));
        // nothing was assigned before the bad name was found
        assert!(!registry.has::<RigidBody>(e));
    }

    #[test]
    fn test_clone_copies_components() {
        let (mut registry, factory) = setup();
        let parent = registry.create_entity();
        let src = factory
            .create_entity_with(&mut registry, (Transform::at(1.0, 5.0), RigidBody::dynamic(7.0)))
            .unwrap();
        registry.set_parent(src, Some(parent)).unwrap();
        registry.rename(src, "Cat").unwrap();

        let clone = factory.clone_entity(&mut registry, src).unwrap();
        assert_ne!(clone, src);
        assert_eq!(registry.get::<Transform>(clone).unwrap(), registry.get::<Transform>(src).unwrap());
        assert_eq!(registry.get::<RigidBody>(clone).unwrap(), registry.get::<RigidBody>(src).unwrap());
        assert_eq!(registry.name(clone), Some("Cat"));
        assert_eq!(registry.scene_id(clone), Some(clone));
        assert_eq!(registry.children(parent), vec![src, clone]);

        registry.remove_entity(src).unwrap();
        assert!(matches!(
            factory.clone_entity(&mut registry, src),
            Err(EcsError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_default_prefab() {
        let (mut registry, mut factory) = setup();
        let e = factory.create_from_prefab(&mut registry, DEFAULT_PREFAB).unwrap();
        assert!(registry.has::<Transform>(e));
        assert!(registry.has::<RigidBody>(e));
        assert!(registry.has::<Collider>(e));

        assert_eq!(
            factory.create_from_prefab(&mut registry, "Rat"),
            Err(EcsError::UnknownPrefab("Rat".to_owned()))
        );

        factory.register_prefab("Ghost", &["Transform", "Sprite"]);
        let before = registry.len();
        assert!(factory.create_from_prefab(&mut registry, "Ghost").is_err());
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_failed_create_is_rolled_back() {
        let config = EcsConfig {
            pools: PoolConfig {
                initial_capacity: 1,
                growth_factor: 2,
                max_capacity: Some(1),
            },
            ..EcsConfig::default()
        };
        let mut registry = EntityRegistry::new(config).unwrap();
        let mut factory = EntityFactory::new();
        factory.register_builtin(&mut registry).unwrap();

        factory.create_entity::<(Transform,)>(&mut registry).unwrap();
        let err = factory.create_entity::<(RigidBody, Transform)>(&mut registry);
        assert!(matches!(err, Err(EcsError::AllocationFailure { .. })));
        assert_eq!(registry.len(), 1);
        registry.validate().unwrap();
    }

    #[test]
    fn test_failed_name_assign_is_rolled_back() {
        let config = EcsConfig {
            pools: PoolConfig {
                initial_capacity: 1,
                growth_factor: 2,
                max_capacity: Some(1),
            },
            ..EcsConfig::default()
        };
        let mut registry = EntityRegistry::new(config).unwrap();
        let mut factory = EntityFactory::new();
        factory.register_builtin(&mut registry).unwrap();
        let full = registry.create_entity();
        registry.assign::<Collider>(full).unwrap();

        let e = registry.create_entity();
        let err = factory.assign(&mut registry, e, &["Transform", "RigidBody", "Collider"]);
        assert!(matches!(err, Err(EcsError::AllocationFailure { .. })));
        assert!(registry.signature(e).unwrap().is_empty());
        registry.validate().unwrap();
    }

    #[test]
    fn test_load_component() {
        let (mut registry, factory) = setup();
        let e = registry.create_entity();
        let body = RigidBody::dynamic(9.0);
        factory
            .load_component(&mut registry, e, "RigidBody", Some(bytemuck::bytes_of(&body)))
            .unwrap();
        assert_eq!(registry.get::<RigidBody>(e).unwrap(), &body);

        factory.load_component(&mut registry, e, "Collider", None).unwrap();
        assert!(registry.has::<Collider>(e));
        assert!(factory.load_component(&mut registry, e, "Sprite", None).is_err());
    }
}

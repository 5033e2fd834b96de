//! # Engine Context
//!
//! The explicitly constructed owner of all entity state. It is created once
//! at start-up and handed to every system and script by reference.

use std::path::Path;

use crate::config::EcsConfig;
use crate::ecs::{EntityFactory, EntityId, EntityRegistry, TagRegistry};
use crate::error::EcsResult;

/// Registry, factory and gameplay tags for one running application.
///
/// Fields are public so callers can borrow them independently, e.g.
/// `ctx.factory.create_from_prefab(&mut ctx.registry, "GameObject")`.
#[derive(Debug)]
pub struct EcsContext {
    /// Entity and component storage.
    pub registry: EntityRegistry,
    /// Construction helpers and prefabs.
    pub factory: EntityFactory,
    /// Gameplay tag names.
    pub tags: TagRegistry,
}

impl EcsContext {
    /// Creates a context with the built-in components registered.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` is out of range
    /// - `AllocationFailure` if a built-in pool cannot be allocated
    pub fn new(config: EcsConfig) -> EcsResult<Self> {
        let mut registry = EntityRegistry::new(config)?;
        let mut factory = EntityFactory::new();
        factory.register_builtin(&mut registry)?;
        tracing::info!(
            "ECS context ready with {} component types",
            registry.component_types().len()
        );
        Ok(Self {
            registry,
            factory,
            tags: TagRegistry::new(),
        })
    }

    /// Creates a context from a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_config_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        Self::new(EcsConfig::from_file(path)?)
    }

    /// Instantiates a prefab.
    ///
    /// # Errors
    ///
    /// See [`EntityFactory::create_from_prefab`].
    pub fn create_from_prefab(&mut self, name: &str) -> EcsResult<EntityId> {
        self.factory.create_from_prefab(&mut self.registry, name)
    }

    /// Clones an entity and its components.
    ///
    /// # Errors
    ///
    /// See [`EntityFactory::clone_entity`].
    pub fn clone_entity(&mut self, id: EntityId) -> EcsResult<EntityId> {
        self.factory.clone_entity(&mut self.registry, id)
    }

    /// Tags an entity, defining the tag if needed.
    ///
    /// # Errors
    ///
    /// See [`TagRegistry::assign_tag`].
    pub fn assign_tag(&mut self, id: EntityId, name: &str) -> EcsResult<()> {
        self.tags.assign_tag(&mut self.registry, id, name)
    }

    /// Destroys an entity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the entity is not alive.
    pub fn remove_entity(&mut self, id: EntityId) -> EcsResult<()> {
        self.registry.remove_entity(id)
    }
}

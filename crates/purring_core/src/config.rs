//! # Storage Configuration
//!
//! Pool sizing and entity naming, loaded once at startup from TOML.
//!
//! ```toml
//! [pools]
//! initial_capacity = 16
//! growth_factor = 2
//! max_capacity = 65536
//!
//! [entities]
//! default_name_prefix = "GameObject"
//! max_handle_gap = 4096
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Default number of slots allocated for a new component pool.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Default geometric growth factor for pools.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Pool sizing policy.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Slots allocated when a pool is created.
    pub initial_capacity: usize,
    /// Multiplier applied to capacity when a full pool grows.
    pub growth_factor: usize,
    /// Upper bound on slots per pool. Growing past it is an allocation failure.
    pub max_capacity: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_POOL_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_capacity: None,
        }
    }
}

/// Default bound on slots skipped by one requested handle.
pub const DEFAULT_MAX_HANDLE_GAP: u32 = 4096;

/// Entity creation defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntityConfig {
    /// Prefix of generated entity names, followed by the slot index.
    pub default_name_prefix: String,
    /// How many unused slots a requested handle may skip past the current
    /// range. Requests further out are remapped.
    pub max_handle_gap: u32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            default_name_prefix: "GameObject".to_owned(),
            max_handle_gap: DEFAULT_MAX_HANDLE_GAP,
        }
    }
}

/// Complete storage configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Component pool sizing.
    pub pools: PoolConfig,
    /// Entity defaults.
    pub entities: EntityConfig,
}

impl EcsConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the text is not valid TOML or a value is out of range.
    pub fn from_toml_str(text: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EcsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks that all values are usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> EcsResult<()> {
        let pools = &self.pools;
        if pools.initial_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "pools.initial_capacity must be greater than zero".to_owned(),
            ));
        }
        if pools.growth_factor < 2 {
            return Err(EcsError::InvalidConfig(format!(
                "pools.growth_factor must be at least 2, got {}",
                pools.growth_factor
            )));
        }
        if let Some(max) = pools.max_capacity {
            if max < pools.initial_capacity {
                return Err(EcsError::InvalidConfig(format!(
                    "pools.max_capacity ({max}) is below pools.initial_capacity ({})",
                    pools.initial_capacity
                )));
            }
        }
        Ok(())
    }
}

//! Store configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `RECORDSTORE__*` environment variables
//! (`RECORDSTORE__BACKEND=slotted`, `RECORDSTORE__CACHE__CAPACITY=16`).
//!
//! ```toml
//! backend = "slotted"
//! template = ["title", "value"]
//!
//! [slotted]
//! capacity = 15
//! field_width = 40
//!
//! [cache]
//! enabled = true
//! capacity = 5
//! ```

use crate::backend::BackendKind;
use crate::error::{Error, Result};
use crate::storage::cache::DEFAULT_OVERLAY_CAPACITY;
use crate::storage::record::Template;
use crate::storage::slotted::{DEFAULT_CAPACITY, DEFAULT_FIELD_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "recordstore";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "RECORDSTORE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Which backend to build
    pub backend: BackendKind,
    /// Field names of every record, in order
    pub template: Template,
    pub slotted: SlottedConfig,
    pub cache: CacheConfig,
}

/// Geometry of the slotted backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlottedConfig {
    /// Number of slots
    pub capacity: usize,
    /// Bytes per non-id field
    pub field_width: usize,
}

/// LRU overlay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Put an LRU cache in front of the backend
    pub enabled: bool,
    /// Maximum cached records
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Slotted,
            template: Template::default(),
            slotted: SlottedConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for SlottedConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            field_width: DEFAULT_FIELD_WIDTH,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_OVERLAY_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Load defaults, the config file and environment overrides
    ///
    /// An explicit `path` must exist; without one, `recordstore.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = ::config::Config::builder()
            .add_source(file)
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: StoreConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse TOML text on top of the defaults
    pub fn from_toml(source: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(source, ::config::FileFormat::Toml))
            .build()?;
        let config: StoreConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.slotted.capacity == 0 {
            return Err(Error::Config("slotted.capacity must be > 0".to_string()));
        }
        if self.slotted.field_width == 0 {
            return Err(Error::Config("slotted.field_width must be > 0".to_string()));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(Error::Config("cache.capacity must be > 0".to_string()));
        }
        Ok(())
    }
}

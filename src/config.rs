//! Mapper configuration options.
//!
//! Options are plain serde structs so they can be loaded from a TOML file:
//!
//! ```toml
//! # Map SQL NULL to 0 / false / 0.0 for non-optional numeric and bool targets
//! coerce_null_to_default = true
//! # Seed the registry with the built-in primitive and array factories
//! builtins = true
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options that influence how built-in mappers behave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperOptions {
    /// Whether NULL read into a non-optional numeric or bool target yields the
    /// type's default value instead of an error.
    pub coerce_null_to_default: bool,

    /// Whether a new registry is seeded with the built-in factories.
    ///
    /// When `false` the registry starts empty and every type needs an
    /// explicitly registered mapper.
    pub builtins: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            coerce_null_to_default: false,
            builtins: true,
        }
    }
}

impl MapperOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Invalid mapper options")
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))
    }

    /// Return a copy with NULL coercion switched on or off.
    pub fn with_coerce_null_to_default(mut self, enabled: bool) -> Self {
        self.coerce_null_to_default = enabled;
        self
    }

    /// Return a copy with built-in seeding switched on or off.
    pub fn with_builtins(mut self, enabled: bool) -> Self {
        self.builtins = enabled;
        self
    }
}

//! Root configuration and per-statement runtime context.
//!
//! A [`Configuration`] owns the options and the [`MappingRegistry`] of one
//! configuration scope. A [`StatementContext`] is what the execution layer
//! passes to every factory and mapper call; the registry threads it through
//! untouched, while factories and mappers may read options or resolve other
//! types through it.

use std::collections::HashMap;
use std::sync::Arc;

use rowmap_core::TypeDescriptor;

use crate::config::MapperOptions;
use crate::error::MappingResult;
use crate::mapper::{ColumnMapperRef, RowMapperRef};
use crate::registry::MappingRegistry;

/// Options plus mapper registry for one configuration scope.
pub struct Configuration {
    options: MapperOptions,
    mappers: MappingRegistry,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(MapperOptions::default())
    }
}

impl Configuration {
    /// Create a root configuration. The registry is seeded with the built-in
    /// factories unless `options.builtins` is off.
    pub fn new(options: MapperOptions) -> Self {
        let mappers = if options.builtins {
            MappingRegistry::new()
        } else {
            MappingRegistry::empty()
        };
        Self { options, mappers }
    }

    /// The options of this scope.
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// The mapper registry of this scope.
    pub fn mappers(&self) -> &MappingRegistry {
        &self.mappers
    }

    /// Open a child scope.
    ///
    /// The child starts with a snapshot of this scope's registry; later
    /// registrations on either side are not seen by the other.
    pub fn fork(&self) -> Self {
        Self {
            options: self.options.clone(),
            mappers: self.mappers.snapshot(),
        }
    }

    /// Wrap this configuration in a statement context.
    pub fn into_statement_context(self) -> StatementContext {
        StatementContext::new(Arc::new(self))
    }
}

/// Runtime context for one statement execution.
#[derive(Clone)]
pub struct StatementContext {
    config: Arc<Configuration>,
    sql: Option<String>,
    attributes: HashMap<String, String>,
}

impl StatementContext {
    pub fn new(config: Arc<Configuration>) -> Self {
        Self {
            config,
            sql: None,
            attributes: HashMap::new(),
        }
    }

    /// Attach the SQL text being executed.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Attach a named attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn config(&self) -> &Arc<Configuration> {
        &self.config
    }

    pub fn options(&self) -> &MapperOptions {
        self.config.options()
    }

    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Resolve a column mapper through this context's registry.
    pub fn find_column_mapper_for(
        &self,
        ty: &TypeDescriptor,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        self.config.mappers().find_column_mapper_for(ty, self)
    }

    /// Resolve a row mapper through this context's registry.
    pub fn find_row_mapper_for(&self, ty: &TypeDescriptor) -> MappingResult<Option<RowMapperRef>> {
        self.config.mappers().find_row_mapper_for(ty, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_accessors() {
        let ctx = Configuration::default()
            .into_statement_context()
            .with_sql("SELECT id FROM users")
            .with_attribute("table", "users");

        assert_eq!(ctx.sql(), Some("SELECT id FROM users"));
        assert_eq!(ctx.attribute("table"), Some("users"));
        assert_eq!(ctx.attribute("missing"), None);
        assert!(!ctx.options().coerce_null_to_default);
    }

    #[test]
    fn test_builtins_option_controls_seeding() {
        let seeded = Configuration::new(MapperOptions::default()).into_statement_context();
        assert!(seeded
            .find_column_mapper_for(&TypeDescriptor::Int32)
            .unwrap()
            .is_some());

        let bare = Configuration::new(MapperOptions::default().with_builtins(false))
            .into_statement_context();
        assert!(bare
            .find_column_mapper_for(&TypeDescriptor::Int32)
            .unwrap()
            .is_none());
    }
}

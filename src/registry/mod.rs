//! Mapper registries.
//!
//! [`MappingRegistry`] is the entry point used by the statement layer. It
//! owns a [`ColumnMapperRegistry`] and a [`RowMapperRegistry`] wired so that
//! row lookups fall back to column mappers.
//!
//! # Resolution
//!
//! ```text
//! find_row_mapper_for(ty)
//!    │
//!    ├── row cache hit ───────────────────────────────► mapper
//!    ├── row factories, newest first ── first Some ──► cache, mapper
//!    ├── find_column_mapper_for(ty) ─── Some ────────► SingleColumnMapper, cache
//!    └── None (not cached)
//! ```
//!
//! # Registration
//!
//! Registering a factory puts it in front of every previously registered
//! factory of the same kind and invalidates that kind's cache. Row mappers
//! adapted from column mappers are also invalidated by column registrations.
//!
//! ```rust
//! use std::sync::Arc;
//! use rowmap::mapper::column_mapper_fn;
//! use rowmap::{MappingRegistry, TypeDescriptor};
//!
//! let registry = MappingRegistry::new();
//! registry.add_column_mapper_for(
//!     TypeDescriptor::named("Email"),
//!     Arc::new(column_mapper_fn(|row, column, ctx| {
//!         let raw: String = rowmap::builtin::read_column(row, column, ctx)?;
//!         Ok(raw.to_lowercase())
//!     })),
//! );
//! ```

mod column;
mod generation;
mod row;

pub use column::ColumnMapperRegistry;
pub use row::RowMapperRegistry;

use std::sync::Arc;

use rowmap_core::TypeDescriptor;
use serde::Serialize;

use crate::builtin::{BuiltInMapperFactory, SqlArrayMapperFactory};
use crate::context::StatementContext;
use crate::error::{InferenceError, MappingError, MappingResult};
use crate::inference::SqlType;
use crate::mapper::{
    ColumnMapper, ColumnMapperFactory, ColumnMapperRef, RowMapper, RowMapperFactory,
    RowMapperRef,
};

/// Row and column mapper registries of one configuration scope.
pub struct MappingRegistry {
    columns: Arc<ColumnMapperRegistry>,
    rows: RowMapperRegistry,
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MappingRegistry {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

impl MappingRegistry {
    /// Create a registry seeded with the built-in primitive and array
    /// factories.
    pub fn new() -> Self {
        let builtins: Vec<Arc<dyn ColumnMapperFactory>> =
            vec![Arc::new(BuiltInMapperFactory), Arc::new(SqlArrayMapperFactory)];
        Self::with_columns(ColumnMapperRegistry::with_factories(builtins))
    }

    /// Create a registry with no factories at all.
    pub fn empty() -> Self {
        Self::with_columns(ColumnMapperRegistry::new())
    }

    fn with_columns(columns: ColumnMapperRegistry) -> Self {
        let columns = Arc::new(columns);
        Self {
            rows: RowMapperRegistry::new(columns.clone()),
            columns,
        }
    }

    /// Independent copy of this registry.
    ///
    /// The copy has the same factories in the same order and starts with
    /// the currently valid cache entries. Registrations on either side are
    /// not visible to the other.
    pub fn snapshot(&self) -> Self {
        let columns = Arc::new(self.columns.snapshot());
        Self {
            rows: self.rows.snapshot(columns.clone()),
            columns,
        }
    }

    pub fn columns(&self) -> &ColumnMapperRegistry {
        &self.columns
    }

    pub fn rows(&self) -> &RowMapperRegistry {
        &self.rows
    }

    /// Register a row mapper for the type inferred from its output.
    pub fn add_row_mapper<M>(&self, mapper: Arc<M>) -> Result<&Self, InferenceError>
    where
        M: RowMapper,
        M::Output: SqlType,
    {
        self.rows.register_mapper(mapper)?;
        Ok(self)
    }

    /// Register a row mapper for an explicit type.
    pub fn add_row_mapper_for(&self, ty: TypeDescriptor, mapper: RowMapperRef) -> &Self {
        self.rows.register_mapper_for(ty, mapper);
        self
    }

    /// Register a row mapper factory.
    pub fn add_row_mapper_factory<F: RowMapperFactory + 'static>(&self, factory: F) -> &Self {
        self.rows.register(factory);
        self
    }

    /// Register a column mapper for the type inferred from its output.
    pub fn add_column_mapper<M>(&self, mapper: Arc<M>) -> Result<&Self, InferenceError>
    where
        M: ColumnMapper,
        M::Output: SqlType,
    {
        self.columns.register_mapper(mapper)?;
        Ok(self)
    }

    /// Register a column mapper for an explicit type.
    pub fn add_column_mapper_for(&self, ty: TypeDescriptor, mapper: ColumnMapperRef) -> &Self {
        self.columns.register_mapper_for(ty, mapper);
        self
    }

    /// Register a column mapper factory.
    pub fn add_column_mapper_factory<F: ColumnMapperFactory + 'static>(
        &self,
        factory: F,
    ) -> &Self {
        self.columns.register(factory);
        self
    }

    /// Find a row mapper for `ty`, falling back to a column mapper that
    /// reads the first column.
    pub fn find_row_mapper_for(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>> {
        self.rows.resolve(ty, ctx)
    }

    /// Find a column mapper for `ty`.
    pub fn find_column_mapper_for(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        self.columns.resolve(ty, ctx)
    }

    /// Like [`find_row_mapper_for`](Self::find_row_mapper_for), but a
    /// missing mapper is an error.
    pub fn require_row_mapper_for(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<RowMapperRef> {
        self.find_row_mapper_for(ty, ctx)?
            .ok_or_else(|| MappingError::NoMapper { ty: ty.clone() })
    }

    /// Like [`find_column_mapper_for`](Self::find_column_mapper_for), but a
    /// missing mapper is an error.
    pub fn require_column_mapper_for(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<ColumnMapperRef> {
        self.find_column_mapper_for(ty, ctx)?
            .ok_or_else(|| MappingError::NoMapper { ty: ty.clone() })
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            column_factories: self.columns.factory_count(),
            row_factories: self.rows.factory_count(),
            cached_column_mappers: self.columns.cached_count(),
            cached_row_mappers: self.rows.cached_count(),
            column_generation: self.columns.generation(),
            row_generation: self.rows.generation(),
        }
    }
}

/// Point-in-time counters of a [`MappingRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub column_factories: usize,
    pub row_factories: usize,
    pub cached_column_mappers: usize,
    pub cached_row_mappers: usize,
    pub column_generation: u64,
    pub row_generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperOptions;
    use crate::context::Configuration;
    use crate::mapper::column_mapper_fn;
    use rowmap_core::{ResultRow, SqlValue};

    fn ctx() -> StatementContext {
        Configuration::new(MapperOptions::default().with_builtins(false)).into_statement_context()
    }

    #[test]
    fn test_new_seeds_builtins() {
        let registry = MappingRegistry::new();
        let stats = registry.stats();
        assert_eq!(stats.column_factories, 2);
        assert_eq!(stats.row_factories, 0);

        let ctx = ctx();
        let row = ResultRow::builder(0).column("n", SqlValue::Int32(5)).build();
        let mapper = registry
            .find_row_mapper_for(&TypeDescriptor::Int64, &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(mapper.map_as::<i64>(&row, &ctx).unwrap(), 5);
        assert_eq!(registry.stats().cached_row_mappers, 1);
        assert_eq!(registry.stats().cached_column_mappers, 1);
    }

    #[test]
    fn test_require_reports_missing_type() {
        let registry = MappingRegistry::empty();
        let err = registry
            .require_column_mapper_for(&TypeDescriptor::named("Person"), &ctx())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "No mapper registered for type Person");
        assert!(registry
            .require_row_mapper_for(&TypeDescriptor::Int32, &ctx())
            .is_err());
    }

    #[test]
    fn test_clone_is_a_snapshot() {
        let registry = MappingRegistry::empty();
        let copy = registry.clone();
        copy.add_column_mapper_for(
            TypeDescriptor::named("Email"),
            Arc::new(column_mapper_fn(|_, _, _| Ok(String::new()))),
        );

        let ctx = ctx();
        assert!(copy
            .find_row_mapper_for(&TypeDescriptor::named("Email"), &ctx)
            .unwrap()
            .is_some());
        assert!(registry
            .find_row_mapper_for(&TypeDescriptor::named("Email"), &ctx)
            .unwrap()
            .is_none());
    }
}

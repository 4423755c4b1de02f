//! Registry of row mapper factories, with fallback to column mappers.

use std::sync::Arc;

use rowmap_core::TypeDescriptor;
use tracing::debug;

use super::column::ColumnMapperRegistry;
use super::generation::{FactoryChain, GenerationCache};
use crate::context::StatementContext;
use crate::error::{InferenceError, MappingResult};
use crate::inference::{InferredRowMapperFactory, SqlType};
use crate::mapper::{RowMapper, RowMapperFactory, RowMapperRef, SingleColumnMapper};

/// Row cache entries are stamped with both the row and the column list
/// generation, because a fallback entry depends on the column factories.
type RowStamp = (u64, u64);

/// Ordered row mapper factories plus a per-descriptor cache.
///
/// When no row factory produces a mapper for a type, the column registry is
/// asked instead and its mapper is adapted to read the first column of the
/// row. Adapted mappers are cached like any other row mapper.
pub struct RowMapperRegistry {
    factories: FactoryChain<dyn RowMapperFactory>,
    cache: GenerationCache<RowMapperRef, RowStamp>,
    columns: Arc<ColumnMapperRegistry>,
}

impl RowMapperRegistry {
    /// Create a registry with no factories that falls back to `columns`.
    pub fn new(columns: Arc<ColumnMapperRegistry>) -> Self {
        Self {
            factories: FactoryChain::new(),
            cache: GenerationCache::new(),
            columns,
        }
    }

    /// The column registry used for fallback.
    pub fn columns(&self) -> &Arc<ColumnMapperRegistry> {
        &self.columns
    }

    /// Register a factory with the highest priority.
    pub fn register<F: RowMapperFactory + 'static>(&self, factory: F) {
        self.register_shared(Arc::new(factory));
    }

    /// Register an already shared factory with the highest priority.
    pub fn register_shared(&self, factory: Arc<dyn RowMapperFactory>) {
        let generation = self.factories.push_front(factory);
        self.cache.clear();
        debug!(generation, "Registered row mapper factory");
    }

    /// Register a mapper for the descriptor inferred from its output type.
    pub fn register_mapper<M>(&self, mapper: Arc<M>) -> Result<(), InferenceError>
    where
        M: RowMapper,
        M::Output: SqlType,
    {
        let factory = InferredRowMapperFactory::new(mapper)?;
        debug!(ty = %factory.mapped_type(), "Registering row mapper");
        self.register(factory);
        Ok(())
    }

    /// Register a mapper for an explicitly given descriptor.
    pub fn register_mapper_for(&self, ty: TypeDescriptor, mapper: RowMapperRef) {
        debug!(ty = %ty, "Registering row mapper");
        self.register(InferredRowMapperFactory::for_type(ty, mapper));
    }

    /// Find the row mapper for `ty`.
    ///
    /// Row factories are consulted first, then the column registry. Returns
    /// `Ok(None)` when neither has a mapper; that outcome is not cached.
    pub fn resolve(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>> {
        let list = self.factories.load();
        let stamp = (list.generation, self.columns.generation());
        if let Some(mapper) = self.cache.get(ty, stamp) {
            debug!(ty = %ty, "Row mapper cache hit");
            return Ok(Some(mapper));
        }

        for factory in &list.factories {
            if let Some(mapper) = factory.build(ty, ctx)? {
                debug!(
                    ty = %ty,
                    mapper = mapper.mapper_name(),
                    generation = list.generation,
                    "Row mapper built"
                );
                return Ok(Some(self.cache.insert(ty, stamp, mapper)));
            }
        }

        if let Some(column) = self.columns.resolve(ty, ctx)? {
            debug!(ty = %ty, "Row mapper adapted from column mapper");
            let mapper: RowMapperRef = Arc::new(SingleColumnMapper::new(column));
            return Ok(Some(self.cache.insert(ty, stamp, mapper)));
        }

        debug!(ty = %ty, "No row mapper factory matched");
        Ok(None)
    }

    /// Generation of the current factory list. Bumped by every registration.
    pub fn generation(&self) -> u64 {
        self.factories.generation()
    }

    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Independent copy that falls back to `columns`.
    ///
    /// `columns` is expected to be a snapshot of this registry's column
    /// registry; only cache entries built against its current generation
    /// are carried over.
    pub fn snapshot(&self, columns: Arc<ColumnMapperRegistry>) -> Self {
        let list = self.factories.load();
        let stamp = (list.generation, columns.generation());
        Self {
            cache: self.cache.snapshot(stamp),
            factories: FactoryChain::fork(list),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Configuration;
    use crate::mapper::{column_mapper_fn, row_factory_fn, row_mapper_fn, ColumnMapperRef};
    use rowmap_core::{ResultRow, SqlValue};

    fn ctx() -> StatementContext {
        Configuration::default().into_statement_context()
    }

    fn registry() -> RowMapperRegistry {
        RowMapperRegistry::new(Arc::new(ColumnMapperRegistry::new()))
    }

    fn row() -> ResultRow {
        ResultRow::builder(0)
            .column("first", SqlValue::text("a"))
            .column("second", SqlValue::text("b"))
            .build()
    }

    #[test]
    fn test_row_factory_takes_precedence_over_fallback() {
        let registry = registry();
        let column: ColumnMapperRef = Arc::new(column_mapper_fn(|_, _, _| Ok("column".to_string())));
        registry
            .columns()
            .register_mapper_for(TypeDescriptor::Text, column);
        let row_mapper: RowMapperRef = Arc::new(row_mapper_fn(|_, _| Ok("row".to_string())));
        registry.register_mapper_for(TypeDescriptor::Text, row_mapper.clone());

        let resolved = registry.resolve(&TypeDescriptor::Text, &ctx()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved, &row_mapper));
    }

    #[test]
    fn test_fallback_wraps_column_mapper() {
        let registry = registry();
        let column: ColumnMapperRef = Arc::new(column_mapper_fn(|row, column, _| {
            Ok(row.column_name(column).unwrap_or_default().to_string())
        }));
        registry
            .columns()
            .register_mapper_for(TypeDescriptor::named("Label"), column.clone());
        let ctx = ctx();

        let mapper = registry
            .resolve(&TypeDescriptor::named("Label"), &ctx)
            .unwrap()
            .unwrap();
        let adapter = mapper
            .as_any()
            .downcast_ref::<SingleColumnMapper>()
            .unwrap();
        assert!(Arc::ptr_eq(adapter.column_mapper(), &column));
        assert_eq!(mapper.map_as::<String>(&row(), &ctx).unwrap(), "first");

        let again = registry
            .resolve(&TypeDescriptor::named("Label"), &ctx)
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&mapper, &again));
    }

    #[test]
    fn test_column_registration_invalidates_fallback() {
        let registry = registry();
        registry.columns().register_mapper_for(
            TypeDescriptor::Text,
            Arc::new(column_mapper_fn(|_, _, _| Ok(1_i32))),
        );
        let ctx = ctx();
        let before = registry.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();

        registry.columns().register_mapper_for(
            TypeDescriptor::Text,
            Arc::new(column_mapper_fn(|_, _, _| Ok(2_i32))),
        );
        let after = registry.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.map_as::<i32>(&row(), &ctx).unwrap(), 2);
    }

    #[test]
    fn test_nothing_found_is_not_cached() {
        let registry = registry();
        registry.register(row_factory_fn(|_, _| Ok(None)));

        assert!(registry
            .resolve(&TypeDescriptor::named("Missing"), &ctx())
            .unwrap()
            .is_none());
        assert_eq!(registry.cached_count(), 0);
    }
}

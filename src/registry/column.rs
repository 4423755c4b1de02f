//! Registry of column mapper factories.

use std::sync::Arc;

use rowmap_core::TypeDescriptor;
use tracing::debug;

use super::generation::{FactoryChain, GenerationCache};
use crate::context::StatementContext;
use crate::error::{InferenceError, MappingResult};
use crate::inference::{InferredColumnMapperFactory, SqlType};
use crate::mapper::{ColumnMapper, ColumnMapperFactory, ColumnMapperRef};

/// Ordered column mapper factories plus a per-descriptor cache of the
/// mappers they produced.
///
/// The most recently registered factory is consulted first. Any
/// registration invalidates every cached column mapper.
pub struct ColumnMapperRegistry {
    factories: FactoryChain<dyn ColumnMapperFactory>,
    cache: GenerationCache<ColumnMapperRef, u64>,
}

impl Default for ColumnMapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnMapperRegistry {
    /// Create a registry with no factories.
    pub fn new() -> Self {
        Self::with_factories(Vec::new())
    }

    /// Create a registry that consults `factories` in the given order.
    pub fn with_factories(factories: Vec<Arc<dyn ColumnMapperFactory>>) -> Self {
        Self {
            factories: FactoryChain::from_factories(factories),
            cache: GenerationCache::new(),
        }
    }

    /// Register a factory with the highest priority.
    pub fn register<F: ColumnMapperFactory + 'static>(&self, factory: F) {
        self.register_shared(Arc::new(factory));
    }

    /// Register an already shared factory with the highest priority.
    pub fn register_shared(&self, factory: Arc<dyn ColumnMapperFactory>) {
        let generation = self.factories.push_front(factory);
        self.cache.clear();
        debug!(generation, "Registered column mapper factory");
    }

    /// Register a mapper for the descriptor inferred from its output type.
    pub fn register_mapper<M>(&self, mapper: Arc<M>) -> Result<(), InferenceError>
    where
        M: ColumnMapper,
        M::Output: SqlType,
    {
        let factory = InferredColumnMapperFactory::new(mapper)?;
        debug!(ty = %factory.mapped_type(), "Registering column mapper");
        self.register(factory);
        Ok(())
    }

    /// Register a mapper for an explicitly given descriptor.
    pub fn register_mapper_for(&self, ty: TypeDescriptor, mapper: ColumnMapperRef) {
        debug!(ty = %ty, "Registering column mapper");
        self.register(InferredColumnMapperFactory::for_type(ty, mapper));
    }

    /// Find the column mapper for `ty`.
    ///
    /// Returns `Ok(None)` when every factory declines. A factory error is
    /// returned as is and nothing is cached.
    pub fn resolve(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        let list = self.factories.load();
        if let Some(mapper) = self.cache.get(ty, list.generation) {
            debug!(ty = %ty, "Column mapper cache hit");
            return Ok(Some(mapper));
        }

        // No guard is held here: factories may resolve other types.
        for factory in &list.factories {
            if let Some(mapper) = factory.build(ty, ctx)? {
                debug!(
                    ty = %ty,
                    mapper = mapper.mapper_name(),
                    generation = list.generation,
                    "Column mapper built"
                );
                return Ok(Some(self.cache.insert(ty, list.generation, mapper)));
            }
        }

        debug!(ty = %ty, "No column mapper factory matched");
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

    /// Independent copy with the same factories and the cache entries that
    /// are valid for them.
    pub fn snapshot(&self) -> Self {
        let list = self.factories.load();
        Self {
            cache: self.cache.snapshot(list.generation),
            factories: FactoryChain::fork(list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Configuration;
    use crate::error::MappingError;
    use crate::mapper::{column_factory_fn, column_mapper_fn};

    fn ctx() -> StatementContext {
        Configuration::default().into_statement_context()
    }

    fn constant(value: &'static str) -> ColumnMapperRef {
        Arc::new(column_mapper_fn(move |_, _, _| Ok(value.to_string())))
    }

    #[test]
    fn test_later_registration_wins() {
        let registry = ColumnMapperRegistry::new();
        let first = constant("first");
        let second = constant("second");
        registry.register_mapper_for(TypeDescriptor::Text, first);
        registry.register_mapper_for(TypeDescriptor::Text, second.clone());

        let resolved = registry.resolve(&TypeDescriptor::Text, &ctx()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved, &second));
        assert_eq!(registry.factory_count(), 2);
    }

    #[test]
    fn test_seeded_factories_keep_their_order() {
        let first = constant("first");
        let factories: Vec<Arc<dyn ColumnMapperFactory>> = vec![
            Arc::new(InferredColumnMapperFactory::for_type(
                TypeDescriptor::Text,
                first.clone(),
            )),
            Arc::new(InferredColumnMapperFactory::for_type(
                TypeDescriptor::Text,
                constant("second"),
            )),
        ];
        let registry = ColumnMapperRegistry::with_factories(factories);

        let resolved = registry.resolve(&TypeDescriptor::Text, &ctx()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved, &first));
        assert_eq!(registry.generation(), 0);
    }

    #[test]
    fn test_cache_returns_same_instance_until_registration() {
        let registry = ColumnMapperRegistry::new();
        registry.register(column_factory_fn(|ty, _| {
            Ok((*ty == TypeDescriptor::Text).then(|| constant("fresh")))
        }));
        let ctx = ctx();

        let a = registry.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();
        let b = registry.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.cached_count(), 1);

        registry.register_mapper_for(TypeDescriptor::Int32, constant("unrelated"));
        assert_eq!(registry.cached_count(), 0);
        let c = registry.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_all_declines_is_none() {
        let registry = ColumnMapperRegistry::new();
        registry.register(column_factory_fn(|_, _| Ok(None)));

        assert!(registry
            .resolve(&TypeDescriptor::named("Person"), &ctx())
            .unwrap()
            .is_none());
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = ColumnMapperRegistry::new();
        registry.register_mapper_for(TypeDescriptor::Text, constant("never reached"));
        registry.register(column_factory_fn(|ty, _| {
            Err(MappingError::factory(ty, "metadata unavailable"))
        }));

        let err = registry.resolve(&TypeDescriptor::Text, &ctx()).unwrap_err();
        assert!(matches!(err, MappingError::Factory { .. }));
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_register_mapper_infers_type() {
        let registry = ColumnMapperRegistry::new();
        registry
            .register_mapper(Arc::new(column_mapper_fn(|_, _, _| Ok(Some(1_i64)))))
            .unwrap();

        let ctx = ctx();
        assert!(registry
            .resolve(&TypeDescriptor::optional(TypeDescriptor::Int64), &ctx)
            .unwrap()
            .is_some());
        assert!(registry
            .resolve(&TypeDescriptor::Int64, &ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let registry = ColumnMapperRegistry::new();
        registry.register_mapper_for(TypeDescriptor::Text, constant("shared"));
        let ctx = ctx();
        let cached = registry.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();

        let copy = registry.snapshot();
        let from_copy = copy.resolve(&TypeDescriptor::Text, &ctx).unwrap().unwrap();
        assert!(Arc::ptr_eq(&cached, &from_copy));

        copy.register_mapper_for(TypeDescriptor::Uuid, constant("copy only"));
        assert!(registry.resolve(&TypeDescriptor::Uuid, &ctx).unwrap().is_none());
        assert!(copy.resolve(&TypeDescriptor::Uuid, &ctx).unwrap().is_some());
        assert_eq!(registry.factory_count(), 1);
    }
}

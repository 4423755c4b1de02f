//! Mapper factories.
//!
//! A factory is asked for a mapper for one exact [`TypeDescriptor`] and either
//! produces one, declines with `Ok(None)`, or fails with an error. Declining
//! is the normal way of saying "not my type" and lets the registry move on to
//! the next factory; an error aborts the lookup.

use std::sync::Arc;

use rowmap_core::TypeDescriptor;

use super::{ColumnMapperRef, RowMapperRef};
use crate::context::StatementContext;
use crate::error::MappingResult;

/// Produces column mappers on demand.
pub trait ColumnMapperFactory: Send + Sync {
    /// Build a column mapper for `ty`, or decline with `Ok(None)`.
    ///
    /// Implementations may resolve other types through `ctx` while building.
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>>;
}

/// Produces row mappers on demand.
pub trait RowMapperFactory: Send + Sync {
    /// Build a row mapper for `ty`, or decline with `Ok(None)`.
    ///
    /// Implementations may resolve other types through `ctx` while building.
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>>;
}

impl<F: ColumnMapperFactory + ?Sized> ColumnMapperFactory for Arc<F> {
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        (**self).build(ty, ctx)
    }
}

impl<F: RowMapperFactory + ?Sized> RowMapperFactory for Arc<F> {
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>> {
        (**self).build(ty, ctx)
    }
}

/// Column mapper factory backed by a closure. See [`column_factory_fn`].
pub struct FnColumnMapperFactory<F>(F);

/// Build a column mapper factory from a closure.
pub fn column_factory_fn<F>(f: F) -> FnColumnMapperFactory<F>
where
    F: Fn(&TypeDescriptor, &StatementContext) -> MappingResult<Option<ColumnMapperRef>>
        + Send
        + Sync,
{
    FnColumnMapperFactory(f)
}

impl<F> ColumnMapperFactory for FnColumnMapperFactory<F>
where
    F: Fn(&TypeDescriptor, &StatementContext) -> MappingResult<Option<ColumnMapperRef>>
        + Send
        + Sync,
{
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        (self.0)(ty, ctx)
    }
}

/// Row mapper factory backed by a closure. See [`row_factory_fn`].
pub struct FnRowMapperFactory<F>(F);

/// Build a row mapper factory from a closure.
pub fn row_factory_fn<F>(f: F) -> FnRowMapperFactory<F>
where
    F: Fn(&TypeDescriptor, &StatementContext) -> MappingResult<Option<RowMapperRef>>
        + Send
        + Sync,
{
    FnRowMapperFactory(f)
}

impl<F> RowMapperFactory for FnRowMapperFactory<F>
where
    F: Fn(&TypeDescriptor, &StatementContext) -> MappingResult<Option<RowMapperRef>>
        + Send
        + Sync,
{
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>> {
        (self.0)(ty, ctx)
    }
}

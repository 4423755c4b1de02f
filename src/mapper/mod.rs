//! Mapper capabilities.
//!
//! A [`ColumnMapper`] reads one column of the current row into a typed value;
//! a [`RowMapper`] reads the whole row. Both are implemented with a concrete
//! `Output` type. The registries store them type-erased behind
//! [`DynColumnMapper`] / [`DynRowMapper`], which every typed mapper gets for
//! free, and produce [`MappedValue`]s that the caller downcasts.
//!
//! ```rust
//! use rowmap::mapper::ColumnMapper;
//! use rowmap::{MappingResult, ResultRow, StatementContext};
//!
//! struct Upper;
//!
//! impl ColumnMapper for Upper {
//!     type Output = String;
//!
//!     fn map(&self, row: &ResultRow, column: usize, ctx: &StatementContext) -> MappingResult<String> {
//!         let text: String = rowmap::builtin::read_column(row, column, ctx)?;
//!         Ok(text.to_uppercase())
//!     }
//! }
//! ```

pub mod factory;
pub mod single_column;
mod value;

pub use factory::{
    column_factory_fn, row_factory_fn, ColumnMapperFactory, FnColumnMapperFactory,
    FnRowMapperFactory, RowMapperFactory,
};
pub use single_column::SingleColumnMapper;
pub use value::MappedValue;

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rowmap_core::ResultRow;

use crate::context::StatementContext;
use crate::error::MappingResult;

/// Reads one column of the current row as `Output`.
///
/// Implementations are stateless or immutable after construction; the same
/// instance is shared across threads once registered.
pub trait ColumnMapper: Send + Sync + 'static {
    /// Rust type produced by this mapper.
    type Output: fmt::Debug + Send + 'static;

    /// Map the value at `column` (0-based) of `row`.
    fn map(
        &self,
        row: &ResultRow,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<Self::Output>;
}

/// Reads the whole current row as `Output`.
pub trait RowMapper: Send + Sync + 'static {
    /// Rust type produced by this mapper.
    type Output: fmt::Debug + Send + 'static;

    /// Map `row`.
    fn map(&self, row: &ResultRow, ctx: &StatementContext) -> MappingResult<Self::Output>;
}

/// Type-erased column mapper, as stored in the registry.
pub trait DynColumnMapper: Send + Sync {
    /// Map the value at `column` of `row` into a boxed value.
    fn map_value(
        &self,
        row: &ResultRow,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<MappedValue>;

    /// Rust type name of the mapper, for diagnostics.
    fn mapper_name(&self) -> &'static str;

    /// Rust type name of the mapped values, for diagnostics.
    fn output_name(&self) -> &'static str;

    /// The concrete mapper, for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Type-erased row mapper, as stored in the registry.
pub trait DynRowMapper: Send + Sync {
    /// Map `row` into a boxed value.
    fn map_value(&self, row: &ResultRow, ctx: &StatementContext) -> MappingResult<MappedValue>;

    /// Rust type name of the mapper, for diagnostics.
    fn mapper_name(&self) -> &'static str;

    /// Rust type name of the mapped values, for diagnostics.
    fn output_name(&self) -> &'static str;

    /// The concrete mapper, for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a registered column mapper.
pub type ColumnMapperRef = Arc<dyn DynColumnMapper>;

/// Shared handle to a registered row mapper.
pub type RowMapperRef = Arc<dyn DynRowMapper>;

impl<M: ColumnMapper> DynColumnMapper for M {
    fn map_value(
        &self,
        row: &ResultRow,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<MappedValue> {
        self.map(row, column, ctx).map(MappedValue::new)
    }

    fn mapper_name(&self) -> &'static str {
        type_name::<M>()
    }

    fn output_name(&self) -> &'static str {
        type_name::<M::Output>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<M: RowMapper> DynRowMapper for M {
    fn map_value(&self, row: &ResultRow, ctx: &StatementContext) -> MappingResult<MappedValue> {
        self.map(row, ctx).map(MappedValue::new)
    }

    fn mapper_name(&self) -> &'static str {
        type_name::<M>()
    }

    fn output_name(&self) -> &'static str {
        type_name::<M::Output>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<'a> dyn DynColumnMapper + 'a {
    /// Map a column and downcast the result to `T`.
    pub fn map_as<T: Any>(
        &self,
        row: &ResultRow,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<T> {
        self.map_value(row, column, ctx)?.downcast()
    }
}

impl<'a> dyn DynRowMapper + 'a {
    /// Map a row and downcast the result to `T`.
    pub fn map_as<T: Any>(&self, row: &ResultRow, ctx: &StatementContext) -> MappingResult<T> {
        self.map_value(row, ctx)?.downcast()
    }
}

impl fmt::Debug for dyn DynColumnMapper + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnMapper")
            .field("mapper", &self.mapper_name())
            .field("output", &self.output_name())
            .finish()
    }
}

impl fmt::Debug for dyn DynRowMapper + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMapper")
            .field("mapper", &self.mapper_name())
            .field("output", &self.output_name())
            .finish()
    }
}

/// Column mapper backed by a closure. See [`column_mapper_fn`].
pub struct FnColumnMapper<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

/// Build a column mapper from a closure.
pub fn column_mapper_fn<F, T>(f: F) -> FnColumnMapper<F, T>
where
    F: Fn(&ResultRow, usize, &StatementContext) -> MappingResult<T> + Send + Sync + 'static,
    T: fmt::Debug + Send + 'static,
{
    FnColumnMapper {
        f,
        _output: PhantomData,
    }
}

impl<F, T> ColumnMapper for FnColumnMapper<F, T>
where
    F: Fn(&ResultRow, usize, &StatementContext) -> MappingResult<T> + Send + Sync + 'static,
    T: fmt::Debug + Send + 'static,
{
    type Output = T;

    fn map(&self, row: &ResultRow, column: usize, ctx: &StatementContext) -> MappingResult<T> {
        (self.f)(row, column, ctx)
    }
}

/// Row mapper backed by a closure. See [`row_mapper_fn`].
pub struct FnRowMapper<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

/// Build a row mapper from a closure.
pub fn row_mapper_fn<F, T>(f: F) -> FnRowMapper<F, T>
where
    F: Fn(&ResultRow, &StatementContext) -> MappingResult<T> + Send + Sync + 'static,
    T: fmt::Debug + Send + 'static,
{
    FnRowMapper {
        f,
        _output: PhantomData,
    }
}

impl<F, T> RowMapper for FnRowMapper<F, T>
where
    F: Fn(&ResultRow, &StatementContext) -> MappingResult<T> + Send + Sync + 'static,
    T: fmt::Debug + Send + 'static,
{
    type Output = T;

    fn map(&self, row: &ResultRow, ctx: &StatementContext) -> MappingResult<T> {
        (self.f)(row, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Configuration;
    use rowmap_core::SqlValue;

    fn row() -> ResultRow {
        ResultRow::builder(0)
            .column("id", SqlValue::Int64(7))
            .column("name", SqlValue::text("ada"))
            .build()
    }

    #[test]
    fn test_erased_column_mapper_round_trips_output() {
        let ctx = Configuration::default().into_statement_context();
        let mapper: ColumnMapperRef = Arc::new(column_mapper_fn(|row, column, _ctx| {
            Ok(row.get(column).and_then(SqlValue::as_i64).unwrap_or(-1) * 2)
        }));

        assert_eq!(mapper.map_as::<i64>(&row(), 0, &ctx).unwrap(), 14);
        assert_eq!(mapper.output_name(), "i64");
        assert!(mapper.map_as::<String>(&row(), 0, &ctx).is_err());
    }

    #[test]
    fn test_erased_row_mapper_round_trips_output() {
        let ctx = Configuration::default().into_statement_context();
        let mapper: RowMapperRef = Arc::new(row_mapper_fn(|row, _ctx| {
            Ok(row.columns().join(","))
        }));

        assert_eq!(mapper.map_as::<String>(&row(), &ctx).unwrap(), "id,name");
        assert!(mapper.mapper_name().contains("FnRowMapper"));
    }
}

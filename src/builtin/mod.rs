//! Built-in mappers for primitive column types.
//!
//! Every [`MappingRegistry`](crate::MappingRegistry) created with
//! `MappingRegistry::new()` starts with two factories, registered first so
//! that anything the application registers takes priority:
//!
//! - [`BuiltInMapperFactory`] for primitive descriptors and `optional<...>`
//!   of primitives
//! - [`SqlArrayMapperFactory`] for `array<...>` descriptors
//!
//! Primitive descriptors map to Rust types as follows:
//!
//! | Descriptor      | Rust type                  |
//! |-----------------|----------------------------|
//! | `bool`          | `bool`                     |
//! | `small_int`     | `i16`                      |
//! | `int`           | `i32`                      |
//! | `big_int`       | `i64`                      |
//! | `float`         | `f32`                      |
//! | `double`        | `f64`                      |
//! | `decimal`       | `rust_decimal::Decimal`    |
//! | `text`          | `String`                   |
//! | `bytes`         | `Vec<u8>`                  |
//! | `uuid`          | `uuid::Uuid`               |
//! | `date`          | `chrono::NaiveDate`        |
//! | `time`          | `chrono::NaiveTime`        |
//! | `date_time`     | `chrono::NaiveDateTime`    |
//! | `timestamp_tz`  | `chrono::DateTime<Utc>`    |
//! | `json`          | `serde_json::Value`        |

mod array;
mod convert;

pub use array::{ArrayColumnMapper, SqlArrayMapperFactory};
pub use convert::FromSqlValue;

use std::marker::PhantomData;
use std::sync::Arc;

use rowmap_core::{ResultRow, TypeDescriptor};

use crate::context::StatementContext;
use crate::error::{MappingError, MappingResult};
use crate::mapper::{ColumnMapper, ColumnMapperFactory, ColumnMapperRef};

/// Invoke `$callback! { Variant => RustType, ... }` with every primitive
/// descriptor variant and the Rust type it maps to.
macro_rules! for_each_primitive {
    ($callback:ident) => {
        $callback! {
            Bool => bool,
            Int16 => i16,
            Int32 => i32,
            Int64 => i64,
            Float32 => f32,
            Float64 => f64,
            Decimal => ::rust_decimal::Decimal,
            Text => String,
            Bytes => Vec<u8>,
            Uuid => ::uuid::Uuid,
            Date => ::chrono::NaiveDate,
            Time => ::chrono::NaiveTime,
            LocalDateTime => ::chrono::NaiveDateTime,
            ZonedDateTime => ::chrono::DateTime<::chrono::Utc>,
            Json => ::serde_json::Value,
        }
    };
}

pub(crate) use for_each_primitive;

/// Read `column` of `row` as `T`.
///
/// This is the building block of the built-in mappers and is handy inside
/// application mappers that read several columns.
pub fn read_column<T: FromSqlValue>(
    row: &ResultRow,
    column: usize,
    ctx: &StatementContext,
) -> MappingResult<T> {
    let value = row.get(column).ok_or(MappingError::ColumnOutOfRange {
        column,
        count: row.column_count(),
    })?;
    T::from_sql_value(value, column, ctx)
}

/// Read the column labelled `name` (case-insensitive) of `row` as `T`.
pub fn read_named_column<T: FromSqlValue>(
    row: &ResultRow,
    name: &str,
    ctx: &StatementContext,
) -> MappingResult<T> {
    let column = row
        .column_index(name)
        .ok_or_else(|| MappingError::ColumnNotFound(name.to_string()))?;
    read_column(row, column, ctx)
}

/// Column mapper that converts a single value with [`FromSqlValue`].
pub struct ValueColumnMapper<T> {
    _output: PhantomData<fn() -> T>,
}

impl<T: FromSqlValue> ValueColumnMapper<T> {
    pub fn new() -> Self {
        Self {
            _output: PhantomData,
        }
    }

    /// Type-erased handle to a new mapper.
    pub fn shared() -> ColumnMapperRef {
        Arc::new(Self::new())
    }
}

impl<T: FromSqlValue> Default for ValueColumnMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FromSqlValue> ColumnMapper for ValueColumnMapper<T> {
    type Output = T;

    fn map(&self, row: &ResultRow, column: usize, ctx: &StatementContext) -> MappingResult<T> {
        read_column(row, column, ctx)
    }
}

macro_rules! primitive_mappers {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        fn primitive_mapper(descriptor: &TypeDescriptor) -> Option<ColumnMapperRef> {
            match descriptor {
                $(TypeDescriptor::$variant => Some(ValueColumnMapper::<$ty>::shared()),)*
                TypeDescriptor::Optional { inner } => match &**inner {
                    $(TypeDescriptor::$variant => Some(ValueColumnMapper::<Option<$ty>>::shared()),)*
                    _ => None,
                },
                _ => None,
            }
        }
    };
}

for_each_primitive!(primitive_mappers);

/// Factory for primitive descriptors and `optional<primitive>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltInMapperFactory;

impl ColumnMapperFactory for BuiltInMapperFactory {
    fn build(
        &self,
        ty: &TypeDescriptor,
        _ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        Ok(primitive_mapper(ty))
    }
}

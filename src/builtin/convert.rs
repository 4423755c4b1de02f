//! Conversions from decoded column values into Rust primitives.
//!
//! Conversions are lenient in the direction that cannot lose information
//! (a `small_int` column reads fine as `i64`, a `text` column holding a
//! UUID reads fine as `Uuid`) and checked otherwise.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rowmap_core::{SqlValue, TypeDescriptor};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::builtin::for_each_primitive;
use crate::context::StatementContext;
use crate::error::{MappingError, MappingResult};

/// Rust values that can be read from a single [`SqlValue`].
pub trait FromSqlValue: Sized + Send + std::fmt::Debug + 'static {
    /// Descriptor of the Rust type, used in error reports.
    fn descriptor() -> TypeDescriptor;

    /// Convert a non-NULL value.
    fn from_non_null(
        value: &SqlValue,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<Self>;

    /// Value produced for NULL when `coerce_null_to_default` is enabled.
    ///
    /// `None` means NULL is never acceptable for this type.
    fn null_default() -> Option<Self> {
        None
    }

    /// Convert a value read from `column`, handling NULL.
    fn from_sql_value(
        value: &SqlValue,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<Self> {
        if value.is_null() {
            if ctx.options().coerce_null_to_default {
                if let Some(default) = Self::null_default() {
                    return Ok(default);
                }
            }
            return Err(MappingError::UnexpectedNull {
                column,
                ty: Self::descriptor(),
            });
        }
        Self::from_non_null(value, column, ctx)
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }

    fn from_non_null(
        value: &SqlValue,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<Self> {
        T::from_non_null(value, column, ctx).map(Some)
    }

    fn from_sql_value(
        value: &SqlValue,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<Self> {
        if value.is_null() {
            return Ok(None);
        }
        Self::from_non_null(value, column, ctx)
    }
}

fn mismatch<T: FromSqlValue>(value: &SqlValue, column: usize) -> MappingError {
    MappingError::TypeMismatch {
        column,
        expected: T::descriptor(),
        actual: value.kind(),
    }
}

fn invalid<T: FromSqlValue>(column: usize, reason: impl ToString) -> MappingError {
    MappingError::InvalidValue {
        column,
        ty: T::descriptor(),
        reason: reason.to_string(),
    }
}

fn parse_text<T>(value: &SqlValue, column: usize) -> MappingResult<T>
where
    T: FromSqlValue + FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        SqlValue::Text(s) => s.trim().parse().map_err(|e| invalid::<T>(column, e)),
        other => Err(mismatch::<T>(other, column)),
    }
}

fn integer<T>(value: &SqlValue, column: usize) -> MappingResult<T>
where
    T: FromSqlValue + TryFrom<i64> + FromStr,
    T::Err: std::fmt::Display,
{
    match value.as_i64() {
        Some(i) => T::try_from(i).map_err(|_| invalid::<T>(column, format!("{i} is out of range"))),
        None => parse_text(value, column),
    }
}

/// Read the elements of an array value.
fn array_elements<T: FromSqlValue>(
    value: &SqlValue,
    column: usize,
    ctx: &StatementContext,
) -> MappingResult<Vec<T>> {
    let items = value.as_array().ok_or_else(|| MappingError::TypeMismatch {
        column,
        expected: TypeDescriptor::array(T::descriptor()),
        actual: value.kind(),
    })?;
    items
        .iter()
        .map(|item| T::from_sql_value(item, column, ctx))
        .collect()
}

impl FromSqlValue for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Bool
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            other => match other.as_i64() {
                Some(i) => Ok(i != 0),
                None => parse_text(other, column),
            },
        }
    }

    fn null_default() -> Option<Self> {
        Some(false)
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromSqlValue for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::$variant
                }

                fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
                    integer(value, column)
                }

                fn null_default() -> Option<Self> {
                    Some(0)
                }
            }
        )*
    };
}

impl_integer!(i16 => Int16, i32 => Int32, i64 => Int64);

impl FromSqlValue for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Float32
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Float32(f) => Ok(*f),
            SqlValue::Float64(f) => Ok(*f as f32),
            SqlValue::Int16(i) => Ok(f32::from(*i)),
            SqlValue::Int32(i) => Ok(*i as f32),
            SqlValue::Int64(i) => Ok(*i as f32),
            SqlValue::Decimal(s) => s.parse().map_err(|e| invalid::<Self>(column, e)),
            other => parse_text(other, column),
        }
    }

    fn null_default() -> Option<Self> {
        Some(0.0)
    }
}

impl FromSqlValue for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Float64
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Int64(i) => Ok(*i as f64),
            SqlValue::Decimal(s) => s.parse().map_err(|e| invalid::<Self>(column, e)),
            other => match other.as_f64() {
                Some(f) => Ok(f),
                None => parse_text(other, column),
            },
        }
    }

    fn null_default() -> Option<Self> {
        Some(0.0)
    }
}

impl FromSqlValue for Decimal {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Decimal
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Decimal(s) | SqlValue::Text(s) => {
                Decimal::from_str(s.trim()).map_err(|e| invalid::<Self>(column, e))
            }
            SqlValue::Float32(f) => {
                Decimal::try_from(*f).map_err(|e| invalid::<Self>(column, e))
            }
            SqlValue::Float64(f) => {
                Decimal::try_from(*f).map_err(|e| invalid::<Self>(column, e))
            }
            other => match other.as_i64() {
                Some(i) => Ok(Decimal::from(i)),
                None => Err(mismatch::<Self>(other, column)),
            },
        }
    }

    fn null_default() -> Option<Self> {
        Some(Decimal::ZERO)
    }
}

impl FromSqlValue for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Text
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Text(s) | SqlValue::Decimal(s) => Ok(s.clone()),
            SqlValue::Bool(b) => Ok(b.to_string()),
            SqlValue::Uuid(u) => Ok(u.to_string()),
            SqlValue::Json(j) => Ok(j.to_string()),
            other => match other.as_i64() {
                Some(i) => Ok(i.to_string()),
                None => Err(mismatch::<Self>(other, column)),
            },
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Bytes
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Bytes(b) => Ok(b.clone()),
            SqlValue::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch::<Self>(other, column)),
        }
    }
}

impl FromSqlValue for Uuid {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Uuid
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Uuid(u) => Ok(*u),
            SqlValue::Bytes(b) => Uuid::from_slice(b).map_err(|e| invalid::<Self>(column, e)),
            other => parse_text(other, column),
        }
    }
}

impl FromSqlValue for NaiveDate {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Date
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Date(d) => Ok(*d),
            SqlValue::LocalDateTime(dt) => Ok(dt.date()),
            other => parse_text(other, column),
        }
    }
}

impl FromSqlValue for NaiveTime {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Time
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Time(t) => Ok(*t),
            other => parse_text(other, column),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::LocalDateTime
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::LocalDateTime(dt) => Ok(*dt),
            SqlValue::ZonedDateTime(dt) => Ok(dt.naive_utc()),
            SqlValue::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            other => parse_text(other, column),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::ZonedDateTime
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::ZonedDateTime(dt) => Ok(*dt),
            SqlValue::LocalDateTime(dt) => Ok(dt.and_utc()),
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid::<Self>(column, e)),
            other => Err(mismatch::<Self>(other, column)),
        }
    }
}

impl FromSqlValue for serde_json::Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Json
    }

    fn from_non_null(value: &SqlValue, column: usize, _: &StatementContext) -> MappingResult<Self> {
        match value {
            SqlValue::Json(j) => Ok(j.clone()),
            SqlValue::Text(s) => serde_json::from_str(s).map_err(|e| invalid::<Self>(column, e)),
            other => Err(mismatch::<Self>(other, column)),
        }
    }
}

macro_rules! impl_array {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl FromSqlValue for Vec<$ty> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::array(TypeDescriptor::$variant)
                }

                fn from_non_null(value: &SqlValue, column: usize, ctx: &StatementContext) -> MappingResult<Self> {
                    array_elements(value, column, ctx)
                }
            }

            impl FromSqlValue for Vec<Option<$ty>> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::array(TypeDescriptor::optional(TypeDescriptor::$variant))
                }

                fn from_non_null(value: &SqlValue, column: usize, ctx: &StatementContext) -> MappingResult<Self> {
                    array_elements(value, column, ctx)
                }
            }
        )*
    };
}

for_each_primitive!(impl_array);

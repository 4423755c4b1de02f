//! Static type metadata for mapped values.
//!
//! A mapper registered without an explicit [`TypeDescriptor`] is turned into
//! a single-type factory. That factory needs to know which descriptor the
//! mapper produces, which is recovered from the mapper's `Output` type
//! through [`SqlType`].
//!
//! Output types whose descriptor is only known at runtime report `None`:
//! registering such a mapper without a descriptor is an [`InferenceError`].
//!
//! ```rust
//! use rowmap::inference::SqlType;
//! use rowmap::TypeDescriptor;
//!
//! assert_eq!(i32::type_descriptor(), Some(TypeDescriptor::Int32));
//! assert_eq!(
//!     Option::<Vec<String>>::type_descriptor(),
//!     Some(TypeDescriptor::optional(TypeDescriptor::array(TypeDescriptor::Text))),
//! );
//! ```

use std::any::type_name;
use std::sync::Arc;

use rowmap_core::{SqlValue, TypeDescriptor};

use crate::builtin::for_each_primitive;
use crate::context::StatementContext;
use crate::error::{InferenceError, MappingResult};
use crate::mapper::{
    ColumnMapper, ColumnMapperFactory, ColumnMapperRef, MappedValue, RowMapper,
    RowMapperFactory, RowMapperRef,
};

/// Rust types with a statically known [`TypeDescriptor`].
///
/// Application types implement this to take part in inference:
///
/// ```rust
/// use rowmap::inference::SqlType;
/// use rowmap::TypeDescriptor;
///
/// struct Person;
///
/// impl SqlType for Person {
///     fn type_descriptor() -> Option<TypeDescriptor> {
///         Some(TypeDescriptor::named("Person"))
///     }
/// }
/// ```
pub trait SqlType: 'static {
    /// Descriptor of this type, or `None` when it is only known at runtime.
    fn type_descriptor() -> Option<TypeDescriptor>;
}

macro_rules! impl_sql_type {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl SqlType for $ty {
                fn type_descriptor() -> Option<TypeDescriptor> {
                    Some(TypeDescriptor::$variant)
                }
            }

            impl SqlType for Vec<$ty> {
                fn type_descriptor() -> Option<TypeDescriptor> {
                    Some(TypeDescriptor::array(TypeDescriptor::$variant))
                }
            }

            impl SqlType for Vec<Option<$ty>> {
                fn type_descriptor() -> Option<TypeDescriptor> {
                    Some(TypeDescriptor::array(TypeDescriptor::optional(
                        TypeDescriptor::$variant,
                    )))
                }
            }
        )*
    };
}

for_each_primitive!(impl_sql_type);

impl<T: SqlType> SqlType for Option<T> {
    fn type_descriptor() -> Option<TypeDescriptor> {
        T::type_descriptor().map(TypeDescriptor::optional)
    }
}

// A raw column value can be any SQL type.
impl SqlType for SqlValue {
    fn type_descriptor() -> Option<TypeDescriptor> {
        None
    }
}

impl SqlType for MappedValue {
    fn type_descriptor() -> Option<TypeDescriptor> {
        None
    }
}

impl SqlType for Vec<MappedValue> {
    fn type_descriptor() -> Option<TypeDescriptor> {
        None
    }
}

fn infer<M, T: SqlType>() -> Result<TypeDescriptor, InferenceError> {
    T::type_descriptor().ok_or_else(|| InferenceError {
        mapper: type_name::<M>(),
        reason: format!(
            "output type {} has no static type descriptor",
            type_name::<T>()
        ),
    })
}

/// Recover the descriptor a column mapper produces.
pub fn infer_column_mapper_type<M>() -> Result<TypeDescriptor, InferenceError>
where
    M: ColumnMapper,
    M::Output: SqlType,
{
    infer::<M, M::Output>()
}

/// Recover the descriptor a row mapper produces.
pub fn infer_row_mapper_type<M>() -> Result<TypeDescriptor, InferenceError>
where
    M: RowMapper,
    M::Output: SqlType,
{
    infer::<M, M::Output>()
}

/// Factory that serves one column mapper for exactly one descriptor.
pub struct InferredColumnMapperFactory {
    ty: TypeDescriptor,
    mapper: ColumnMapperRef,
}

impl InferredColumnMapperFactory {
    /// Wrap `mapper`, inferring the descriptor from its output type.
    pub fn new<M>(mapper: Arc<M>) -> Result<Self, InferenceError>
    where
        M: ColumnMapper,
        M::Output: SqlType,
    {
        let ty = infer_column_mapper_type::<M>()?;
        Ok(Self::for_type(ty, mapper))
    }

    /// Wrap `mapper` for an explicitly given descriptor.
    pub fn for_type(ty: TypeDescriptor, mapper: ColumnMapperRef) -> Self {
        Self { ty, mapper }
    }

    pub fn mapped_type(&self) -> &TypeDescriptor {
        &self.ty
    }
}

impl ColumnMapperFactory for InferredColumnMapperFactory {
    fn build(
        &self,
        ty: &TypeDescriptor,
        _ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        Ok((*ty == self.ty).then(|| self.mapper.clone()))
    }
}

/// Factory that serves one row mapper for exactly one descriptor.
pub struct InferredRowMapperFactory {
    ty: TypeDescriptor,
    mapper: RowMapperRef,
}

impl InferredRowMapperFactory {
    /// Wrap `mapper`, inferring the descriptor from its output type.
    pub fn new<M>(mapper: Arc<M>) -> Result<Self, InferenceError>
    where
        M: RowMapper,
        M::Output: SqlType,
    {
        let ty = infer_row_mapper_type::<M>()?;
        Ok(Self::for_type(ty, mapper))
    }

    /// Wrap `mapper` for an explicitly given descriptor.
    pub fn for_type(ty: TypeDescriptor, mapper: RowMapperRef) -> Self {
        Self { ty, mapper }
    }

    pub fn mapped_type(&self) -> &TypeDescriptor {
        &self.ty
    }
}

impl RowMapperFactory for InferredRowMapperFactory {
    fn build(
        &self,
        ty: &TypeDescriptor,
        _ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>> {
        Ok((*ty == self.ty).then(|| self.mapper.clone()))
    }
}

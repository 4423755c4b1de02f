//! Type-erased mapped values.

use std::any::{type_name, Any};
use std::fmt;

use crate::error::{MappingError, MappingResult};

trait MappedAny: Any + Send + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Send + fmt::Debug> MappedAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// The output of a type-erased mapper.
///
/// Registries hand out mappers without knowing their Rust output type, so the
/// produced value travels boxed. Callers recover it with [`MappedValue::downcast`]
/// using the type they asked the registry for.
pub struct MappedValue {
    inner: Box<dyn MappedAny>,
    type_name: &'static str,
}

impl MappedValue {
    /// Box a concrete value.
    pub fn new<T: Any + Send + fmt::Debug>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Rust type name of the boxed value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the boxed value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).as_any().is::<T>()
    }

    /// Borrow the boxed value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }

    /// Take the boxed value out as a `T`.
    pub fn downcast<T: Any>(self) -> MappingResult<T> {
        let actual = self.type_name;
        self.inner
            .into_any()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| MappingError::Downcast {
                requested: type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for MappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

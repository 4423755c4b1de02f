//! Error types for mapper resolution and mapping.
//!
//! Absence of a mapper is not an error: lookups return `Ok(None)`. The types
//! here cover the failures that are reported to callers.

use rowmap_core::TypeDescriptor;
use thiserror::Error;

/// Errors raised while resolving or running a mapper.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Caller required a mapper and none of the registered factories matched
    #[error("No mapper registered for type {ty}")]
    NoMapper { ty: TypeDescriptor },

    /// A factory failed for a reason other than declining the type
    #[error("Mapper factory failed for type {ty}: {reason}")]
    Factory { ty: TypeDescriptor, reason: String },

    /// The requested column does not exist in the row
    #[error("Column {column} out of range: row has {count} columns")]
    ColumnOutOfRange { column: usize, count: usize },

    /// A column label lookup found nothing
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// SQL NULL read into a type that cannot represent it
    #[error("Unexpected NULL in column {column} for type {ty}")]
    UnexpectedNull { column: usize, ty: TypeDescriptor },

    /// Column value has a shape the target type cannot be built from
    #[error("Type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: usize,
        expected: TypeDescriptor,
        actual: &'static str,
    },

    /// Column value has the right shape but an invalid content
    #[error("Invalid value in column {column} for type {ty}: {reason}")]
    InvalidValue {
        column: usize,
        ty: TypeDescriptor,
        reason: String,
    },

    /// A mapped value was downcast to the wrong Rust type
    #[error("Mapped value has type {actual}, requested {requested}")]
    Downcast {
        requested: &'static str,
        actual: &'static str,
    },
}

impl MappingError {
    /// Create a factory failure for the given type.
    pub fn factory(ty: &TypeDescriptor, reason: impl Into<String>) -> Self {
        Self::Factory {
            ty: ty.clone(),
            reason: reason.into(),
        }
    }
}

/// Error raised when a concrete mapper cannot be turned into a single-type
/// factory because its output type has no static descriptor.
///
/// This is a registration-time error. Register the mapper with an explicit
/// descriptor, or register a factory, instead.
#[derive(Debug, Error)]
#[error("Cannot infer mapped type of {mapper}: {reason}")]
pub struct InferenceError {
    /// Type name of the mapper being registered
    pub mapper: &'static str,
    /// Why the output type could not be recovered
    pub reason: String,
}

/// Convenience alias for mapper results.
pub type MappingResult<T> = Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_the_requested_type() {
        let err = MappingError::NoMapper {
            ty: TypeDescriptor::array(TypeDescriptor::Text),
        };
        assert_eq!(err.to_string(), "No mapper registered for type array<text>");

        let err = MappingError::factory(&TypeDescriptor::named("Person"), "bad metadata");
        assert_eq!(
            err.to_string(),
            "Mapper factory failed for type Person: bad metadata"
        );
    }

    #[test]
    fn test_inference_error_names_mapper() {
        let err = InferenceError {
            mapper: "my_crate::RawMapper",
            reason: "output type is only known at runtime".to_string(),
        };
        assert!(err.to_string().contains("my_crate::RawMapper"));
    }
}

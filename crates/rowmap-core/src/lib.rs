//! Core types for the rowmap mapper registry.
//!
//! This crate provides the foundational types shared by the registry and the
//! driver layer that feeds it:
//!
//! - [`TypeDescriptor`] - Runtime identity of a mapping target, including generic arguments
//! - [`SqlValue`] - A decoded column value as produced by the driver
//! - [`ResultRow`] - One row of a result cursor
//! - [`ResultSet`] - Column labels plus rows, loadable from YAML fixtures
//!
//! # Architecture
//!
//! ```text
//! rowmap-core (this crate)
//!    │
//!    └─── rowmap  (mapper traits, factories, registries, built-in converters)
//! ```
//!
//! # Example
//!
//! ```rust
//! use rowmap_core::{ResultRow, SqlValue, TypeDescriptor};
//!
//! let row = ResultRow::builder(0)
//!     .column("id", SqlValue::Int64(7))
//!     .build();
//! assert_eq!(row.get(0), Some(&SqlValue::Int64(7)));
//!
//! let ty = TypeDescriptor::parse("{type: array, element_type: text}").unwrap();
//! assert_eq!(ty, TypeDescriptor::array(TypeDescriptor::Text));
//! ```

pub mod types;
pub mod values;

pub use types::{TypeDescriptor, TypeParseError};
pub use values::{ResultRow, ResultRowBuilder, ResultSet, ResultSetError, SqlValue};

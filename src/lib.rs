//! rowmap Library
//!
//! Type-indexed resolution and caching of row and column mappers.
//!
//! Given a [`TypeDescriptor`], the registry finds a converter that produces
//! values of that type from one column, or from a whole row, of a decoded
//! result. Converters come from an ordered list of factories where the most
//! recently registered factory wins, and every successful resolution is
//! cached until the next registration.
//!
//! # Features
//!
//! - Column and row mapper registries with per-type caching
//! - Row lookups fall back to column mappers reading the first column
//! - Mapper output types inferred through [`inference::SqlType`]
//! - Built-in mappers for primitives, optionals and arrays
//! - Independent registry snapshots for child configuration scopes
//! - `IN (...)` collection binding helpers
//!
//! # Example
//!
//! ```rust
//! use rowmap::{Configuration, ResultRow, SqlValue, TypeDescriptor};
//!
//! let ctx = Configuration::default().into_statement_context();
//! let row = ResultRow::builder(0)
//!     .column("tags", SqlValue::Array(vec![SqlValue::text("a"), SqlValue::text("b")]))
//!     .build();
//!
//! let mapper = ctx
//!     .find_row_mapper_for(&TypeDescriptor::array(TypeDescriptor::Text))
//!     .unwrap()
//!     .unwrap();
//! let tags: Vec<String> = mapper.map_as(&row, &ctx).unwrap();
//! assert_eq!(tags, vec!["a", "b"]);
//! ```

pub mod binding;
pub mod builtin;
pub mod config;
pub mod context;
pub mod error;
pub mod inference;
pub mod mapper;
pub mod registry;
pub mod testing;

pub use config::MapperOptions;
pub use context::{Configuration, StatementContext};
pub use error::{InferenceError, MappingError, MappingResult};
pub use mapper::{ColumnMapperRef, MappedValue, RowMapperRef};
pub use registry::{ColumnMapperRegistry, MappingRegistry, RegistryStats, RowMapperRegistry};
pub use rowmap_core::{ResultRow, ResultSet, SqlValue, TypeDescriptor};

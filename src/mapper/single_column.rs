//! Adapter that lets a column mapper act as a row mapper.

use std::any::{type_name, Any};

use rowmap_core::ResultRow;

use super::{ColumnMapperRef, DynRowMapper, MappedValue};
use crate::context::StatementContext;
use crate::error::{MappingError, MappingResult};

/// Row mapper that maps the first column of the row with a column mapper.
///
/// This is what the row registry falls back to when no row factory matches a
/// type but a column mapper exists for it.
pub struct SingleColumnMapper {
    column: ColumnMapperRef,
}

impl SingleColumnMapper {
    pub fn new(column: ColumnMapperRef) -> Self {
        Self { column }
    }

    /// The wrapped column mapper.
    pub fn column_mapper(&self) -> &ColumnMapperRef {
        &self.column
    }
}

impl DynRowMapper for SingleColumnMapper {
    fn map_value(&self, row: &ResultRow, ctx: &StatementContext) -> MappingResult<MappedValue> {
        if row.column_count() == 0 {
            return Err(MappingError::ColumnOutOfRange {
                column: 0,
                count: 0,
            });
        }
        self.column.map_value(row, 0, ctx)
    }

    fn mapper_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn output_name(&self) -> &'static str {
        self.column.output_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Configuration;
    use crate::mapper::column_mapper_fn;
    use rowmap_core::SqlValue;
    use std::sync::Arc;

    #[test]
    fn test_reads_first_column() {
        let ctx = Configuration::default().into_statement_context();
        let column: ColumnMapperRef = Arc::new(column_mapper_fn(|row, column, _ctx| {
            Ok(format!("{:?}@{column}", row.get(column)))
        }));
        let mapper = SingleColumnMapper::new(column.clone());

        let row = ResultRow::builder(0)
            .column("a", SqlValue::Int32(1))
            .column("b", SqlValue::Int32(2))
            .build();
        let value: String = (&mapper as &dyn DynRowMapper).map_as(&row, &ctx).unwrap();
        assert_eq!(value, "Some(Int32(1))@0");
        assert!(Arc::ptr_eq(mapper.column_mapper(), &column));
        assert_eq!(mapper.output_name(), column.output_name());
    }

    #[test]
    fn test_empty_row_is_an_error() {
        let ctx = Configuration::default().into_statement_context();
        let column: ColumnMapperRef = Arc::new(column_mapper_fn(|_, _, _| Ok(0_i32)));
        let mapper = SingleColumnMapper::new(column);
        let row = ResultRow::builder(0).build();

        assert!(matches!(
            mapper.map_value(&row, &ctx),
            Err(MappingError::ColumnOutOfRange { column: 0, count: 0 })
        ));
    }
}

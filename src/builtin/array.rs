//! Mappers for SQL array columns.

use std::sync::Arc;

use rowmap_core::{ResultRow, SqlValue, TypeDescriptor};

use super::{for_each_primitive, ValueColumnMapper};
use crate::context::StatementContext;
use crate::error::{MappingError, MappingResult};
use crate::mapper::{ColumnMapper, ColumnMapperFactory, ColumnMapperRef, MappedValue};

macro_rules! primitive_array_mappers {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        fn primitive_array_mapper(element: &TypeDescriptor) -> Option<ColumnMapperRef> {
            match element {
                $(TypeDescriptor::$variant => Some(ValueColumnMapper::<Vec<$ty>>::shared()),)*
                TypeDescriptor::Optional { inner } => match &**inner {
                    $(TypeDescriptor::$variant => Some(ValueColumnMapper::<Vec<Option<$ty>>>::shared()),)*
                    _ => None,
                },
                _ => None,
            }
        }
    };
}

for_each_primitive!(primitive_array_mappers);

/// Factory for `array<...>` descriptors.
///
/// Arrays of primitives (and of optional primitives) map to typed vectors
/// such as `Vec<i32>` or `Vec<Option<String>>`. For any other element type
/// the factory resolves the element's column mapper through the statement
/// context and produces an [`ArrayColumnMapper`], whose output is a
/// `Vec<MappedValue>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlArrayMapperFactory;

impl ColumnMapperFactory for SqlArrayMapperFactory {
    fn build(
        &self,
        ty: &TypeDescriptor,
        ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        let TypeDescriptor::Array { element_type } = ty else {
            return Ok(None);
        };
        if let Some(mapper) = primitive_array_mapper(element_type) {
            return Ok(Some(mapper));
        }

        let Some(element) = ctx.find_column_mapper_for(element_type)? else {
            return Ok(None);
        };
        let mapper: ColumnMapperRef = Arc::new(ArrayColumnMapper::new(
            TypeDescriptor::clone(element_type),
            element,
        ));
        Ok(Some(mapper))
    }
}

/// Maps every element of an array column with the element type's column
/// mapper.
///
/// Each element is presented to the element mapper as column 0 of a
/// single-column row carrying the array column's label.
pub struct ArrayColumnMapper {
    element_type: TypeDescriptor,
    element: ColumnMapperRef,
}

impl ArrayColumnMapper {
    pub fn new(element_type: TypeDescriptor, element: ColumnMapperRef) -> Self {
        Self {
            element_type,
            element,
        }
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element_type
    }

    pub fn element_mapper(&self) -> &ColumnMapperRef {
        &self.element
    }
}

impl ColumnMapper for ArrayColumnMapper {
    type Output = Vec<MappedValue>;

    fn map(
        &self,
        row: &ResultRow,
        column: usize,
        ctx: &StatementContext,
    ) -> MappingResult<Vec<MappedValue>> {
        let value = row.get(column).ok_or(MappingError::ColumnOutOfRange {
            column,
            count: row.column_count(),
        })?;
        let items = match value {
            SqlValue::Array(items) => items,
            SqlValue::Null => {
                return Err(MappingError::UnexpectedNull {
                    column,
                    ty: TypeDescriptor::array(self.element_type.clone()),
                })
            }
            other => {
                return Err(MappingError::TypeMismatch {
                    column,
                    expected: TypeDescriptor::array(self.element_type.clone()),
                    actual: other.kind(),
                })
            }
        };

        let label = row.column_name(column).unwrap_or_default();
        items
            .iter()
            .map(|item| {
                let element_row = ResultRow::builder(row.index)
                    .column(label, item.clone())
                    .build();
                self.element.map_value(&element_row, 0, ctx)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Configuration;
    use crate::builtin::read_column;
    use crate::mapper::{column_mapper_fn, DynColumnMapper};

    fn tags_row() -> ResultRow {
        ResultRow::builder(0)
            .column(
                "tags",
                SqlValue::Array(vec![SqlValue::text("a"), SqlValue::Null, SqlValue::text("c")]),
            )
            .build()
    }

    #[test]
    fn test_primitive_arrays_are_typed() {
        let ctx = Configuration::default().into_statement_context();
        let factory = SqlArrayMapperFactory;

        let mapper = factory
            .build(
                &TypeDescriptor::array(TypeDescriptor::optional(TypeDescriptor::Text)),
                &ctx,
            )
            .unwrap()
            .unwrap();
        let tags: Vec<Option<String>> = mapper.map_as(&tags_row(), 0, &ctx).unwrap();
        assert_eq!(tags, vec![Some("a".into()), None, Some("c".into())]);

        let strict = factory
            .build(&TypeDescriptor::array(TypeDescriptor::Text), &ctx)
            .unwrap()
            .unwrap();
        assert!(matches!(
            strict.map_as::<Vec<String>>(&tags_row(), 0, &ctx),
            Err(MappingError::UnexpectedNull { .. })
        ));

        assert!(factory.build(&TypeDescriptor::Text, &ctx).unwrap().is_none());
    }

    #[test]
    fn test_element_mapper_resolved_through_context() {
        let config = Configuration::default();
        let tag: ColumnMapperRef = Arc::new(column_mapper_fn(|row, column, ctx| {
            let text: Option<String> = read_column(row, column, ctx)?;
            Ok(format!("#{}", text.unwrap_or_default()))
        }));
        config
            .mappers()
            .add_column_mapper_for(TypeDescriptor::named("Tag"), tag);
        let ctx = config.into_statement_context();

        let mapper = SqlArrayMapperFactory
            .build(&TypeDescriptor::array(TypeDescriptor::named("Tag")), &ctx)
            .unwrap()
            .unwrap();
        let values: Vec<MappedValue> = mapper.map_as(&tags_row(), 0, &ctx).unwrap();
        let tags: Vec<String> = values
            .into_iter()
            .map(|v| v.downcast::<String>().unwrap())
            .collect();
        assert_eq!(tags, vec!["#a", "#", "#c"]);

        assert!(SqlArrayMapperFactory
            .build(&TypeDescriptor::array(TypeDescriptor::named("Unknown")), &ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_element_array_mapper_rejects_scalars() {
        let ctx = Configuration::default().into_statement_context();
        let mapper = ArrayColumnMapper::new(
            TypeDescriptor::named("Tag"),
            ValueColumnMapper::<String>::shared(),
        );
        let row = ResultRow::builder(0)
            .column("tags", SqlValue::Int32(1))
            .build();

        let err = mapper.map_value(&row, 0, &ctx).unwrap_err();
        assert!(matches!(err, MappingError::TypeMismatch { actual: "int", .. }));
    }
}

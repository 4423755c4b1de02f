//! Collection binding for `IN (...)` clauses.
//!
//! A collection bound under key `ids` is expanded into one named parameter
//! per element (`__ids_0`, `__ids_1`, ...). The comma-separated parameter
//! reference list replaces the `<ids>` placeholder of the statement template:
//!
//! ```rust
//! use rowmap::binding::InClause;
//! use rowmap::SqlValue;
//!
//! let clause = InClause::expand("ids", [SqlValue::Int64(1), SqlValue::Int64(2)], None).unwrap();
//! assert_eq!(clause.definition(), ":__ids_0,:__ids_1");
//! assert_eq!(
//!     clause.render("SELECT * FROM users WHERE id IN (<ids>)").unwrap(),
//!     "SELECT * FROM users WHERE id IN (:__ids_0,:__ids_1)"
//! );
//! ```

use rowmap_core::{SqlValue, TypeDescriptor};
use thiserror::Error;

/// Errors raised while expanding a collection binding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// An empty collection would render as `IN ()`, which is not valid SQL
    #[error("Cannot bind an empty collection under '{key}'")]
    EmptyCollection { key: String },

    /// The key cannot be used inside a parameter name
    #[error("Invalid binding key '{key}': expected letters, digits or '_'")]
    InvalidKey { key: String },

    /// The template has no `<key>` placeholder
    #[error("Template has no <{key}> placeholder")]
    MissingPlaceholder { key: String },
}

/// One named parameter produced by an expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    /// Parameter name without the leading colon, e.g. `__ids_0`
    pub name: String,
    /// Value to bind
    pub value: SqlValue,
    /// Declared element type; `None` leaves the choice to the driver
    pub element_type: Option<TypeDescriptor>,
}

/// A collection expanded into indexed named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct InClause {
    key: String,
    bindings: Vec<ParameterBinding>,
}

impl InClause {
    /// Expand `values` under `key`.
    ///
    /// `element_type` is attached to every binding; see [`element_type_of`]
    /// to recover it from a declared collection type.
    pub fn expand<I>(
        key: impl Into<String>,
        values: I,
        element_type: Option<TypeDescriptor>,
    ) -> Result<Self, BindingError>
    where
        I: IntoIterator<Item = SqlValue>,
    {
        let key = key.into();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(BindingError::InvalidKey { key });
        }

        let bindings: Vec<ParameterBinding> = values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| ParameterBinding {
                name: format!("__{key}_{idx}"),
                value,
                element_type: element_type.clone(),
            })
            .collect();
        if bindings.is_empty() {
            return Err(BindingError::EmptyCollection { key });
        }

        Ok(Self { key, bindings })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    /// Parameter names, in element order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    /// The parameter reference list, e.g. `:__ids_0,:__ids_1`.
    pub fn definition(&self) -> String {
        self.parameter_names()
            .map(|name| format!(":{name}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Replace every `<key>` placeholder in `template` with the definition.
    pub fn render(&self, template: &str) -> Result<String, BindingError> {
        let placeholder = format!("<{}>", self.key);
        if !template.contains(&placeholder) {
            return Err(BindingError::MissingPlaceholder {
                key: self.key.clone(),
            });
        }
        Ok(template.replace(&placeholder, &self.definition()))
    }
}

/// Element type of a declared collection type.
///
/// `array<T>` yields `T`, a generic named type yields its first argument and
/// `optional<C>` looks through to `C`. Anything else yields `None`.
pub fn element_type_of(declared: &TypeDescriptor) -> Option<TypeDescriptor> {
    match declared {
        TypeDescriptor::Optional { inner } => element_type_of(inner),
        other => other.first_type_argument().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_names_and_types() {
        let clause = InClause::expand(
            "names",
            vec![SqlValue::text("a"), SqlValue::text("b"), SqlValue::text("c")],
            Some(TypeDescriptor::Text),
        )
        .unwrap();

        let names: Vec<&str> = clause.parameter_names().collect();
        assert_eq!(names, vec!["__names_0", "__names_1", "__names_2"]);
        assert_eq!(clause.definition(), ":__names_0,:__names_1,:__names_2");
        assert!(clause
            .bindings()
            .iter()
            .all(|b| b.element_type == Some(TypeDescriptor::Text)));
        assert_eq!(clause.bindings()[1].value, SqlValue::text("b"));
    }

    #[test]
    fn test_render_replaces_every_placeholder() {
        let clause = InClause::expand("ids", [SqlValue::Int32(7)], None).unwrap();
        let sql = clause
            .render("SELECT * FROM a WHERE id IN (<ids>) OR parent IN (<ids>)")
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM a WHERE id IN (:__ids_0) OR parent IN (:__ids_0)"
        );

        assert_eq!(
            clause.render("SELECT 1"),
            Err(BindingError::MissingPlaceholder {
                key: "ids".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_empty_collection_and_bad_keys() {
        assert_eq!(
            InClause::expand("ids", Vec::new(), None),
            Err(BindingError::EmptyCollection {
                key: "ids".to_string()
            })
        );
        assert!(matches!(
            InClause::expand("a b", [SqlValue::Null], None),
            Err(BindingError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_element_type_of() {
        assert_eq!(
            element_type_of(&TypeDescriptor::array(TypeDescriptor::Uuid)),
            Some(TypeDescriptor::Uuid)
        );
        assert_eq!(
            element_type_of(&TypeDescriptor::optional(TypeDescriptor::generic(
                "Set",
                vec![TypeDescriptor::Int64]
            ))),
            Some(TypeDescriptor::Int64)
        );
        assert_eq!(element_type_of(&TypeDescriptor::named("Ids")), None);
        assert_eq!(element_type_of(&TypeDescriptor::Text), None);
    }
}

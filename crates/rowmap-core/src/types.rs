//! Type descriptors for the rowmap registry.
//!
//! This module defines `TypeDescriptor`, the runtime identity of a mapping
//! target. Descriptors are the cache and dispatch key for every mapper lookup,
//! so equality and hashing are structural over generic arguments:
//! `array<text>` and `array<int>` are different keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Runtime type descriptor for a mapping target.
///
/// `TypeDescriptor` names the application-side type a column or row should be
/// converted into. Host primitives have dedicated variants; containers carry
/// their type arguments; application types are `Named` with an ordered list
/// of generic arguments.
///
/// # YAML Format
///
/// Simple types can be specified as strings:
/// ```yaml
/// type: int
/// type: text
/// type: uuid
/// ```
///
/// Complex types use object format:
/// ```yaml
/// type:
///   type: array
///   element_type: text
/// type:
///   type: named
///   name: Pair
///   args: [int, text]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Boolean value
    Bool,

    /// 16-bit signed integer
    Int16,

    /// 32-bit signed integer
    Int32,

    /// 64-bit signed integer
    Int64,

    /// 32-bit IEEE 754 floating point
    Float32,

    /// 64-bit IEEE 754 floating point
    Float64,

    /// Exact decimal
    Decimal,

    /// Unlimited text
    Text,

    /// Binary data
    Bytes,

    /// UUID (128-bit)
    Uuid,

    /// Date only (YYYY-MM-DD)
    Date,

    /// Time only (HH:MM:SS)
    Time,

    /// Timestamp without timezone
    LocalDateTime,

    /// Timestamp with timezone, normalized to UTC
    ZonedDateTime,

    /// JSON document
    Json,

    /// SQL array of a specific element type
    Array {
        /// Element type
        element_type: Box<TypeDescriptor>,
    },

    /// Nullable wrapper; SQL NULL maps to absence
    Optional {
        /// Wrapped type
        inner: Box<TypeDescriptor>,
    },

    /// Application-defined type with optional generic arguments
    Named {
        /// Nominal type name
        name: String,
        /// Ordered generic arguments
        args: Vec<TypeDescriptor>,
    },
}

/// Error returned when a descriptor cannot be parsed from text.
#[derive(Debug, thiserror::Error)]
pub enum TypeParseError {
    /// The input was not a valid descriptor document
    #[error("Invalid type descriptor '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: serde_yaml::Error,
    },
}

const SIMPLE_NAMES: &[(&str, TypeDescriptor)] = &[
    ("bool", TypeDescriptor::Bool),
    ("small_int", TypeDescriptor::Int16),
    ("int", TypeDescriptor::Int32),
    ("big_int", TypeDescriptor::Int64),
    ("float", TypeDescriptor::Float32),
    ("double", TypeDescriptor::Float64),
    ("decimal", TypeDescriptor::Decimal),
    ("text", TypeDescriptor::Text),
    ("bytes", TypeDescriptor::Bytes),
    ("uuid", TypeDescriptor::Uuid),
    ("date", TypeDescriptor::Date),
    ("time", TypeDescriptor::Time),
    ("date_time", TypeDescriptor::LocalDateTime),
    ("timestamp_tz", TypeDescriptor::ZonedDateTime),
    ("json", TypeDescriptor::Json),
];

fn simple_from_name(name: &str) -> Option<TypeDescriptor> {
    let canonical = match name {
        "smallint" => "small_int",
        "bigint" => "big_int",
        "datetime" => "date_time",
        "timestamptz" => "timestamp_tz",
        "string" => "text",
        other => other,
    };
    SIMPLE_NAMES
        .iter()
        .find(|(n, _)| *n == canonical)
        .map(|(_, ty)| ty.clone())
}

impl TypeDescriptor {
    /// Create a new Array type with the given element type.
    pub fn array(element_type: TypeDescriptor) -> Self {
        Self::Array {
            element_type: Box::new(element_type),
        }
    }

    /// Create a new Optional type wrapping the given type.
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    /// Create a non-generic named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a named type with generic arguments.
    pub fn generic(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    /// Parse a descriptor from its YAML form, e.g. `int` or
    /// `{type: array, element_type: text}`.
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        serde_yaml::from_str(input).map_err(|source| TypeParseError::Invalid {
            input: input.to_string(),
            source,
        })
    }

    /// The ordered type arguments of this descriptor.
    ///
    /// Containers expose their element; named types expose their generic
    /// arguments; primitives have none.
    pub fn type_arguments(&self) -> Vec<&TypeDescriptor> {
        match self {
            Self::Array { element_type } => vec![element_type.as_ref()],
            Self::Optional { inner } => vec![inner.as_ref()],
            Self::Named { args, .. } => args.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// The first type argument, if any.
    pub fn first_type_argument(&self) -> Option<&TypeDescriptor> {
        self.type_arguments().into_iter().next()
    }

    fn simple_name(&self) -> Option<&'static str> {
        SIMPLE_NAMES
            .iter()
            .find(|(_, ty)| ty == self)
            .map(|(n, _)| *n)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array { element_type } => write!(f, "array<{element_type}>"),
            Self::Optional { inner } => write!(f, "optional<{inner}>"),
            Self::Named { name, args } if args.is_empty() => f.write_str(name),
            Self::Named { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            simple => f.write_str(simple.simple_name().unwrap_or("unknown")),
        }
    }
}

// Simple types serialize as a bare string ("int"), containers and named types
// as a map ({"type": "array", "element_type": "int"}).

impl Serialize for TypeDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            Self::Array { element_type } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("element_type", element_type)?;
                map.end()
            }
            Self::Optional { inner } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "optional")?;
                map.serialize_entry("inner", inner)?;
                map.end()
            }
            Self::Named { name, args } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "named")?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("args", args)?;
                map.end()
            }
            simple => match simple.simple_name() {
                Some(name) => serializer.serialize_str(name),
                None => Err(serde::ser::Error::custom("unnamed simple type")),
            },
        }
    }
}

impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, Visitor};

        struct TypeDescriptorVisitor;

        impl<'de> Visitor<'de> for TypeDescriptorVisitor {
            type Value = TypeDescriptor;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or map representing a TypeDescriptor")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                simple_from_name(value)
                    .ok_or_else(|| E::custom(format!("unknown simple type: {value}")))
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut type_name: Option<String> = None;
                let mut fields: HashMap<String, serde_yaml::Value> = HashMap::new();

                while let Some(key) = map.next_key::<String>()? {
                    if key == "type" {
                        type_name = Some(map.next_value()?);
                    } else {
                        fields.insert(key, map.next_value()?);
                    }
                }

                let type_name = type_name.ok_or_else(|| M::Error::missing_field("type"))?;

                match type_name.as_str() {
                    "array" => {
                        let element_type: TypeDescriptor =
                            get_field_required(&fields, "element_type")?;
                        Ok(TypeDescriptor::array(element_type))
                    }
                    "optional" => {
                        let inner: TypeDescriptor = get_field_required(&fields, "inner")?;
                        Ok(TypeDescriptor::optional(inner))
                    }
                    "named" => {
                        let name: String = get_field_required(&fields, "name")?;
                        let args: Vec<TypeDescriptor> = if fields.contains_key("args") {
                            get_field_required(&fields, "args")?
                        } else {
                            Vec::new()
                        };
                        Ok(TypeDescriptor::Named { name, args })
                    }
                    other => simple_from_name(other)
                        .ok_or_else(|| M::Error::custom(format!("unknown type: {type_name}"))),
                }
            }
        }

        deserializer.deserialize_any(TypeDescriptorVisitor)
    }
}

fn get_field_required<T: for<'de> Deserialize<'de>, E: serde::de::Error>(
    fields: &HashMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Result<T, E> {
    let value = fields.get(key).ok_or_else(|| E::missing_field(key))?;
    serde_yaml::from_value(value.clone())
        .map_err(|e| E::custom(format!("invalid field '{key}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generic_arguments_are_part_of_identity() {
        let texts = TypeDescriptor::array(TypeDescriptor::Text);
        let ints = TypeDescriptor::array(TypeDescriptor::Int32);
        assert_ne!(texts, ints);

        let mut keys = HashSet::new();
        keys.insert(texts.clone());
        keys.insert(ints);
        keys.insert(TypeDescriptor::array(TypeDescriptor::Text));
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&texts));
    }

    #[test]
    fn test_type_arguments() {
        let pair = TypeDescriptor::generic(
            "Pair",
            vec![TypeDescriptor::Int32, TypeDescriptor::Text],
        );
        assert_eq!(
            pair.type_arguments(),
            vec![&TypeDescriptor::Int32, &TypeDescriptor::Text]
        );
        assert_eq!(
            TypeDescriptor::optional(TypeDescriptor::Uuid).first_type_argument(),
            Some(&TypeDescriptor::Uuid)
        );
        assert!(TypeDescriptor::Int64.type_arguments().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeDescriptor::Int32.to_string(), "int");
        assert_eq!(
            TypeDescriptor::array(TypeDescriptor::optional(TypeDescriptor::Text)).to_string(),
            "array<optional<text>>"
        );
        assert_eq!(
            TypeDescriptor::generic("Pair", vec![TypeDescriptor::Int32, TypeDescriptor::Text])
                .to_string(),
            "Pair<int, text>"
        );
        assert_eq!(TypeDescriptor::named("Person").to_string(), "Person");
    }

    #[test]
    fn test_deserialize_simple_string() {
        let parsed: TypeDescriptor = serde_yaml::from_str("uuid").unwrap();
        assert_eq!(parsed, TypeDescriptor::Uuid);

        let parsed: TypeDescriptor = serde_yaml::from_str("bigint").unwrap();
        assert_eq!(parsed, TypeDescriptor::Int64);

        assert!(serde_yaml::from_str::<TypeDescriptor>("varchar2").is_err());
    }

    #[test]
    fn test_deserialize_complex_types() {
        let yaml = r#"
type: array
element_type:
  type: optional
  inner: int
"#;
        let parsed: TypeDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::array(TypeDescriptor::optional(TypeDescriptor::Int32))
        );

        let parsed = TypeDescriptor::parse("{type: named, name: Pair, args: [int, text]}").unwrap();
        assert_eq!(
            parsed,
            TypeDescriptor::generic("Pair", vec![TypeDescriptor::Int32, TypeDescriptor::Text])
        );

        let parsed = TypeDescriptor::parse("{type: named, name: Person}").unwrap();
        assert_eq!(parsed, TypeDescriptor::named("Person"));
    }

    #[test]
    fn test_parse_error_names_input() {
        let err = TypeDescriptor::parse("{type: array}").unwrap_err();
        assert!(err.to_string().contains("{type: array}"));
    }

    #[test]
    fn test_invalid_type_arguments_are_rejected() {
        let input = "{type: named, name: Pair, args: [varchar2]}";
        let err = TypeDescriptor::parse(input).unwrap_err();
        assert!(err.to_string().contains(input));

        assert!(TypeDescriptor::parse("{type: named, name: Pair, args: int}").is_err());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let types = vec![
            TypeDescriptor::Bool,
            TypeDescriptor::ZonedDateTime,
            TypeDescriptor::array(TypeDescriptor::Int32),
            TypeDescriptor::optional(TypeDescriptor::Decimal),
            TypeDescriptor::generic("Map", vec![TypeDescriptor::Text, TypeDescriptor::Json]),
        ];

        for ty in types {
            let yaml = serde_yaml::to_string(&ty).unwrap();
            let parsed: TypeDescriptor = serde_yaml::from_str(&yaml).unwrap();
            assert_eq!(ty, parsed);
        }
    }
}

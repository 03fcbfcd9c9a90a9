//! Dynamic setting values and their storage encoding.
//!
//! A setting value is a small tagged union: scalars, sequences, and string
//! keyed mappings. Every value has a [`TypeTag`] which is persisted next to
//! the raw encoded value so a reload can cast the raw text back into the
//! original shape.
//!
//! # Storage encoding
//!
//! | Tag | Raw column |
//! |-----|------------|
//! | `null` | `NULL` |
//! | `boolean` | `true` / `false` |
//! | `integer` | decimal text |
//! | `float` | shortest round-trip decimal text |
//! | `string` | the string itself |
//! | `sequence` | JSON array |
//! | `mapping` | JSON object |

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordered string-keyed mapping of values.
pub type Mapping = BTreeMap<String, Value>;

/// A dynamically typed setting value.
///
/// Equality is strict: `Integer(1)` and `Float(1.0)` are different values,
/// and `String("1")` equals neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// The absence of a value. Still counts as present in a tree.
    #[default]
    Null,
    /// A boolean flag.
    Bool(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// A 64-bit float.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered list of values. Sequences are always stored as one leaf.
    Sequence(Vec<Self>),
    /// A nested mapping. Non-empty mappings are addressed through dotted paths.
    Mapping(Mapping),
}

impl Value {
    /// Return the type tag describing this value's shape.
    pub const fn type_tag(&self) -> TypeTag {
        match self {
            Self::Null => TypeTag::Null,
            Self::Bool(_) => TypeTag::Boolean,
            Self::Integer(_) => TypeTag::Integer,
            Self::Float(_) => TypeTag::Float,
            Self::String(_) => TypeTag::String,
            Self::Sequence(_) => TypeTag::Sequence,
            Self::Mapping(_) => TypeTag::Mapping,
        }
    }

    /// Borrow the inner string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the inner mapping, if this is a mapping value.
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Encode the value into its raw storage text.
    ///
    /// Returns `None` for [`Value::Null`], which is stored as SQL `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::NonFinite`] if the value is or contains a NaN or
    /// infinite float, and [`CastError::Json`] if a composite value cannot be
    /// encoded.
    pub fn encode(&self) -> Result<Option<String>, CastError> {
        if let Some(f) = self.first_non_finite() {
            return Err(CastError::NonFinite(f));
        }
        let raw = match self {
            Self::Null => return Ok(None),
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Sequence(_) | Self::Mapping(_) => {
                serde_json::to_string(&serde_json::Value::from(self.clone()))?
            }
        };
        Ok(Some(raw))
    }

    fn first_non_finite(&self) -> Option<f64> {
        match self {
            Self::Float(f) if !f.is_finite() => Some(*f),
            Self::Sequence(items) => items.iter().find_map(Self::first_non_finite),
            Self::Mapping(map) => map.values().find_map(Self::first_non_finite),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Integer),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// JSON has no representation for non-finite floats; they become `null`.
/// [`Value::encode`] refuses such values instead of storing the `null`.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Integer(i) => Self::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s),
            Value::Sequence(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Mapping(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// Canonical type name stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// `null`
    Null,
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `float`
    Float,
    /// `string`
    String,
    /// `sequence`
    Sequence,
    /// `mapping`
    Mapping,
}

impl TypeTag {
    /// Return the tag as stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        }
    }

    /// Cast a raw stored value back into a [`Value`] of this type.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::MissingValue`] if a non-null tag has no raw
    /// value, and [`CastError::Invalid`] or [`CastError::Json`] if the raw
    /// text does not parse as this type.
    pub fn cast(self, raw: Option<&str>) -> Result<Value, CastError> {
        let Some(raw) = raw else {
            return match self {
                Self::Null => Ok(Value::Null),
                other => Err(CastError::MissingValue(other)),
            };
        };

        let invalid = || CastError::Invalid {
            tag: self,
            raw: raw.to_owned(),
        };

        match self {
            Self::Null => Ok(Value::Null),
            Self::Boolean => match raw {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" | "" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            Self::Integer => raw.parse().map(Value::Integer).map_err(|_| invalid()),
            Self::Float => match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                _ => Err(invalid()),
            },
            Self::String => Ok(Value::String(raw.to_owned())),
            Self::Sequence => match serde_json::from_str::<serde_json::Value>(raw)? {
                json @ serde_json::Value::Array(_) => Ok(Value::from(json)),
                _ => Err(invalid()),
            },
            Self::Mapping => match serde_json::from_str::<serde_json::Value>(raw)? {
                json @ serde_json::Value::Object(_) => Ok(Value::from(json)),
                _ => Err(invalid()),
            },
        }
    }
}

impl core::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = CastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" | "NULL" => Ok(Self::Null),
            "boolean" | "bool" => Ok(Self::Boolean),
            "integer" | "int" => Ok(Self::Integer),
            "float" | "double" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "sequence" | "array" => Ok(Self::Sequence),
            "mapping" | "object" => Ok(Self::Mapping),
            other => Err(CastError::UnknownTag(other.to_owned())),
        }
    }
}

/// Errors raised while encoding or casting stored values.
#[derive(Debug, thiserror::Error)]
pub enum CastError {
    /// The `type` column holds a tag this crate does not know.
    #[error("unknown type tag: {0}")]
    UnknownTag(String),

    /// A non-null tag was stored with a `NULL` value.
    #[error("missing raw value for type {0}")]
    MissingValue(TypeTag),

    /// The raw text does not parse as the tagged type.
    #[error("cannot cast {raw:?} as {tag}")]
    Invalid {
        /// The tag the value was stored with.
        tag: TypeTag,
        /// The raw stored text.
        raw: String,
    },

    /// NaN and infinite floats have no stable stored form.
    #[error("cannot store non-finite float {0}")]
    NonFinite(f64),

    /// A composite value failed to encode or decode as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn roundtrip(value: &Value) -> Value {
        let raw = value.encode().unwrap();
        value.type_tag().cast(raw.as_deref()).unwrap()
    }

    #[test]
    fn scalars_survive_storage() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Integer(-42),
            Value::Float(1.5),
            Value::String(String::from("bar")),
            Value::String(String::new()),
        ] {
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn whole_float_stays_float() {
        let value = Value::Float(3.0);
        assert_eq!(value.encode().unwrap().as_deref(), Some("3"));
        assert_eq!(roundtrip(&value), Value::Float(3.0));
        assert_ne!(roundtrip(&value), Value::Integer(3));
    }

    #[test]
    fn sequence_is_json_encoded() {
        let value = Value::from(vec!["val-1", "val-2", "val-3"]);
        let raw = value.encode().unwrap().unwrap();
        assert_eq!(raw, r#"["val-1","val-2","val-3"]"#);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn nested_mapping_is_json_encoded() {
        let mut inner = Mapping::new();
        inner.insert(String::from("depth"), Value::Integer(2));
        inner.insert(String::from("ratio"), Value::Float(0.25));
        let mut outer = Mapping::new();
        outer.insert(String::from("inner"), Value::Mapping(inner));
        outer.insert(String::from("list"), Value::from(vec![1_i64, 2, 3]));
        let value = Value::Mapping(outer);

        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn non_finite_floats_are_refused() {
        let mut map = Mapping::new();
        map.insert(String::from("ratio"), Value::Float(f64::NAN));
        for value in [
            Value::Float(f64::NAN),
            Value::Float(f64::INFINITY),
            Value::from(vec![Value::Float(1.0), Value::Float(f64::NEG_INFINITY)]),
            Value::Mapping(map),
        ] {
            assert!(matches!(value.encode(), Err(CastError::NonFinite(_))));
        }
    }

    #[test]
    fn non_finite_raw_float_is_rejected() {
        for raw in ["NaN", "inf", "-inf"] {
            assert!(matches!(
                TypeTag::Float.cast(Some(raw)),
                Err(CastError::Invalid { tag: TypeTag::Float, .. })
            ));
        }
    }

    #[test]
    fn strict_equality_between_types() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::String(String::from("1")));
        assert_ne!(Value::Bool(false), Value::Null);
    }

    #[test]
    fn missing_raw_value_is_rejected() {
        assert!(matches!(
            TypeTag::String.cast(None),
            Err(CastError::MissingValue(TypeTag::String))
        ));
        assert_eq!(TypeTag::Null.cast(None).unwrap(), Value::Null);
    }

    #[test]
    fn malformed_raw_value_is_rejected() {
        assert!(matches!(
            TypeTag::Integer.cast(Some("twelve")),
            Err(CastError::Invalid { .. })
        ));
        assert!(matches!(
            TypeTag::Sequence.cast(Some(r#"{"a":1}"#)),
            Err(CastError::Invalid { .. })
        ));
    }

    #[test]
    fn tags_parse_from_storage_names() {
        for tag in [
            TypeTag::Null,
            TypeTag::Boolean,
            TypeTag::Integer,
            TypeTag::Float,
            TypeTag::String,
            TypeTag::Sequence,
            TypeTag::Mapping,
        ] {
            assert_eq!(tag.as_str().parse::<TypeTag>().unwrap(), tag);
        }
        assert!("resource".parse::<TypeTag>().is_err());
    }

    #[test]
    fn serde_goes_through_plain_json() {
        let value = Value::from(vec![Value::Bool(true), Value::Null, Value::from("x")]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[true,null,"x"]"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}

//! Parameter types and the runtime values checked against them.
//!
//! `ParamType` is the declared shape of one positional event argument;
//! `ArgValue` is what actually travels. Conformance is strict: the only
//! widening is `Json`, which accepts any structured value except bytes.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Declared type of one positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParamType {
    Number,
    String,
    Boolean,
    /// Opaque byte sequence, distinct from `String`.
    Bytes,
    /// Any structured value except bytes.
    Json,
    Array(Box<ParamType>),
    Optional(Box<ParamType>),
    /// Leading slot of a timeout acknowledgement.
    ///
    /// Only produced by `derive_timeout_variant`; manifests cannot declare it.
    Error,
}

impl ParamType {
    /// Shorthand for `Array(inner)`.
    pub fn array(inner: ParamType) -> Self {
        ParamType::Array(Box::new(inner))
    }

    /// Shorthand for `Optional(inner)`.
    pub fn optional(inner: ParamType) -> Self {
        ParamType::Optional(Box::new(inner))
    }

    /// Checks whether a runtime value conforms to this type.
    pub fn accepts(&self, value: &ArgValue) -> bool {
        match (self, value) {
            (ParamType::Number, ArgValue::Number(_)) => true,
            (ParamType::String, ArgValue::String(_)) => true,
            (ParamType::Boolean, ArgValue::Boolean(_)) => true,
            (ParamType::Bytes, ArgValue::Bytes(_)) => true,
            (ParamType::Json, ArgValue::Bytes(_) | ArgValue::Error(_)) => false,
            (ParamType::Json, _) => true,
            (ParamType::Array(inner), ArgValue::Array(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (ParamType::Optional(_), ArgValue::Null) => true,
            (ParamType::Optional(inner), other) => inner.accepts(other),
            (ParamType::Error, ArgValue::Null | ArgValue::Error(_)) => true,
            _ => false,
        }
    }

    /// Returns true if the type mentions the error slot anywhere.
    pub fn contains_error(&self) -> bool {
        match self {
            ParamType::Error => true,
            ParamType::Array(inner) | ParamType::Optional(inner) => inner.contains_error(),
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Number => write!(f, "number"),
            ParamType::String => write!(f, "string"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::Json => write!(f, "json"),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::Optional(inner) => write!(f, "{}?", inner),
            ParamType::Error => write!(f, "error"),
        }
    }
}

impl FromStr for ParamType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('?') {
            return Ok(ParamType::optional(inner.parse()?));
        }
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(ParamType::array(inner.parse()?));
        }
        if let Some(inner) = s.strip_prefix("optional<").and_then(|r| r.strip_suffix('>')) {
            return Ok(ParamType::optional(inner.parse()?));
        }
        if let Some(inner) = s.strip_prefix("array<").and_then(|r| r.strip_suffix('>')) {
            return Ok(ParamType::array(inner.parse()?));
        }

        match s {
            "number" => Ok(ParamType::Number),
            "string" => Ok(ParamType::String),
            "boolean" => Ok(ParamType::Boolean),
            "bytes" => Ok(ParamType::Bytes),
            "json" => Ok(ParamType::Json),
            "error" => Ok(ParamType::Error),
            "" => Err(ValidationError::empty_field("param_type")),
            other => Err(ValidationError::invalid_format(
                "param_type",
                format!("unknown type '{}'", other),
            )),
        }
    }
}

impl TryFrom<String> for ParamType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, ValidationError> {
        value.parse()
    }
}

impl From<ParamType> for String {
    fn from(value: ParamType) -> Self {
        value.to_string()
    }
}

/// Formats a parameter list as `(number, string)`.
pub(crate) fn describe(params: &[ParamType]) -> String {
    let inner: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("({})", inner.join(", "))
}

/// Runtime value of one positional argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Number(f64),
    String(String),
    Boolean(bool),
    Bytes(Bytes),
    Json(serde_json::Value),
    Array(Vec<ArgValue>),
    /// Filled into the leading slot of a timeout acknowledgement.
    Error(String),
}

impl ArgValue {
    /// Short name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Number(_) => "number",
            ArgValue::String(_) => "string",
            ArgValue::Boolean(_) => "boolean",
            ArgValue::Bytes(_) => "bytes",
            ArgValue::Json(_) => "json",
            ArgValue::Array(_) => "array",
            ArgValue::Error(_) => "error",
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

impl From<Bytes> for ArgValue {
    fn from(value: Bytes) -> Self {
        ArgValue::Bytes(value)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        ArgValue::Json(value)
    }
}

/// Checks positional values against positional types, arity included.
pub fn conforms(params: &[ParamType], values: &[ArgValue]) -> bool {
    params.len() == values.len()
        && params
            .iter()
            .zip(values)
            .all(|(param, value)| param.accepts(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_and_strings_are_never_coerced() {
        assert!(!ParamType::String.accepts(&ArgValue::Bytes(Bytes::from_static(b"hi"))));
        assert!(!ParamType::Bytes.accepts(&ArgValue::from("hi")));
        assert!(!ParamType::Json.accepts(&ArgValue::Bytes(Bytes::from_static(b"hi"))));
    }

    #[test]
    fn json_accepts_structured_values() {
        assert!(ParamType::Json.accepts(&ArgValue::Json(serde_json::json!({"a": 1}))));
        assert!(ParamType::Json.accepts(&ArgValue::Number(1.0)));
        assert!(ParamType::Json.accepts(&ArgValue::Null));
    }

    #[test]
    fn optional_accepts_null_and_inner() {
        let ty = ParamType::optional(ParamType::Number);
        assert!(ty.accepts(&ArgValue::Null));
        assert!(ty.accepts(&ArgValue::Number(3.0)));
        assert!(!ty.accepts(&ArgValue::from("3")));
    }

    #[test]
    fn array_checks_every_item() {
        let ty = ParamType::array(ParamType::String);
        assert!(ty.accepts(&ArgValue::Array(vec!["a".into(), "b".into()])));
        assert!(!ty.accepts(&ArgValue::Array(vec!["a".into(), ArgValue::Number(1.0)])));
        assert!(ty.accepts(&ArgValue::Array(vec![])));
    }

    #[test]
    fn error_slot_accepts_null_or_error() {
        assert!(ParamType::Error.accepts(&ArgValue::Null));
        assert!(ParamType::Error.accepts(&ArgValue::Error("timeout".into())));
        assert!(!ParamType::Error.accepts(&ArgValue::from("timeout")));
    }

    #[test]
    fn parses_manifest_spellings() {
        assert_eq!("number".parse::<ParamType>().unwrap(), ParamType::Number);
        assert_eq!(
            "string[]".parse::<ParamType>().unwrap(),
            ParamType::array(ParamType::String)
        );
        assert_eq!(
            "array<bytes>".parse::<ParamType>().unwrap(),
            ParamType::array(ParamType::Bytes)
        );
        assert_eq!(
            "optional<json>".parse::<ParamType>().unwrap(),
            ParamType::optional(ParamType::Json)
        );
        assert_eq!(
            "string?[]".parse::<ParamType>().unwrap(),
            ParamType::array(ParamType::optional(ParamType::String))
        );
    }

    #[test]
    fn rejects_unknown_type_names() {
        let err = "integer".parse::<ParamType>().unwrap_err();
        assert!(err.to_string().contains("unknown type 'integer'"));
        assert!("".parse::<ParamType>().is_err());
    }

    #[test]
    fn display_parses_back() {
        let ty = ParamType::optional(ParamType::array(ParamType::optional(ParamType::Number)));
        assert_eq!(ty.to_string().parse::<ParamType>().unwrap(), ty);
    }

    #[test]
    fn conforms_checks_arity() {
        let params = vec![ParamType::Number, ParamType::String];
        assert!(conforms(&params, &[ArgValue::Number(1.0), "x".into()]));
        assert!(!conforms(&params, &[ArgValue::Number(1.0)]));
        assert!(conforms(&[], &[]));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ParamType::array(ParamType::Bytes)).unwrap();
        assert_eq!(json, r#""bytes[]""#);
        let back: ParamType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ParamType::array(ParamType::Bytes));
    }
}

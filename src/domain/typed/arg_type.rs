//! Mapping between Rust types and contract parameter types.

use bytes::Bytes;
use thiserror::Error;

use crate::domain::contract::{ArgValue, ParamType};

/// Failure to turn runtime values back into typed arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgDecodeError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: ParamType,
        found: &'static str,
    },

    #[error("expected {expected} arguments, found {found}")]
    Arity { expected: usize, found: usize },
}

impl ArgDecodeError {
    fn mismatch<T: ArgType>(value: &ArgValue) -> Self {
        ArgDecodeError::TypeMismatch {
            expected: T::param_type(),
            found: value.kind(),
        }
    }
}

/// A Rust type usable as one positional event argument.
pub trait ArgType: Sized + Send + 'static {
    /// Contract type this Rust type stands for.
    fn param_type() -> ParamType;

    fn into_arg(self) -> ArgValue;

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError>;
}

impl ArgType for f64 {
    fn param_type() -> ParamType {
        ParamType::Number
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Number(self)
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::Number(n) => Ok(n),
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl ArgType for i64 {
    fn param_type() -> ParamType {
        ParamType::Number
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Number(self as f64)
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            // i64::MAX as f64 rounds up to 2^63, which is out of range.
            ArgValue::Number(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
                Ok(n as i64)
            }
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl ArgType for u32 {
    fn param_type() -> ParamType {
        ParamType::Number
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Number(f64::from(self))
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::Number(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => {
                Ok(n as u32)
            }
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl ArgType for String {
    fn param_type() -> ParamType {
        ParamType::String
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::String(self)
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::String(s) => Ok(s),
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl ArgType for bool {
    fn param_type() -> ParamType {
        ParamType::Boolean
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Boolean(self)
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::Boolean(b) => Ok(b),
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl ArgType for Bytes {
    fn param_type() -> ParamType {
        ParamType::Bytes
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Bytes(self)
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::Bytes(b) => Ok(b),
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl ArgType for serde_json::Value {
    fn param_type() -> ParamType {
        ParamType::Json
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Json(self)
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        use serde_json::Value;

        match value {
            ArgValue::Json(v) => Ok(v),
            ArgValue::Null => Ok(Value::Null),
            ArgValue::String(s) => Ok(Value::String(s)),
            ArgValue::Boolean(b) => Ok(Value::Bool(b)),
            ArgValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or(ArgDecodeError::TypeMismatch {
                    expected: ParamType::Json,
                    found: "non-finite number",
                }),
            ArgValue::Array(items) => items
                .into_iter()
                .map(Self::from_arg)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other @ (ArgValue::Bytes(_) | ArgValue::Error(_)) => {
                Err(ArgDecodeError::mismatch::<Self>(&other))
            }
        }
    }
}

impl<T: ArgType> ArgType for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::array(T::param_type())
    }

    fn into_arg(self) -> ArgValue {
        ArgValue::Array(self.into_iter().map(ArgType::into_arg).collect())
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::Array(items) => items.into_iter().map(T::from_arg).collect(),
            other => Err(ArgDecodeError::mismatch::<Self>(&other)),
        }
    }
}

impl<T: ArgType> ArgType for Option<T> {
    fn param_type() -> ParamType {
        ParamType::optional(T::param_type())
    }

    fn into_arg(self) -> ArgValue {
        match self {
            Some(value) => value.into_arg(),
            None => ArgValue::Null,
        }
    }

    fn from_arg(value: ArgValue) -> Result<Self, ArgDecodeError> {
        match value {
            ArgValue::Null => Ok(None),
            other => T::from_arg(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_types_map_to_contract_types() {
        assert_eq!(f64::param_type(), ParamType::Number);
        assert_eq!(String::param_type(), ParamType::String);
        assert_eq!(bool::param_type(), ParamType::Boolean);
        assert_eq!(Bytes::param_type(), ParamType::Bytes);
        assert_eq!(serde_json::Value::param_type(), ParamType::Json);
    }

    #[test]
    fn containers_nest() {
        assert_eq!(
            Vec::<Option<String>>::param_type(),
            ParamType::array(ParamType::optional(ParamType::String))
        );
    }

    #[test]
    fn integers_outside_i64_range_are_rejected() {
        let two_pow_63 = 9_223_372_036_854_775_808.0;
        assert!(i64::from_arg(ArgValue::Number(two_pow_63)).is_err());
        assert_eq!(
            i64::from_arg(ArgValue::Number(-two_pow_63)).unwrap(),
            i64::MIN
        );
        assert_eq!(
            i64::from_arg(ArgValue::Number(9_007_199_254_740_992.0)).unwrap(),
            9_007_199_254_740_992
        );
        assert!(i64::from_arg(ArgValue::Number(1.5)).is_err());
    }

    #[test]
    fn bytes_do_not_decode_as_string() {
        let err = String::from_arg(ArgValue::Bytes(Bytes::from_static(b"raw"))).unwrap_err();
        assert_eq!(
            err,
            ArgDecodeError::TypeMismatch {
                expected: ParamType::String,
                found: "bytes"
            }
        );
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(i64::from_arg(ArgValue::Number(7.0)), Ok(7));
        assert!(i64::from_arg(ArgValue::Number(7.5)).is_err());
        assert!(u32::from_arg(ArgValue::Number(-1.0)).is_err());
    }

    #[test]
    fn option_decodes_null_as_none() {
        assert_eq!(Option::<f64>::from_arg(ArgValue::Null), Ok(None));
        assert_eq!(Option::<f64>::from_arg(ArgValue::Number(1.0)), Ok(Some(1.0)));
    }

    #[test]
    fn json_absorbs_plain_values() {
        assert_eq!(
            serde_json::Value::from_arg(ArgValue::Array(vec![
                ArgValue::from("a"),
                ArgValue::Boolean(true)
            ])),
            Ok(json!(["a", true]))
        );
        assert!(serde_json::Value::from_arg(ArgValue::Bytes(Bytes::new())).is_err());
    }

    #[test]
    fn values_produced_by_into_arg_conform() {
        let value = vec![1.5, 2.5].into_arg();
        assert!(Vec::<f64>::param_type().accepts(&value));
    }
}

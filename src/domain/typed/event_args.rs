//! Positional argument lists and acknowledgement shapes.

use crate::domain::contract::{AckSignature, ArgValue, ParamType};

use super::{ArgDecodeError, ArgType};

/// A positional argument list, expressed as a tuple of [`ArgType`]s.
///
/// Implemented for tuples of up to six elements, `()` included.
pub trait EventArgs: Sized + Send + 'static {
    fn param_types() -> Vec<ParamType>;

    fn into_args(self) -> Vec<ArgValue>;

    fn from_args(values: Vec<ArgValue>) -> Result<Self, ArgDecodeError>;
}

macro_rules! impl_event_args {
    ($($name:ident),*) => {
        impl<$($name: ArgType),*> EventArgs for ($($name,)*) {
            fn param_types() -> Vec<ParamType> {
                vec![$($name::param_type()),*]
            }

            #[allow(non_snake_case)]
            fn into_args(self) -> Vec<ArgValue> {
                let ($($name,)*) = self;
                vec![$($name.into_arg()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_args(values: Vec<ArgValue>) -> Result<Self, ArgDecodeError> {
                let expected = Self::param_types().len();
                let found = values.len();
                if found != expected {
                    return Err(ArgDecodeError::Arity { expected, found });
                }
                let mut values = values.into_iter();
                Ok(($(
                    $name::from_arg(
                        values.next().ok_or(ArgDecodeError::Arity { expected, found })?,
                    )?,
                )*))
            }
        }
    };
}

impl_event_args!();
impl_event_args!(A);
impl_event_args!(A, B);
impl_event_args!(A, B, C);
impl_event_args!(A, B, C, D);
impl_event_args!(A, B, C, D, E);
impl_event_args!(A, B, C, D, E, F);

/// Acknowledgement shape of an event: [`NoAck`] or an [`EventArgs`] list.
pub trait AckSpec: Send + 'static {
    fn ack_signature() -> Option<AckSignature>;
}

/// Marker for events that carry no acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoAck {}

impl AckSpec for NoAck {
    fn ack_signature() -> Option<AckSignature> {
        None
    }
}

impl<T: EventArgs> AckSpec for T {
    fn ack_signature() -> Option<AckSignature> {
        Some(AckSignature::new(T::param_types()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn unit_is_the_empty_list() {
        assert!(<()>::param_types().is_empty());
        assert!(().into_args().is_empty());
        assert_eq!(<()>::from_args(vec![]), Ok(()));
    }

    #[test]
    fn tuples_keep_positional_order() {
        assert_eq!(
            <(f64, String, Bytes)>::param_types(),
            vec![ParamType::Number, ParamType::String, ParamType::Bytes]
        );

        let values = (1.0, "2".to_string(), Bytes::from_static(&[3])).into_args();
        assert_eq!(
            values,
            vec![
                ArgValue::Number(1.0),
                ArgValue::from("2"),
                ArgValue::Bytes(Bytes::from_static(&[3]))
            ]
        );
    }

    #[test]
    fn decoding_checks_arity_first() {
        assert_eq!(
            <(f64,)>::from_args(vec![]),
            Err(ArgDecodeError::Arity {
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            <()>::from_args(vec![ArgValue::Null]),
            Err(ArgDecodeError::Arity {
                expected: 0,
                found: 1
            })
        );
    }

    #[test]
    fn decoding_reports_type_mismatch() {
        assert!(matches!(
            <(String, f64)>::from_args(vec![ArgValue::from("a"), ArgValue::from("b")]),
            Err(ArgDecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn ack_specs() {
        assert_eq!(NoAck::ack_signature(), None);
        assert_eq!(<()>::ack_signature(), Some(AckSignature::completion()));
        assert_eq!(
            <(f64,)>::ack_signature().unwrap().params(),
            &[ParamType::Number]
        );
    }
}

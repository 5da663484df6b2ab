//! Timeout variant of an event signature.
//!
//! A call issued with a deadline sees an acknowledgement whose first
//! slot is an error indicator: `Null` when the ack arrived in time,
//! `Error(..)` when the deadline passed. The receiver's handler keeps
//! the base signature; only the caller ever holds a [`TimeoutSignature`].

use std::fmt;
use std::time::Duration;

use super::param_type::{conforms, describe};
use super::{AckSignature, ArgValue, ContractError, EventSignature, ParamType};

/// Caller-side view of an acknowledgement issued under a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeoutAckSignature {
    /// Always starts with `ParamType::Error`.
    params: Vec<ParamType>,
}

impl TimeoutAckSignature {
    fn from_base(base: &AckSignature) -> Self {
        let mut params = Vec::with_capacity(base.params().len() + 1);
        params.push(ParamType::Error);
        params.extend(base.params().iter().cloned());
        Self { params }
    }

    /// Full caller-side parameter list, error slot first.
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Parameter list the receiver actually passes back.
    pub fn receiver_params(&self) -> &[ParamType] {
        &self.params[1..]
    }

    /// Accepts either a full answer (`Null` slot plus receiver values)
    /// or a lone `Error`, which is what an expired deadline produces.
    pub fn accepts(&self, values: &[ArgValue]) -> bool {
        matches!(values, [ArgValue::Error(_)]) || conforms(&self.params, values)
    }
}

impl fmt::Display for TimeoutAckSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe(&self.params))
    }
}

/// Event signature as seen by a caller that attached a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeoutSignature {
    params: Vec<ParamType>,
    ack: TimeoutAckSignature,
    deadline: Duration,
}

impl TimeoutSignature {
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn ack(&self) -> &TimeoutAckSignature {
        &self.ack
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Checks emitted values; identical to the base signature's check.
    pub fn accepts(&self, values: &[ArgValue]) -> bool {
        conforms(&self.params, values)
    }
}

impl fmt::Display for TimeoutSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> ack{} within {:?}",
            describe(&self.params),
            self.ack,
            self.deadline
        )
    }
}

/// Derives the caller-side signature for an emit issued under `deadline`.
///
/// # Errors
///
/// - `TimeoutWithoutAck` if the base signature has no acknowledgement
/// - `InvalidDeadline` if `deadline` is zero
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use event_contracts::domain::contract::{derive_timeout_variant, EventSignature, ParamType};
///
/// let base = EventSignature::new(vec![]).with_ack(vec![ParamType::String]);
/// let timed = derive_timeout_variant(&base, Duration::from_secs(5)).unwrap();
/// assert_eq!(timed.ack().params(), &[ParamType::Error, ParamType::String]);
/// ```
pub fn derive_timeout_variant(
    signature: &EventSignature,
    deadline: Duration,
) -> Result<TimeoutSignature, ContractError> {
    if deadline.is_zero() {
        return Err(ContractError::InvalidDeadline { deadline });
    }
    let ack = signature.ack().ok_or(ContractError::TimeoutWithoutAck)?;

    Ok(TimeoutSignature {
        params: signature.params().to_vec(),
        ack: TimeoutAckSignature::from_base(ack),
        deadline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn string_ack_gains_leading_error_slot() {
        let base = EventSignature::new(vec![]).with_ack(vec![ParamType::String]);
        let timed = derive_timeout_variant(&base, secs(1)).unwrap();

        assert_eq!(timed.ack().params(), &[ParamType::Error, ParamType::String]);
        assert_eq!(timed.ack().receiver_params(), &[ParamType::String]);
    }

    #[test]
    fn empty_ack_becomes_error_only() {
        let base = EventSignature::new(vec![ParamType::Number]).with_ack(vec![]);
        let timed = derive_timeout_variant(&base, secs(1)).unwrap();

        assert_eq!(timed.ack().params(), &[ParamType::Error]);
        assert!(timed.ack().receiver_params().is_empty());
    }

    #[test]
    fn base_signature_is_untouched() {
        let base = EventSignature::new(vec![]).with_ack(vec![ParamType::String]);
        let _ = derive_timeout_variant(&base, secs(1)).unwrap();

        assert_eq!(base.ack().unwrap().params(), &[ParamType::String]);
    }

    #[test]
    fn emitted_params_are_preserved() {
        let base = EventSignature::new(vec![ParamType::Number, ParamType::Bytes]).with_ack(vec![]);
        let timed = derive_timeout_variant(&base, secs(3)).unwrap();

        assert_eq!(timed.params(), base.params());
        assert_eq!(timed.deadline(), secs(3));
    }

    #[test]
    fn rejects_signature_without_ack() {
        let base = EventSignature::new(vec![ParamType::String]);
        assert_eq!(
            derive_timeout_variant(&base, secs(1)),
            Err(ContractError::TimeoutWithoutAck)
        );
    }

    #[test]
    fn rejects_zero_deadline() {
        let base = EventSignature::notification().with_ack(vec![]);
        assert!(matches!(
            derive_timeout_variant(&base, Duration::ZERO),
            Err(ContractError::InvalidDeadline { .. })
        ));
    }

    #[test]
    fn ack_accepts_null_or_error_in_leading_slot() {
        let base = EventSignature::notification().with_ack(vec![ParamType::Number]);
        let timed = derive_timeout_variant(&base, secs(1)).unwrap();

        assert!(timed.ack().accepts(&[ArgValue::Null, ArgValue::Number(1.0)]));
        assert!(timed.ack().accepts(&[
            ArgValue::Error("timeout".into()),
            ArgValue::Number(0.0)
        ]));
        assert!(timed.ack().accepts(&[ArgValue::Error("timeout".into())]));
        assert!(!timed.ack().accepts(&[ArgValue::Null]));
        assert!(!timed.ack().accepts(&[ArgValue::Number(1.0)]));
    }
}

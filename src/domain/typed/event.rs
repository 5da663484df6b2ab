//! Events, event sets and namespace contracts as Rust types.
//!
//! Each event is a zero-sized type implementing [`ContractEvent`]. Its
//! `Set` names the one [`EventSet`] it belongs to, so a socket that only
//! accepts events of a given set rejects foreign events at compile time.
//! The same types also produce the runtime [`EventMap`]s, keeping the two
//! representations in agreement.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::contract::{
    derive_timeout_variant, ContractBundle, ContractError, Direction, EventMap, EventSignature,
    SharedStateShape, TimeoutSignature,
};
use crate::domain::namespace::{ChannelId, NamespaceRegistry};

use super::{AckSpec, ArgDecodeError, EventArgs};

/// One declared event.
pub trait ContractEvent: Send + Sync + 'static {
    /// Set this event is declared in.
    type Set: EventSet;

    const NAME: &'static str;

    type Args: EventArgs;

    /// [`NoAck`](super::NoAck) or the acknowledgement's argument list.
    type Ack: AckSpec;

    fn signature() -> EventSignature {
        let signature = EventSignature::new(<Self::Args as EventArgs>::param_types());
        match <Self::Ack as AckSpec>::ack_signature() {
            Some(ack) => signature.with_ack(ack.params().to_vec()),
            None => signature,
        }
    }
}

/// A named group of events, usable as one direction's contract.
pub trait EventSet: Send + Sync + 'static {
    /// Builds the runtime contract for this set under `direction`.
    fn contract(direction: Direction) -> Result<EventMap, ContractError>;
}

/// Set with no events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEvents {}

impl EventSet for NoEvents {
    fn contract(direction: Direction) -> Result<EventMap, ContractError> {
        Ok(EventMap::new(direction))
    }
}

/// Complete typed contract of one channel.
pub trait NamespaceContract: Send + Sync + 'static {
    /// Channel path, e.g. `/` or `/chat`.
    const CHANNEL: &'static str;

    type ClientToServer: EventSet;
    type ServerToClient: EventSet;
    type InterServer: EventSet;

    /// Per-connection shared state; none by default.
    fn shared_state() -> Result<SharedStateShape, ContractError> {
        Ok(SharedStateShape::new())
    }

    fn bundle() -> Result<ContractBundle, ContractError> {
        ContractBundle::from_parts(
            Self::ClientToServer::contract(Direction::ClientToServer)?,
            Self::ServerToClient::contract(Direction::ServerToClient)?,
            Self::InterServer::contract(Direction::InterServer)?,
            Self::shared_state()?,
        )
    }

    /// Binds this contract into `registry` under [`Self::CHANNEL`].
    fn bind(registry: &mut NamespaceRegistry) -> Result<Arc<ContractBundle>, ContractError> {
        registry.bind_channel(ChannelId::new(Self::CHANNEL)?, Self::bundle()?)
    }
}

/// Why an acknowledgement did not produce values.
///
/// This is the typed form of the leading error slot of a timeout
/// acknowledgement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AckError {
    #[error("operation has timed out after {deadline:?}")]
    Timeout { deadline: Duration },

    #[error("acknowledgement was dropped without being sent")]
    Dropped,

    #[error("acknowledgement does not match the contract: {0}")]
    Decode(#[from] ArgDecodeError),
}

/// Timeout variant of the event `E`.
///
/// Only exists for events that declare an acknowledgement.
pub struct WithTimeout<E>(PhantomData<fn() -> E>);

impl<E> WithTimeout<E>
where
    E: ContractEvent,
    E::Ack: EventArgs,
{
    /// Caller-side signature under `deadline`.
    pub fn signature(deadline: Duration) -> Result<TimeoutSignature, ContractError> {
        derive_timeout_variant(&E::signature(), deadline)
    }
}

/// What a caller receives from a timeout call of `E`.
pub type TimeoutAck<E> = Result<<E as ContractEvent>::Ack, AckError>;

/// Declares an [`EventSet`] and its [`ContractEvent`]s.
///
/// ```
/// use bytes::Bytes;
/// use event_contracts::domain::contract::{Direction, ParamType};
/// use event_contracts::domain::typed::{ContractEvent, EventSet};
/// use event_contracts::event_set;
///
/// event_set! {
///     pub struct ServerEvents {
///         BasicEmit = "basicEmit": (f64, String, Bytes);
///         WithAck = "withAck": (String) => (f64);
///         NoArg = "noArg": ();
///     }
/// }
///
/// let map = ServerEvents::contract(Direction::ServerToClient).unwrap();
/// assert_eq!(map.len(), 3);
/// assert_eq!(WithAck::signature().ack().unwrap().params(), &[ParamType::Number]);
/// ```
#[macro_export]
macro_rules! event_set {
    (@ack) => {
        $crate::domain::typed::NoAck
    };
    (@ack ( $($ack:ty),* )) => {
        ( $($ack,)* )
    };
    (
        $(#[$set_meta:meta])*
        $vis:vis struct $set:ident {
            $(
                $(#[$event_meta:meta])*
                $event:ident = $name:literal : ( $($arg:ty),* $(,)? ) $( => ( $($ack:ty),* $(,)? ) )? ;
            )*
        }
    ) => {
        $(#[$set_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $set;

        impl $crate::domain::typed::EventSet for $set {
            fn contract(
                direction: $crate::domain::contract::Direction,
            ) -> ::std::result::Result<
                $crate::domain::contract::EventMap,
                $crate::domain::contract::ContractError,
            > {
                #[allow(unused_mut)]
                let mut map = $crate::domain::contract::EventMap::new(direction);
                $(
                    map.declare(
                        $crate::domain::contract::EventName::new($name)?,
                        <$event as $crate::domain::typed::ContractEvent>::signature(),
                    )?;
                )*
                Ok(map)
            }
        }

        $(
            $(#[$event_meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            $vis struct $event;

            impl $crate::domain::typed::ContractEvent for $event {
                type Set = $set;
                const NAME: &'static str = $name;
                type Args = ( $($arg,)* );
                type Ack = $crate::event_set!(@ack $( ( $($ack),* ) )?);
            }
        )*
    };
}

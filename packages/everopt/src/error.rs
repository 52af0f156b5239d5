//! Error handling helpers for within the options protocol
use crate::event::CosmwasmEventExt;
use cosmwasm_std::Event;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An error message for the options protocol
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct OptError<T = ()> {
    /// Unique identifier for this error
    pub id: ErrorId,
    /// Where in the protocol the error came from
    pub domain: ErrorDomain,
    /// User friendly description
    pub description: String,
    /// Optional additional information
    pub data: Option<T>,
}

/// Unique identifier for an error within the protocol
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorId {
    // domain errors
    ZeroSubsidy,
    ZeroSigma,
    InvalidStrike,
    InvalidSize,
    InvalidConfig,
    IndexOutOfRange,

    // authorization
    Auth,

    // state errors
    AlreadyInitialized,
    NotInitialized,
    Paused,
    PositionInactive,
    NotInTheMoney,
    NotLiquidatable,
    Reentrancy,

    // numerical errors
    LnUndefined,
    ExpOverflow,
    LogDomain,
    SolverDidNotConverge,
    InsufficientLiquidity,

    // oracle errors
    StalePrice,
    StaleRound,
    InvalidPrice,
    FeedNotSet,

    // off-chain verification
    QuantityMismatch,
    InvalidVerification,

    // accounting
    InsufficientFunding,
    InsufficientAvailable,

    // funds handling
    Conversion,
    NativeFunds,
    Cw20Funds,
    MissingFunds,
    UnnecessaryFunds,

    // catch-all
    Any,
}

/// Source within the protocol for the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ErrorDomain {
    Market,
    Engine,
    Buckets,
    Funding,
    Guard,
    Oracle,
    LiquidityPool,
    PositionToken,
    Wallet,
    Math,
    Default,
}

/// Generate an [OptError] and then wrap it up in an anyhow error
#[macro_export]
macro_rules! opt_anyhow {
    ($id:expr, $domain:expr, $($t:tt)*) => {{
        anyhow::Error::new($crate::error::OptError {
            id: $id,
            domain: $domain,
            description: format!($($t)*),
            data: None::<()>,
        })
    }};
}

/// Ensure a condition is true, otherwise returns from the function with an error.
#[macro_export]
macro_rules! opt_ensure {
    ($val:expr, $id:expr, $domain:expr, $($t:tt)*) => {{
        if !$val {
            return Err(anyhow::Error::new($crate::error::OptError {
                id: $id,
                domain: $domain,
                description: format!($($t)*),
                data: None::<()>,
            }));
        }
    }};
}

/// Return early with the given protocol error
#[macro_export]
macro_rules! opt_bail {
    ($id:expr, $domain:expr, $($t:tt)*) => {{
        return Err(anyhow::Error::new($crate::error::OptError {
            id: $id,
            domain: $domain,
            description: format!($($t)*),
            data: None::<()>,
        }));
    }};
}

impl OptError {
    /// Construct a new error value
    pub fn new(id: ErrorId, domain: ErrorDomain, description: impl Into<String>) -> Self {
        OptError {
            id,
            domain,
            description: description.into(),
            data: None,
        }
    }

    /// Include error information into an event
    pub fn mixin_event(&self, evt: Event) -> Event {
        // these unwraps are okay, just a shorthand helper to get the enum variants as a string
        let evt = evt.add_attributes([
            ("error-id", serde_json::to_string(&self.id).unwrap()),
            ("error-domain", serde_json::to_string(&self.domain).unwrap()),
            ("error-description", self.description.to_string()),
        ]);

        match &self.data {
            None => evt,
            Some(data) => evt.add_attribute("error-data", serde_json::to_string(data).unwrap()),
        }
    }
}

/// Pull the protocol [ErrorId] out of an anyhow error, if there is one.
pub fn error_id_of(err: &anyhow::Error) -> Option<ErrorId> {
    err.downcast_ref::<OptError>().map(|e| e.id)
}

impl<T: Serialize> fmt::Display for OptError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?
        )
    }
}

impl<T: Serialize> fmt::Debug for OptError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?
        )
    }
}

impl TryFrom<Event> for OptError {
    type Error = anyhow::Error;

    fn try_from(evt: Event) -> anyhow::Result<Self> {
        Ok(Self {
            id: evt.json_attr("error-id")?,
            domain: evt.json_attr("error-domain")?,
            description: evt.string_attr("error-description")?,
            data: evt.try_json_attr("error-data")?,
        })
    }
}

impl<T: Serialize> std::error::Error for OptError<T> {}

//! Address helpers.
use anyhow::{Context, Result};
use cosmwasm_std::{Addr, Api};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An unvalidated address coming in over a message boundary.
///
/// Addresses must always be validated against the [Api] before being used;
/// keeping the raw form as its own type makes it impossible to forget.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
pub struct RawAddr(String);

impl RawAddr {
    /// Validate against the given [Api], producing a checked [Addr].
    pub fn validate(&self, api: &dyn Api) -> Result<Addr> {
        api.addr_validate(&self.0)
            .with_context(|| format!("invalid address: {}", self.0))
    }

    /// View the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RawAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RawAddr {
    fn from(s: String) -> Self {
        RawAddr(s)
    }
}

impl From<&str> for RawAddr {
    fn from(s: &str) -> Self {
        RawAddr(s.to_owned())
    }
}

impl From<Addr> for RawAddr {
    fn from(addr: Addr) -> Self {
        RawAddr(addr.into_string())
    }
}

impl From<&Addr> for RawAddr {
    fn from(addr: &Addr) -> Self {
        RawAddr(addr.to_string())
    }
}

//! Position types for the market contract.
use crate::number::{Collateral, Price};
use anyhow::{anyhow, Result};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal256, Timestamp, Uint64};
use std::fmt;
use std::str::FromStr;

/// The two flavors of everlasting option.
#[cw_serde]
#[derive(Copy, Eq, Hash)]
pub enum OptionKind {
    /// Pays `max(spot - strike, 0)` per unit of size.
    Call,
    /// Pays `max(strike - spot, 0)` per unit of size.
    Put,
}

impl OptionKind {
    /// Stable string form, used in events and token ids.
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::Call => "call",
            OptionKind::Put => "put",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "call" => Ok(OptionKind::Call),
            "put" => Ok(OptionKind::Put),
            _ => Err(anyhow!("invalid option kind: {s}")),
        }
    }
}

/// Identifier of a position, assigned by an auto-incrementing counter.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord)]
pub struct PositionId(Uint64);

impl std::hash::Hash for PositionId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.u64().hash(state);
    }
}

impl PositionId {
    /// Construct from the raw counter value.
    pub fn new(id: u64) -> Self {
        PositionId(id.into())
    }

    /// The raw counter value.
    pub fn u64(self) -> u64 {
        self.0.u64()
    }

    /// The next id in sequence.
    pub fn next(self) -> Self {
        PositionId((self.0.u64() + 1).into())
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PositionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse().map(PositionId::new).map_err(|e: std::num::ParseIntError| e.into())
    }
}

/// An open (or closed) everlasting option position.
#[cw_serde]
pub struct Position {
    /// Position holder, receives payouts and controls the position
    pub owner: Addr,
    /// Call or put
    pub kind: OptionKind,
    /// Strike price, WAD
    pub strike: Price,
    /// Option size, WAD
    pub size: Decimal256,
    /// Remaining funding escrow, quote-unit precision.
    ///
    /// Non-increasing between deposits.
    pub funding_balance: Collateral,
    /// Last time funding was settled against this position
    pub last_funding_time: Timestamp,
    /// False once exercised, fully sold or liquidated. Terminal.
    pub active: bool,
}

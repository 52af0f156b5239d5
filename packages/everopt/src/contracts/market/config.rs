//! Configuration for the market contract.
use crate::number::Collateral;
use crate::prelude::RawAddr;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal256};

/// Runtime configuration of the market.
///
/// The wiring addresses are fixed at instantiation (the feed may be swapped
/// by the owner); the scalar parameters are owner-tunable through
/// [ConfigUpdate] with the range checks applied in the contract.
#[cw_serde]
pub struct Config {
    /// Liquidity pool backing the market maker
    pub pool: Addr,
    /// Semi-fungible token tracking position ownership
    pub position_token: Addr,
    /// Price feed aggregator. Queries needing spot fail with `feed_not_set`
    /// until this is configured.
    pub feed: Option<Addr>,
    /// Decimal places of the feed's raw answers (reference feeds use 8)
    pub feed_decimals: u32,
    /// Relative spot drift beyond which the bucket grid may be recentered
    pub rebalance_threshold: Decimal256,
    /// Maximum accepted age of a feed round, seconds
    pub oracle_staleness_seconds: u64,
    /// Geometric-series factor of the everlasting funding structure.
    /// Always at least 1; daily funding corresponds to 2.
    pub premium_factor: Decimal256,
    /// Length of one funding period, seconds
    pub funding_period_seconds: u64,
    /// Per-second funding cap per unit of position size
    pub max_funding_rate: Decimal256,
    /// Smallest funding escrow a position may hold before becoming
    /// liquidatable (and the minimum prefund at open)
    pub min_funding_balance: Collateral,
    /// Grace period applied by the liquidation policy, seconds
    pub liquidation_grace_seconds: u64,
    /// Largest accepted cost-function residual in `verify_and_set_cost`
    pub verification_tolerance: Decimal256,
    /// Blocks all non-owner mutating entry points when set
    pub paused: bool,
}

impl Config {
    /// Default configuration for the given wiring.
    pub fn new(pool: Addr, position_token: Addr, feed: Option<Addr>, feed_decimals: u32) -> Self {
        Config {
            pool,
            position_token,
            feed,
            feed_decimals,
            rebalance_threshold: Decimal256::percent(10),
            oracle_staleness_seconds: 3600,
            premium_factor: Decimal256::percent(200),
            funding_period_seconds: 86400,
            max_funding_rate: Decimal256::one(),
            min_funding_balance: Collateral::one(),
            liquidation_grace_seconds: 3600,
            verification_tolerance: Decimal256::raw(1_000_000_000_000),
            paused: false,
        }
    }
}

/// Owner-issued partial update of [Config].
#[cw_serde]
#[derive(Default)]
pub struct ConfigUpdate {
    /// New price feed aggregator, with its decimal places
    pub feed: Option<(RawAddr, u32)>,
    /// See [Config::rebalance_threshold]
    pub rebalance_threshold: Option<Decimal256>,
    /// See [Config::oracle_staleness_seconds]; validated to `[60, 86400]`
    pub oracle_staleness_seconds: Option<u64>,
    /// See [Config::premium_factor]; validated to `>= 1`
    pub premium_factor: Option<Decimal256>,
    /// See [Config::funding_period_seconds]; validated to `> 0`
    pub funding_period_seconds: Option<u64>,
    /// See [Config::max_funding_rate]
    pub max_funding_rate: Option<Decimal256>,
    /// See [Config::min_funding_balance]
    pub min_funding_balance: Option<Collateral>,
    /// See [Config::liquidation_grace_seconds]
    pub liquidation_grace_seconds: Option<u64>,
    /// See [Config::verification_tolerance]
    pub verification_tolerance: Option<Decimal256>,
    /// See [Config::paused]
    pub paused: Option<bool>,
}

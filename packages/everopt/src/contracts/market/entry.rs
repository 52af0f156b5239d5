//! Entrypoint messages for the market contract.
use super::config::ConfigUpdate;
use super::position::{OptionKind, Position, PositionId};
use crate::number::{Collateral, Price};
use crate::prelude::RawAddr;
use crate::token::TokenInit;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Decimal256, Timestamp};
use cw20::Cw20ReceiveMsg;

/// Parameters of the bucket grid, fixed at instantiation except for the
/// center (see [ExecuteMsg::Recenter]).
#[cw_serde]
pub struct GridParams {
    /// Initial center of the regular buckets
    pub center_price: Price,
    /// Width of each regular bucket
    pub bucket_width: Price,
    /// Number of regular buckets; even and at least 4. Two open tail
    /// buckets are added on top of these.
    pub num_regular: u32,
}

/// The one-time instantiation message.
#[cw_serde]
pub struct InstantiateMsg {
    /// Contract owner; defaults to the instantiation sender
    pub owner: Option<RawAddr>,
    /// Liquidity pool backing the market maker
    pub pool: RawAddr,
    /// Semi-fungible position token
    pub position_token: RawAddr,
    /// Price feed aggregator with its raw decimal places
    pub feed: Option<(RawAddr, u32)>,
    /// The quote asset
    pub token: TokenInit,
    /// Bucket grid parameters
    pub grid: GridParams,
    /// Modifications to the default config values
    pub config: Option<ConfigUpdate>,
}

/// Migration message, currently empty.
#[cw_serde]
pub struct MigrateMsg {}

/// Execute message for the market contract.
#[cw_serde]
pub enum ExecuteMsg {
    /// cw20 receive hook; the embedded message must be one of the
    /// fund-carrying variants
    Receive(Cw20ReceiveMsg),

    /// Owner-only executions
    Owner(ExecuteOwnerMsg),

    /// One-shot pricing engine initialization.
    ///
    /// The subsidy sets the engine's initial cost and with it the constant
    /// utility level; it must not exceed the pool's reserved subsidy.
    InitializeEngine {
        /// Initial cost, in quote units (WAD)
        subsidy: Collateral,
        /// When given, seed a log-normal prior of this width around the
        /// current spot instead of the uniform prior
        sigma: Option<Decimal256>,
    },

    /// Open a position. Attached funds must cover the quoted premium plus
    /// `prefund`; any excess is returned.
    Buy {
        /// Call or put
        kind: OptionKind,
        /// Strike price in quote units
        strike: Price,
        /// Option size, WAD
        size: Decimal256,
        /// Funding escrow to seed the position with; must be at least the
        /// configured minimum funding balance
        prefund: Collateral,
    },

    /// Sell size back to the market maker. Owner-only; a full-size sell
    /// closes the position.
    Sell {
        /// Position to sell from
        id: PositionId,
        /// Size to sell, WAD
        size: Decimal256,
    },

    /// Exercise an in-the-money position at spot, closing it.
    Exercise {
        /// Position to exercise
        id: PositionId,
    },

    /// Top up a position's funding escrow. Funds attached.
    DepositFunding {
        /// Position to fund
        id: PositionId,
    },

    /// Settle accrued funding against a position's escrow. Permissionless.
    AccrueFunding {
        /// Position to accrue
        id: PositionId,
    },

    /// Close a position whose funding has drained. Permissionless; the
    /// remaining escrow is awarded to the caller.
    Liquidate {
        /// Position to liquidate
        id: PositionId,
    },

    /// Move the bucket grid to a new center. Permissionless, but only
    /// accepted while the rebalance condition holds.
    Recenter {
        /// New center price
        new_center: Price,
    },

    /// Commit an off-chain solved cost after on-chain verification of the
    /// cost-function residual. The submitted shares must match the
    /// committed state exactly.
    VerifyAndSetCost {
        /// Proposed cost
        cost: crate::number::Number,
        /// Witness of the share vector the cost was solved against
        shares: Vec<crate::number::Number>,
    },
}

/// Owner-only execute messages.
#[cw_serde]
pub enum ExecuteOwnerMsg {
    /// Update part of the configuration
    ConfigUpdate {
        /// New configuration parameters
        update: ConfigUpdate,
    },

    /// Commit (or clear) the Merkle root of off-chain computed price
    /// bounds, hex-encoded SHA-256
    SetPriceBounds {
        /// New root; `None` disables bound verification
        root: Option<String>,
    },
}

/// Query message for the market contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Current configuration
    #[returns(super::config::Config)]
    Config {},

    /// Bucket grid summary
    #[returns(BucketsResp)]
    Buckets {},

    /// Midpoint and bounds of one bucket
    #[returns(BucketResp)]
    Bucket {
        /// Bucket index, `0..=num_regular+1`
        index: u32,
    },

    /// Index of the bucket containing the given price
    #[returns(u32)]
    BucketIndex {
        /// Price to look up
        price: Price,
    },

    /// Current spot from the price feed
    #[returns(Price)]
    SpotPrice {},

    /// Whether spot has drifted far enough from the grid center to allow
    /// a recenter. Feed errors report as `false`.
    #[returns(bool)]
    NeedsRebalance {},

    /// Pricing engine state
    #[returns(EngineStateResp)]
    EngineState {},

    /// Cost of buying the given option
    #[returns(QuoteResp)]
    QuoteBuy {
        /// Call or put
        kind: OptionKind,
        /// Strike price
        strike: Price,
        /// Size, WAD
        size: Decimal256,
    },

    /// Revenue of selling the given option
    #[returns(QuoteResp)]
    QuoteSell {
        /// Call or put
        kind: OptionKind,
        /// Strike price
        strike: Price,
        /// Size, WAD
        size: Decimal256,
    },

    /// The engine's risk-neutral probability of each bucket
    #[returns(RiskNeutralResp)]
    RiskNeutralPrices {},

    /// Bucket midpoints zipped with their risk-neutral probabilities
    #[returns(ImpliedDistributionResp)]
    ImpliedDistribution {},

    /// Mark price of the given option per unit of size
    #[returns(Price)]
    MarkPrice {
        /// Call or put
        kind: OptionKind,
        /// Strike price
        strike: Price,
    },

    /// Intrinsic value of the given option at spot, per unit of size
    #[returns(Price)]
    Intrinsic {
        /// Call or put
        kind: OptionKind,
        /// Strike price
        strike: Price,
    },

    /// Funding drain per second for a position of the given shape
    #[returns(Collateral)]
    FundingPerSecond {
        /// Call or put
        kind: OptionKind,
        /// Strike price
        strike: Price,
        /// Size, WAD
        size: Decimal256,
    },

    /// A single position
    #[returns(PositionResp)]
    Position {
        /// Position id
        id: PositionId,
    },

    /// All position ids belonging to an owner
    #[returns(PositionsResp)]
    Positions {
        /// Position owner
        owner: RawAddr,
    },

    /// Funding owed by a position since its last accrual, without mutating
    #[returns(PendingFundingResp)]
    PendingFunding {
        /// Position id
        id: PositionId,
    },

    /// Whether the position may currently be liquidated
    #[returns(bool)]
    IsLiquidatable {
        /// Position id
        id: PositionId,
    },

    /// The committed price-bounds Merkle root, if any
    #[returns(Option<String>)]
    PriceBounds {},

    /// Verify a single off-chain price bound against the committed root.
    /// Always true when no root is committed.
    #[returns(bool)]
    VerifyPriceBound {
        /// Call or put
        kind: OptionKind,
        /// Strike price
        strike: Price,
        /// Published bid
        bid: Price,
        /// Published ask
        ask: Price,
        /// Merkle proof, hex-encoded sibling hashes leaf-to-root
        proof: Vec<String>,
    },
}

/// Response for [QueryMsg::Buckets].
#[cw_serde]
pub struct BucketsResp {
    /// Current grid center
    pub center_price: Price,
    /// Regular bucket width
    pub bucket_width: Price,
    /// Number of regular buckets
    pub num_regular: u32,
    /// Lower edge of the regular range
    pub lower_edge: Price,
    /// Upper edge of the regular range
    pub upper_edge: Price,
    /// Midpoints of all buckets, tails included
    pub midpoints: Vec<Price>,
}

/// Response for [QueryMsg::Bucket].
#[cw_serde]
pub struct BucketResp {
    /// Bucket midpoint
    pub midpoint: Price,
    /// Inclusive lower bound
    pub lower: Price,
    /// Exclusive upper bound; `None` for the upper tail
    pub upper: Option<Price>,
}

/// Response for [QueryMsg::EngineState].
#[cw_serde]
pub struct EngineStateResp {
    /// Whether [ExecuteMsg::InitializeEngine] has run
    pub initialized: bool,
    /// Cached cost `C`
    pub cost: crate::number::Number,
    /// Constant utility level `U`
    pub utility: crate::number::Number,
    /// Share vector `q`
    pub shares: Vec<crate::number::Number>,
    /// Prior `π`
    pub prior: Vec<Decimal256>,
    /// Total bucket count, tails included
    pub num_buckets: u32,
}

/// Response for the quote queries.
#[cw_serde]
pub struct QuoteResp {
    /// Premium (buy) or revenue (sell), in quote units (WAD)
    pub amount: Collateral,
}

/// Response for [QueryMsg::RiskNeutralPrices].
#[cw_serde]
pub struct RiskNeutralResp {
    /// Probability per bucket; sums to 1 up to numerical tolerance
    pub prices: Vec<Decimal256>,
}

/// Response for [QueryMsg::ImpliedDistribution].
#[cw_serde]
pub struct ImpliedDistributionResp {
    /// Bucket midpoints
    pub midpoints: Vec<Price>,
    /// Risk-neutral probability of each bucket
    pub prices: Vec<Decimal256>,
}

/// Response for [QueryMsg::Position].
#[cw_serde]
pub struct PositionResp {
    /// The queried id
    pub id: PositionId,
    /// The position
    pub position: Position,
}

/// Response for [QueryMsg::Positions].
#[cw_serde]
pub struct PositionsResp {
    /// All positions of the owner, open and closed
    pub positions: Vec<PositionResp>,
}

/// Response for [QueryMsg::PendingFunding].
#[cw_serde]
pub struct PendingFundingResp {
    /// Funding that an accrual right now would debit
    pub amount: Collateral,
    /// Time the position last accrued
    pub last_funding_time: Timestamp,
}

//! Data types for the liquidity pool contract.
//!
//! The pool is the pooled counterparty: it receives premiums and funding,
//! pays out exercises and sell-backs, and earmarks the engine subsidy as
//! withdrawal-blocked capital. Its invariant is
//! `total_assets >= reserved_subsidy` at all times.
use crate::number::Collateral;
use crate::prelude::RawAddr;
use crate::token::TokenInit;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Event};
use cw20::Cw20ReceiveMsg;

/// The one-time instantiation message.
#[cw_serde]
pub struct InstantiateMsg {
    /// Contract owner; defaults to the instantiation sender
    pub owner: Option<RawAddr>,
    /// The quote asset held by the pool
    pub token: TokenInit,
}

/// Execute message for the pool contract.
#[cw_serde]
pub enum ExecuteMsg {
    /// cw20 receive hook; the embedded message must be a fund-carrying
    /// variant
    Receive(Cw20ReceiveMsg),

    /// Wire the market contract. Owner-only, one-shot.
    SetMarket {
        /// The market address
        market: RawAddr,
    },

    /// Provide liquidity. Funds attached.
    Deposit {},

    /// Earmark part of the pool's capital as the engine subsidy.
    /// Owner-only; cannot exceed current assets.
    ReserveSubsidy {
        /// Amount to reserve, quote units (WAD)
        amount: Collateral,
    },

    /// Book an option premium. Market-only, funds attached.
    ReceivePremium {},

    /// Book a funding payment. Market-only, funds attached.
    ReceiveFunding {},

    /// Pay out of the pool and book the amount against the reserved
    /// subsidy (saturating). Market-only.
    RecordLoss {
        /// Receiver of the payout
        recipient: RawAddr,
        /// Amount to pay, quote units (WAD)
        amount: Collateral,
    },
}

/// Query message for the pool contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Quote-asset balance held by the pool
    #[returns(Collateral)]
    TotalAssets {},

    /// Remaining reserved subsidy
    #[returns(Collateral)]
    MaxSubsidy {},

    /// Cumulative cash-flow counters
    #[returns(StatsResp)]
    Stats {},
}

/// Response for [QueryMsg::Stats].
#[cw_serde]
#[derive(Default)]
pub struct StatsResp {
    /// Liquidity deposited over the pool's lifetime
    pub deposits: Collateral,
    /// Premiums received over the pool's lifetime
    pub premium_received: Collateral,
    /// Funding received over the pool's lifetime
    pub funding_received: Collateral,
    /// Losses paid out over the pool's lifetime
    pub losses_paid: Collateral,
    /// Capital currently earmarked as engine subsidy
    pub reserved_subsidy: Collateral,
}

/// A premium arrived from the market.
#[derive(Debug)]
pub struct PremiumReceivedEvent {
    /// Amount received
    pub amount: Collateral,
}

impl From<PremiumReceivedEvent> for Event {
    fn from(src: PremiumReceivedEvent) -> Self {
        Event::new("premium-received").add_attribute("amount", src.amount.to_string())
    }
}

/// A funding payment arrived from the market.
#[derive(Debug)]
pub struct FundingReceivedEvent {
    /// Amount received
    pub amount: Collateral,
}

impl From<FundingReceivedEvent> for Event {
    fn from(src: FundingReceivedEvent) -> Self {
        Event::new("funding-received").add_attribute("amount", src.amount.to_string())
    }
}

/// The pool paid out and reduced its reserved subsidy.
#[derive(Debug)]
pub struct LossRecordedEvent {
    /// Receiver of the payout
    pub recipient: Addr,
    /// Amount paid
    pub amount: Collateral,
}

impl From<LossRecordedEvent> for Event {
    fn from(src: LossRecordedEvent) -> Self {
        Event::new("loss-recorded").add_attributes(vec![
            ("recipient", src.recipient.to_string()),
            ("amount", src.amount.to_string()),
        ])
    }
}

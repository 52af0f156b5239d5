//! Interface of the external price feed aggregator.
//!
//! The feed reports rounds in the familiar aggregator shape: a raw integer
//! answer at a fixed decimal scale (reference feeds use 8, scaled by `10^10`
//! to reach WAD at the adapter), plus the round bookkeeping the staleness
//! checks need.
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Int128, Timestamp};

/// Query message understood by any compatible aggregator.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// The most recent round
    #[returns(RoundDataResp)]
    LatestRoundData {},

    /// Decimal places of the raw answers
    #[returns(u32)]
    Decimals {},
}

/// One aggregator round.
#[cw_serde]
pub struct RoundDataResp {
    /// Monotonically increasing round counter
    pub round_id: u64,
    /// Raw price answer at the feed's decimal scale; non-positive answers
    /// are invalid
    pub answer: Int128,
    /// When the round was opened
    pub started_at: Timestamp,
    /// When the round was last updated; drives the staleness check
    pub updated_at: Timestamp,
    /// The round in which the answer was computed. An answer carried over
    /// from an earlier round (`answered_in_round < round_id`) is stale.
    pub answered_in_round: u64,
}

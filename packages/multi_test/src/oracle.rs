// A mock price feed aggregator for testing, flattened into one file.
// It answers the same round-data interface the market's oracle adapter
// consumes, with owner-settable prices and raw round control for
// staleness scenarios.

use anyhow::{anyhow, Result};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{
    Addr, Decimal256, Deps, DepsMut, Env, Event, Int128, MessageInfo, QueryResponse, Response,
    Timestamp, Uint256,
};
use cw2::set_contract_version;
use cw_storage_plus::Item;
use everopt::contracts::feed::{QueryMsg as FeedQueryMsg, RoundDataResp};
use everopt::prelude::QueryResultExt;

pub const CONTRACT_NAME: &str = "everopt:mock-oracle";
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const OWNER: Item<Addr> = Item::new("owner");
pub const ROUND: Item<RoundDataResp> = Item::new("round");

/// Decimal places of the mock feed's raw answers.
pub const FEED_DECIMALS: u32 = 8;

#[cw_serde]
pub struct InstantiateMsg {
    /// the owner of the contract who can push new rounds.
    /// if not set, then it will be the instantiator
    pub owner: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Publish a new round at the given price
    SetPrice {
        /// The new price value
        price: Decimal256,
        /// Optional timestamp for the round, independent of block time
        timestamp: Option<Timestamp>,
    },

    /// Publish a raw round verbatim, for staleness scenarios
    SetRoundData {
        /// The full round
        round: RoundDataResp,
    },
}

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = msg
        .owner
        .as_ref()
        .map(|owner| deps.api.addr_validate(owner))
        .transpose()?
        .unwrap_or(info.sender);

    OWNER.save(deps.storage, &owner)?;

    Ok(
        Response::new().add_event(Event::new("instantiation").add_attributes([
            ("owner", owner.as_str()),
            ("contract_name", CONTRACT_NAME),
            ("contract_version", CONTRACT_VERSION),
        ])),
    )
}

pub fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> Result<Response> {
    // all execution messages require the sender to be the owner
    let owner = OWNER.load(deps.storage)?;
    if info.sender != owner {
        return Err(anyhow!("unauthorized, owner is {owner}"));
    }

    let round = match msg {
        ExecuteMsg::SetPrice { price, timestamp } => {
            let round_id = ROUND
                .may_load(deps.storage)?
                .map(|round| round.round_id + 1)
                .unwrap_or(1);
            let timestamp = timestamp.unwrap_or(env.block.time);
            RoundDataResp {
                round_id,
                answer: decimal_to_raw(price)?,
                started_at: timestamp,
                updated_at: timestamp,
                answered_in_round: round_id,
            }
        }
        ExecuteMsg::SetRoundData { round } => round,
    };
    ROUND.save(deps.storage, &round)?;

    Ok(Response::new().add_event(
        Event::new("round").add_attributes([
            ("round-id", round.round_id.to_string()),
            ("answer", round.answer.to_string()),
        ]),
    ))
}

pub fn query(deps: Deps, _env: Env, msg: FeedQueryMsg) -> Result<QueryResponse> {
    match msg {
        FeedQueryMsg::LatestRoundData {} => ROUND
            .may_load(deps.storage)?
            .ok_or_else(|| anyhow!("no round published yet"))?
            .query_result(),
        FeedQueryMsg::Decimals {} => FEED_DECIMALS.query_result(),
    }
}

/// Truncate a WAD price down to the feed's raw 8-decimal representation.
fn decimal_to_raw(price: Decimal256) -> Result<Int128> {
    let divisor = Uint256::from_u128(10).pow(18 - FEED_DECIMALS);
    let raw = price.atomics().checked_div(divisor)?;
    let raw = cosmwasm_std::Uint128::try_from(raw)?.u128();
    Ok(Int128::new(i128::try_from(raw)?))
}

use crate::state::{
    config::{config_init, update_config},
    buckets::grid_init,
    owner_init,
    position::{get_position, positions_init},
    token_init,
};

use crate::prelude::*;
#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{from_json, Addr, Deps, DepsMut, Env, MessageInfo, QueryResponse, Response};
use cw2::set_contract_version;
use everopt::contracts::market::entry::InstantiateMsg;
use semver::Version;

// version info for migration info
const CONTRACT_NAME: &str = "everopt:market";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Latch against reentry through token or pool hook callbacks.
const REENTRANCY: Item<bool> = Item::new(namespace::REENTRANCY);

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    InstantiateMsg {
        owner,
        pool,
        position_token,
        feed,
        token,
        grid,
        config,
    }: InstantiateMsg,
) -> Result<Response> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = owner
        .map(|owner| owner.validate(deps.api))
        .transpose()?
        .unwrap_or(info.sender);
    owner_init(deps.storage, &owner)?;

    let (feed, feed_decimals) = match feed {
        Some((feed, decimals)) => (Some(feed.validate(deps.api)?), decimals),
        None => (None, 0),
    };
    let initial = Config::new(
        pool.validate(deps.api)?,
        position_token.validate(deps.api)?,
        feed,
        feed_decimals,
    );
    config_init(deps.api, deps.storage, initial, config)?;

    token_init(deps.storage, &deps.querier, deps.api, token)?;
    grid_init(deps.storage, &grid)?;
    positions_init(deps.storage)?;

    let (state, ctx) = StateContext::new(deps, env)?;
    ctx.into_response(&state)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> Result<Response> {
    let (state, mut ctx) = StateContext::new(deps, env)?;

    opt_ensure!(
        !REENTRANCY.may_load(ctx.storage)?.unwrap_or(false),
        ErrorId::Reentrancy,
        ErrorDomain::Market,
        "a mutating entry point is already in progress"
    );
    REENTRANCY.save(ctx.storage, &true)?;

    // Semi-parse the message to determine the inner message/sender
    // (relevant for CW20s) and any quote units sent into the contract
    let (sender, funds, msg) = parse_message_info(&state, &mut ctx, info, msg)?;

    if state.config.paused {
        match msg {
            ExecuteMsg::Owner(_) => {}
            _ => opt_bail!(
                ErrorId::Paused,
                ErrorDomain::Market,
                "the market is paused"
            ),
        }
    }

    match msg {
        ExecuteMsg::Receive(_) => opt_bail!(
            ErrorId::Cw20Funds,
            ErrorDomain::Market,
            "nested receive messages are not accepted"
        ),

        ExecuteMsg::Owner(owner_msg) => {
            state.assert_owner(ctx.storage, &sender)?;
            ensure_no_funds(&funds)?;
            match owner_msg {
                ExecuteOwnerMsg::ConfigUpdate { update } => {
                    let mut config = state.config.clone();
                    update_config(&mut config, state.api, ctx.storage, update)?;
                }
                ExecuteOwnerMsg::SetPriceBounds { root } => {
                    state.set_price_bounds(&mut ctx, root)?;
                }
            }
        }

        ExecuteMsg::InitializeEngine { subsidy, sigma } => {
            state.assert_owner(ctx.storage, &sender)?;
            ensure_no_funds(&funds)?;
            state.initialize_engine(&mut ctx, subsidy, sigma)?;
        }

        ExecuteMsg::Buy {
            kind,
            strike,
            size,
            prefund,
        } => {
            state.buy(&mut ctx, &sender, funds, kind, strike, size, prefund)?;
        }

        ExecuteMsg::Sell { id, size } => {
            ensure_no_funds(&funds)?;
            state.sell(&mut ctx, &sender, id, size)?;
        }

        ExecuteMsg::Exercise { id } => {
            ensure_no_funds(&funds)?;
            state.exercise(&mut ctx, &sender, id)?;
        }

        ExecuteMsg::DepositFunding { id } => {
            state.deposit_funding(&mut ctx, &sender, funds, id)?;
        }

        ExecuteMsg::AccrueFunding { id } => {
            ensure_no_funds(&funds)?;
            state.accrue_funding(&mut ctx, id)?;
        }

        ExecuteMsg::Liquidate { id } => {
            ensure_no_funds(&funds)?;
            state.liquidate(&mut ctx, &sender, id)?;
        }

        ExecuteMsg::Recenter { new_center } => {
            ensure_no_funds(&funds)?;
            state.recenter(&mut ctx, new_center)?;
        }

        ExecuteMsg::VerifyAndSetCost { cost, shares } => {
            ensure_no_funds(&funds)?;
            state.verify_and_set_cost(&mut ctx, cost, &shares)?;
        }
    }

    REENTRANCY.save(ctx.storage, &false)?;
    ctx.into_response(&state)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<QueryResponse> {
    let (state, store) = State::new(deps, env)?;

    match msg {
        QueryMsg::Config {} => state.config.query_result(),
        QueryMsg::Buckets {} => state.buckets_resp(store)?.query_result(),
        QueryMsg::Bucket { index } => state.bucket_resp(store, index)?.query_result(),
        QueryMsg::BucketIndex { price } => {
            state.grid(store)?.index_of(price)?.query_result()
        }
        QueryMsg::SpotPrice {} => state.spot_price(store)?.query_result(),
        QueryMsg::NeedsRebalance {} => state.needs_rebalance(store).query_result(),
        QueryMsg::EngineState {} => state.engine_state_resp(store)?.query_result(),
        QueryMsg::QuoteBuy { kind, strike, size } => {
            let preview = state.trade_preview(store, kind, strike, size, true)?;
            everopt::contracts::market::entry::QuoteResp {
                amount: preview.amount,
            }
            .query_result()
        }
        QueryMsg::QuoteSell { kind, strike, size } => {
            let preview = state.trade_preview(store, kind, strike, size, false)?;
            everopt::contracts::market::entry::QuoteResp {
                amount: preview.amount,
            }
            .query_result()
        }
        QueryMsg::RiskNeutralPrices {} => everopt::contracts::market::entry::RiskNeutralResp {
            prices: state.risk_neutral_prices(store)?,
        }
        .query_result(),
        QueryMsg::ImpliedDistribution {} => {
            everopt::contracts::market::entry::ImpliedDistributionResp {
                midpoints: state.grid(store)?.midpoints()?,
                prices: state.risk_neutral_prices(store)?,
            }
            .query_result()
        }
        QueryMsg::MarkPrice { kind, strike } => {
            state.mark_price(store, kind, strike)?.query_result()
        }
        QueryMsg::Intrinsic { kind, strike } => {
            state.intrinsic(store, kind, strike)?.query_result()
        }
        QueryMsg::FundingPerSecond { kind, strike, size } => state
            .funding_per_second(store, kind, strike, size)?
            .query_result(),
        QueryMsg::Position { id } => state.position_resp(store, id)?.query_result(),
        QueryMsg::Positions { owner } => {
            let owner = owner.validate(state.api)?;
            state.positions_resp(store, &owner)?.query_result()
        }
        QueryMsg::PendingFunding { id } => state.pending_funding_resp(store, id)?.query_result(),
        QueryMsg::IsLiquidatable { id } => {
            let pos = get_position(store, id)?;
            state.is_liquidatable(store, &pos)?.query_result()
        }
        QueryMsg::PriceBounds {} => state.price_bounds(store)?.query_result(),
        QueryMsg::VerifyPriceBound {
            kind,
            strike,
            bid,
            ask,
            proof,
        } => state
            .verify_price_bound(store, kind, strike, bid, ask, &proof)?
            .query_result(),
    }
}

/// Migration entry point, kept minimal: same contract name and a
/// non-decreasing version.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(
    deps: DepsMut,
    _env: Env,
    _msg: everopt::contracts::market::entry::MigrateMsg,
) -> Result<Response> {
    let old = cw2::get_contract_version(deps.storage)?;
    opt_ensure!(
        old.contract == CONTRACT_NAME,
        ErrorId::InvalidConfig,
        ErrorDomain::Market,
        "cannot migrate from {}",
        old.contract
    );
    let old_version: Version = old.version.parse()?;
    let new_version: Version = CONTRACT_VERSION.parse()?;
    opt_ensure!(
        old_version <= new_version,
        ErrorId::InvalidConfig,
        ErrorDomain::Market,
        "cannot downgrade from {old_version} to {new_version}"
    );
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new())
}

fn ensure_no_funds(funds: &Collateral) -> Result<()> {
    opt_ensure!(
        funds.is_zero(),
        ErrorId::UnnecessaryFunds,
        ErrorDomain::Market,
        "this entry point does not accept funds"
    );
    Ok(())
}

/// Unwrap a CW20 receive hook into its inner message, or read native funds
/// off the message itself.
fn parse_message_info(
    state: &State,
    ctx: &mut StateContext,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<(Addr, Collateral, ExecuteMsg)> {
    let token = state.get_token(ctx.storage)?;

    match msg {
        ExecuteMsg::Receive(receive) => {
            match token {
                Token::Cw20 { addr, .. } => {
                    let expected = addr.validate(state.api)?;
                    opt_ensure!(
                        info.sender == expected,
                        ErrorId::Auth,
                        ErrorDomain::Market,
                        "receive hooks must come from the quote asset {expected}"
                    );
                }
                Token::Native { .. } => opt_bail!(
                    ErrorId::NativeFunds,
                    ErrorDomain::Market,
                    "the quote asset is native, cw20 receive hooks are not accepted"
                ),
            }
            opt_ensure!(
                info.funds.is_empty(),
                ErrorId::UnnecessaryFunds,
                ErrorDomain::Market,
                "native funds on a cw20 receive hook"
            );

            let sender = state.api.addr_validate(&receive.sender)?;
            let funds = Collateral::from_decimal256(token.from_u128(receive.amount.u128())?);
            let inner: ExecuteMsg = from_json(&receive.msg)?;
            Ok((sender, funds, inner))
        }
        msg => {
            let funds = token.amount_from_funds(&info.funds)?;
            Ok((info.sender, funds, msg))
        }
    }
}

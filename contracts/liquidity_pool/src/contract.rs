use crate::state::{assert_market, assert_owner, MARKET_ADDR, OWNER_ADDR, STATS, TOKEN};
#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    from_json, Addr, Deps, DepsMut, Env, Event, MessageInfo, QueryResponse, Response,
};
use cw2::set_contract_version;
use everopt::contracts::liquidity_pool::{
    ExecuteMsg, FundingReceivedEvent, InstantiateMsg, LossRecordedEvent, PremiumReceivedEvent,
    QueryMsg,
};
use everopt::prelude::*;

const CONTRACT_NAME: &str = "everopt:liquidity-pool";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    InstantiateMsg { owner, token }: InstantiateMsg,
) -> Result<Response> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = owner
        .map(|owner| owner.validate(deps.api))
        .transpose()?
        .unwrap_or(info.sender);
    OWNER_ADDR.save(deps.storage, &owner)?;

    let token = Token::from_init(&deps.querier, deps.api, token)?;
    TOKEN.save(deps.storage, &token)?;
    STATS.save(deps.storage, &Default::default())?;

    Ok(Response::new())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> Result<Response> {
    let token = TOKEN.load(deps.storage)?;

    // unwrap a cw20 receive hook into its inner message
    let (sender, funds, msg) = match msg {
        ExecuteMsg::Receive(receive) => {
            match &token {
                Token::Cw20 { addr, .. } => {
                    let expected = addr.validate(deps.api)?;
                    opt_ensure!(
                        info.sender == expected,
                        ErrorId::Auth,
                        ErrorDomain::LiquidityPool,
                        "receive hooks must come from the quote asset {expected}"
                    );
                }
                Token::Native { .. } => opt_bail!(
                    ErrorId::NativeFunds,
                    ErrorDomain::LiquidityPool,
                    "the quote asset is native, cw20 receive hooks are not accepted"
                ),
            }
            let sender = deps.api.addr_validate(&receive.sender)?;
            let funds = Collateral::from_decimal256(token.from_u128(receive.amount.u128())?);
            let inner: ExecuteMsg = from_json(&receive.msg)?;
            (sender, funds, inner)
        }
        msg => {
            let funds = token.amount_from_funds(&info.funds)?;
            (info.sender, funds, msg)
        }
    };

    let mut resp = Response::new();
    let mut stats = STATS.load(deps.storage)?;

    match msg {
        ExecuteMsg::Receive(_) => opt_bail!(
            ErrorId::Cw20Funds,
            ErrorDomain::LiquidityPool,
            "nested receive messages are not accepted"
        ),

        ExecuteMsg::SetMarket { market } => {
            assert_owner(deps.storage, &sender)?;
            opt_ensure!(
                MARKET_ADDR.may_load(deps.storage)?.is_none(),
                ErrorId::AlreadyInitialized,
                ErrorDomain::LiquidityPool,
                "the market is already wired"
            );
            let market = market.validate(deps.api)?;
            MARKET_ADDR.save(deps.storage, &market)?;
            resp = resp.add_event(Event::new("market-set").add_attribute("market", market));
        }

        ExecuteMsg::Deposit {} => {
            ensure_funds(funds)?;
            stats.deposits = stats.deposits.checked_add(funds)?;
            resp = resp
                .add_event(Event::new("deposit").add_attribute("amount", funds.to_string()));
        }

        ExecuteMsg::ReserveSubsidy { amount } => {
            assert_owner(deps.storage, &sender)?;
            let assets = total_assets(deps.as_ref(), &env, &token)?;
            opt_ensure!(
                amount <= assets,
                ErrorId::InsufficientAvailable,
                ErrorDomain::LiquidityPool,
                "cannot reserve {amount} out of {assets} assets"
            );
            stats.reserved_subsidy = amount;
            resp = resp.add_event(
                Event::new("subsidy-reserved").add_attribute("amount", amount.to_string()),
            );
        }

        ExecuteMsg::ReceivePremium {} => {
            assert_market(deps.storage, &sender)?;
            ensure_funds(funds)?;
            stats.premium_received = stats.premium_received.checked_add(funds)?;
            resp = resp.add_event(PremiumReceivedEvent { amount: funds });
        }

        ExecuteMsg::ReceiveFunding {} => {
            assert_market(deps.storage, &sender)?;
            ensure_funds(funds)?;
            stats.funding_received = stats.funding_received.checked_add(funds)?;
            resp = resp.add_event(FundingReceivedEvent { amount: funds });
        }

        ExecuteMsg::RecordLoss { recipient, amount } => {
            assert_market(deps.storage, &sender)?;
            let amount = NonZero::new(amount).ok_or_else(|| {
                opt_anyhow!(
                    ErrorId::InsufficientAvailable,
                    ErrorDomain::LiquidityPool,
                    "cannot record a zero loss"
                )
            })?;
            let assets = total_assets(deps.as_ref(), &env, &token)?;
            opt_ensure!(
                amount.raw() <= assets,
                ErrorId::InsufficientAvailable,
                ErrorDomain::LiquidityPool,
                "loss {amount} exceeds the pool's {assets} assets"
            );

            let recipient = recipient.validate(deps.api)?;
            if let Some(msg) = token.into_transfer_msg(&recipient, amount)? {
                resp = resp.add_message(msg);
            }

            // reserved subsidy is consumed first, saturating at zero
            stats.reserved_subsidy = stats
                .reserved_subsidy
                .checked_sub(amount.raw())
                .unwrap_or_default();
            stats.losses_paid = stats.losses_paid.checked_add(amount.raw())?;
            resp = resp.add_event(LossRecordedEvent {
                recipient,
                amount: amount.raw(),
            });
        }
    }

    STATS.save(deps.storage, &stats)?;
    Ok(resp)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<QueryResponse> {
    let token = TOKEN.load(deps.storage)?;
    match msg {
        QueryMsg::TotalAssets {} => total_assets(deps, &env, &token)?.query_result(),
        QueryMsg::MaxSubsidy {} => STATS.load(deps.storage)?.reserved_subsidy.query_result(),
        QueryMsg::Stats {} => STATS.load(deps.storage)?.query_result(),
    }
}

fn total_assets(deps: Deps, env: &Env, token: &Token) -> Result<Collateral> {
    token.query_balance(&deps.querier, &env.contract.address)
}

fn ensure_funds(funds: Collateral) -> Result<()> {
    opt_ensure!(
        !funds.is_zero(),
        ErrorId::MissingFunds,
        ErrorDomain::LiquidityPool,
        "this entry point requires attached funds"
    );
    Ok(())
}

use crate::state::{assert_minter, assert_owner, BALANCES, MINTER, OWNER_ADDR, TOKEN_SUPPLY};
#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{Deps, DepsMut, Env, Event, MessageInfo, QueryResponse, Response};
use cw2::set_contract_version;
use everopt::contracts::position_token::{
    encode_token_id, BalanceResp, ExecuteMsg, InstantiateMsg, QueryMsg, SupplyResp,
};
use everopt::prelude::*;

const CONTRACT_NAME: &str = "everopt:position-token";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    InstantiateMsg { owner }: InstantiateMsg,
) -> Result<Response> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = owner
        .map(|owner| owner.validate(deps.api))
        .transpose()?
        .unwrap_or(info.sender);
    OWNER_ADDR.save(deps.storage, &owner)?;

    Ok(Response::new())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(deps: DepsMut, _env: Env, info: MessageInfo, msg: ExecuteMsg) -> Result<Response> {
    match msg {
        ExecuteMsg::SetMinter { minter } => {
            assert_owner(deps.storage, &info.sender)?;
            opt_ensure!(
                MINTER.may_load(deps.storage)?.is_none(),
                ErrorId::AlreadyInitialized,
                ErrorDomain::PositionToken,
                "the minter is already wired"
            );
            let minter = minter.validate(deps.api)?;
            MINTER.save(deps.storage, &minter)?;

            Ok(Response::new()
                .add_event(Event::new("minter-set").add_attribute("minter", minter)))
        }

        ExecuteMsg::Mint {
            owner,
            kind,
            strike,
            amount,
        } => {
            assert_minter(deps.storage, &info.sender)?;
            let owner = owner.validate(deps.api)?;
            let token_id = encode_token_id(kind, strike)?.to_string();

            let balance = BALANCES
                .may_load(deps.storage, (&owner, token_id.clone()))?
                .unwrap_or_default()
                .checked_add(amount)?;
            BALANCES.save(deps.storage, (&owner, token_id.clone()), &balance)?;

            let supply = TOKEN_SUPPLY
                .may_load(deps.storage, token_id.clone())?
                .unwrap_or_default()
                .checked_add(amount)?;
            TOKEN_SUPPLY.save(deps.storage, token_id.clone(), &supply)?;

            Ok(Response::new().add_event(
                Event::new("mint").add_attributes(vec![
                    ("owner", owner.to_string()),
                    ("token-id", token_id),
                    ("amount", amount.to_string()),
                ]),
            ))
        }

        ExecuteMsg::Burn {
            owner,
            kind,
            strike,
            amount,
        } => {
            assert_minter(deps.storage, &info.sender)?;
            let owner = owner.validate(deps.api)?;
            let token_id = encode_token_id(kind, strike)?.to_string();

            let balance = BALANCES
                .may_load(deps.storage, (&owner, token_id.clone()))?
                .unwrap_or_default();
            let balance = balance.checked_sub(amount).map_err(|_| {
                opt_anyhow!(
                    ErrorId::InsufficientAvailable,
                    ErrorDomain::PositionToken,
                    "burning {amount} exceeds the balance {balance} of {owner}"
                )
            })?;
            if balance.is_zero() {
                BALANCES.remove(deps.storage, (&owner, token_id.clone()));
            } else {
                BALANCES.save(deps.storage, (&owner, token_id.clone()), &balance)?;
            }

            let supply = TOKEN_SUPPLY
                .may_load(deps.storage, token_id.clone())?
                .unwrap_or_default()
                .checked_sub(amount)?;
            if supply.is_zero() {
                TOKEN_SUPPLY.remove(deps.storage, token_id.clone());
            } else {
                TOKEN_SUPPLY.save(deps.storage, token_id.clone(), &supply)?;
            }

            Ok(Response::new().add_event(
                Event::new("burn").add_attributes(vec![
                    ("owner", owner.to_string()),
                    ("token-id", token_id),
                    ("amount", amount.to_string()),
                ]),
            ))
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> Result<QueryResponse> {
    match msg {
        QueryMsg::Balance {
            owner,
            kind,
            strike,
        } => {
            let owner = owner.validate(deps.api)?;
            let token_id = encode_token_id(kind, strike)?;
            let amount = BALANCES
                .may_load(deps.storage, (&owner, token_id.to_string()))?
                .unwrap_or_default();
            BalanceResp { token_id, amount }.query_result()
        }
        QueryMsg::Supply { kind, strike } => {
            let token_id = encode_token_id(kind, strike)?;
            let amount = TOKEN_SUPPLY
                .may_load(deps.storage, token_id.to_string())?
                .unwrap_or_default();
            SupplyResp { token_id, amount }.query_result()
        }
    }
}

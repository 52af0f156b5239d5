#![deny(clippy::as_conversions)]

pub mod market_wrapper;
pub mod oracle;
pub mod response;
pub mod time;

use anyhow::{bail, Result};
use cosmwasm_std::{
    from_json, Addr, Binary, Coin, Deps, DepsMut, Empty, Env, MessageInfo, QueryResponse, Reply,
    Response, Uint128,
};
use cw_multi_test::{App, BankSudo, Contract, SudoMsg};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Denom used as the quote asset in tests, with 6 decimal places like the
/// reference stablecoins.
pub const TEST_DENOM: &str = "uusdq";

/// Quote-asset decimal places in tests.
pub const TEST_DECIMALS: u8 = 6;

/**
 * Base app for mocking the options protocol
 */
pub struct EveroptApp {
    code_ids: HashMap<EveroptContract, u64>,
    app: App,
    pub log_block_time_changes: bool,
}

impl Deref for EveroptApp {
    type Target = App;
    fn deref(&self) -> &Self::Target {
        &self.app
    }
}

impl DerefMut for EveroptApp {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.app
    }
}

/**
 * Identifies a protocol contract
 */
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EveroptContract {
    Market,
    LiquidityPool,
    PositionToken,
    Oracle,
}

impl EveroptApp {
    pub fn new_cell() -> Result<Rc<RefCell<Self>>> {
        Ok(Rc::new(RefCell::new(Self::new()?)))
    }

    pub(crate) fn new() -> Result<Self> {
        let mut app = App::default();

        let mut code_ids = HashMap::new();
        code_ids.insert(EveroptContract::Market, app.store_code(contract_market()));
        code_ids.insert(
            EveroptContract::LiquidityPool,
            app.store_code(contract_liquidity_pool()),
        );
        code_ids.insert(
            EveroptContract::PositionToken,
            app.store_code(contract_position_token()),
        );
        code_ids.insert(EveroptContract::Oracle, app.store_code(contract_oracle()));

        Ok(EveroptApp {
            code_ids,
            app,
            log_block_time_changes: false,
        })
    }

    pub(crate) fn code_id(&self, contract: EveroptContract) -> u64 {
        self.code_ids[&contract]
    }

    /// Mint quote units (raw micro denomination) to the given address.
    pub fn mint_quote(&mut self, recipient: &Addr, amount: u128) -> Result<()> {
        self.app
            .sudo(SudoMsg::Bank(BankSudo::Mint {
                to_address: recipient.to_string(),
                amount: vec![Coin {
                    denom: TEST_DENOM.to_string(),
                    amount: Uint128::new(amount),
                }],
            }))
            .map(|_| ())
    }
}

pub(crate) fn contract_market() -> Box<dyn Contract<Empty>> {
    Box::new(LocalContractWrapper::new(
        market::contract::instantiate,
        market::contract::execute,
        market::contract::query,
    ))
}

pub(crate) fn contract_liquidity_pool() -> Box<dyn Contract<Empty>> {
    Box::new(LocalContractWrapper::new(
        liquidity_pool::contract::instantiate,
        liquidity_pool::contract::execute,
        liquidity_pool::contract::query,
    ))
}

pub(crate) fn contract_position_token() -> Box<dyn Contract<Empty>> {
    Box::new(LocalContractWrapper::new(
        position_token::contract::instantiate,
        position_token::contract::execute,
        position_token::contract::query,
    ))
}

pub(crate) fn contract_oracle() -> Box<dyn Contract<Empty>> {
    Box::new(LocalContractWrapper::new(
        oracle::instantiate,
        oracle::execute,
        oracle::query,
    ))
}

// struct to satisfy the `Contract` trait
pub(crate) struct LocalContractWrapper<
    Instantiate,
    InstantiateMsg,
    Execute,
    ExecuteMsg,
    Query,
    QueryMsg,
> where
    Instantiate: Fn(DepsMut, Env, MessageInfo, InstantiateMsg) -> Result<Response> + 'static,
    Execute: Fn(DepsMut, Env, MessageInfo, ExecuteMsg) -> Result<Response> + 'static,
    Query: Fn(Deps, Env, QueryMsg) -> Result<QueryResponse> + 'static,
    InstantiateMsg: Serialize + DeserializeOwned + Debug + 'static,
    ExecuteMsg: Serialize + DeserializeOwned + Debug + 'static,
    QueryMsg: Serialize + DeserializeOwned + 'static,
{
    instantiate: Instantiate,
    execute: Execute,
    query: Query,
    reply: Option<ReplyFn>,
    instantiate_msg: PhantomData<InstantiateMsg>,
    execute_msg: PhantomData<ExecuteMsg>,
    query_msg: PhantomData<QueryMsg>,
}

type ReplyFn = fn(DepsMut, Env, Reply) -> Result<Response>;

impl<Instantiate, InstantiateMsg, Execute, ExecuteMsg, Query, QueryMsg>
    LocalContractWrapper<Instantiate, InstantiateMsg, Execute, ExecuteMsg, Query, QueryMsg>
where
    Instantiate: Fn(DepsMut, Env, MessageInfo, InstantiateMsg) -> Result<Response> + 'static,
    Execute: Fn(DepsMut, Env, MessageInfo, ExecuteMsg) -> Result<Response> + 'static,
    Query: Fn(Deps, Env, QueryMsg) -> Result<QueryResponse> + 'static,
    InstantiateMsg: Serialize + DeserializeOwned + Debug + 'static,
    ExecuteMsg: Serialize + DeserializeOwned + Debug + 'static,
    QueryMsg: Serialize + DeserializeOwned + 'static,
{
    pub fn new(instantiate: Instantiate, execute: Execute, query: Query) -> Self {
        Self {
            instantiate,
            execute,
            query,
            reply: None,
            instantiate_msg: PhantomData,
            execute_msg: PhantomData,
            query_msg: PhantomData,
        }
    }
}

impl<Instantiate, InstantiateMsg, Execute, ExecuteMsg, Query, QueryMsg> Contract<Empty, Empty>
    for LocalContractWrapper<Instantiate, InstantiateMsg, Execute, ExecuteMsg, Query, QueryMsg>
where
    Instantiate: Fn(DepsMut, Env, MessageInfo, InstantiateMsg) -> Result<Response> + 'static,
    Execute: Fn(DepsMut, Env, MessageInfo, ExecuteMsg) -> Result<Response> + 'static,
    Query: Fn(Deps, Env, QueryMsg) -> Result<QueryResponse> + 'static,
    InstantiateMsg: Serialize + DeserializeOwned + Debug + 'static,
    ExecuteMsg: Serialize + DeserializeOwned + Debug + 'static,
    QueryMsg: Serialize + DeserializeOwned + 'static,
{
    fn execute(
        &self,
        deps: DepsMut<Empty>,
        env: Env,
        info: MessageInfo,
        msg: Vec<u8>,
    ) -> Result<Response<Empty>> {
        let msg: ExecuteMsg = from_json(&msg)?;
        (self.execute)(deps, env, info, msg)
    }

    fn instantiate(
        &self,
        deps: DepsMut<Empty>,
        env: Env,
        info: MessageInfo,
        msg: Vec<u8>,
    ) -> Result<Response<Empty>> {
        let msg: InstantiateMsg = from_json(&msg)?;
        (self.instantiate)(deps, env, info, msg)
    }

    fn query(&self, deps: Deps<Empty>, env: Env, msg: Vec<u8>) -> Result<Binary> {
        let msg: QueryMsg = from_json(&msg)?;
        (self.query)(deps, env, msg)
    }

    fn sudo(&self, _deps: DepsMut<Empty>, _env: Env, _msg: Vec<u8>) -> Result<Response<Empty>> {
        bail!("sudo not implemented for contract")
    }

    // this returns an error if the contract doesn't implement reply
    fn reply(&self, deps: DepsMut<Empty>, env: Env, reply_data: Reply) -> Result<Response<Empty>> {
        match self.reply {
            Some(reply) => (reply)(deps, env, reply_data),
            None => bail!("reply not implemented for contract"),
        }
    }

    // this returns an error if the contract doesn't implement migrate
    fn migrate(&self, _deps: DepsMut<Empty>, _env: Env, _msg: Vec<u8>) -> Result<Response<Empty>> {
        bail!("migrate not implemented for contract")
    }
}

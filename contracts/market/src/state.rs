// re-exporting
pub(crate) mod buckets;
pub(crate) mod config;
pub(crate) mod engine;
pub(crate) mod funding;
pub mod guard;
pub(crate) mod oracle;
pub(crate) mod position;

use crate::prelude::*;
use cosmwasm_std::{Addr, Api, Deps, DepsMut, Empty, Env, QuerierWrapper, Response, Storage};
use cw2::{get_contract_version, ContractVersion};
use cw_storage_plus::Item;
use once_cell::unsync::OnceCell;
use std::collections::HashMap;

use self::config::load_config;

/// The market owner - kept out of [Config] so a config update can never
/// touch it.
const OWNER_ADDR: Item<Addr> = Item::new(namespace::OWNER_ADDR);

/// The quote asset, resolved at instantiation.
const TOKEN: Item<Token> = Item::new(namespace::TOKEN);

pub(crate) struct State<'a> {
    pub(crate) api: &'a dyn Api,
    pub(crate) env: Env,
    pub(crate) querier: QuerierWrapper<'a, Empty>,
    pub(crate) contract_version: ContractVersion,
    pub(crate) config: Config,

    /// Cache variables
    spot_price_cache: OnceCell<Price>,
    token_cache: OnceCell<Token>,
}

pub(crate) struct StateContext<'a> {
    pub(crate) storage: &'a mut dyn Storage,
    /// Hidden so that it's not possible to generate a Response without dealing with [StateContext::fund_transfers]
    response: ResponseBuilder,
    /// Funds to be transferred to other addresses
    pub(crate) fund_transfers: HashMap<Addr, Collateral>,
}

impl<'a> State<'a> {
    fn new_inner(
        api: &'a dyn Api,
        querier: QuerierWrapper<'a, Empty>,
        env: Env,
        store: &dyn Storage,
    ) -> Result<Self> {
        let contract_version = get_contract_version(store)?;
        let config = load_config(store)?;
        Ok(State {
            api,
            env,
            querier,
            contract_version,
            config,
            spot_price_cache: OnceCell::new(),
            token_cache: OnceCell::new(),
        })
    }

    pub(crate) fn new(deps: Deps<'a>, env: Env) -> Result<(Self, &dyn Storage)> {
        let state = State::new_inner(deps.api, deps.querier, env, deps.storage)?;
        Ok((state, deps.storage))
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.env.block.time
    }

    pub(crate) fn get_token(&self, store: &dyn Storage) -> Result<&Token> {
        self.token_cache
            .get_or_try_init(|| TOKEN.load(store).map_err(|e| e.into()))
    }

    pub(crate) fn assert_owner(&self, store: &dyn Storage, addr: &Addr) -> Result<()> {
        let owner = OWNER_ADDR.load(store)?;
        opt_ensure!(
            *addr == owner,
            ErrorId::Auth,
            ErrorDomain::Market,
            "{addr} is not the market owner"
        );
        Ok(())
    }
}

impl<'a> StateContext<'a> {
    pub(crate) fn new(deps: DepsMut<'a>, env: Env) -> Result<(State<'a>, Self)> {
        let state = State::new_inner(deps.api, deps.querier, env, deps.storage)?;
        let ctx = StateContext {
            storage: deps.storage,
            response: ResponseBuilder::new(state.contract_version.clone()),
            fund_transfers: HashMap::new(),
        };
        Ok((state, ctx))
    }

    pub(crate) fn response_mut(&mut self) -> &mut ResponseBuilder {
        &mut self.response
    }

    /// Queue quote units to be sent to the given address when the response
    /// is built.
    pub(crate) fn queue_transfer(&mut self, recipient: Addr, amount: Collateral) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let entry = self.fund_transfers.entry(recipient).or_default();
        *entry = entry.checked_add(amount)?;
        Ok(())
    }

    pub(crate) fn into_response(mut self, state: &State) -> Result<Response> {
        let token = state.get_token(self.storage)?;
        for (addr, amount) in self.fund_transfers {
            if let Some(amount) = NonZero::new(amount) {
                if let Some(msg) = token.into_transfer_msg(&addr, amount)? {
                    self.response.add_message(msg);
                }
            }
        }

        Ok(self.response.into_response())
    }
}

pub(crate) fn owner_init(store: &mut dyn Storage, owner: &Addr) -> Result<()> {
    OWNER_ADDR.save(store, owner)?;

    Ok(())
}

pub(crate) fn token_init(
    store: &mut dyn Storage,
    querier: &QuerierWrapper,
    api: &dyn Api,
    init: TokenInit,
) -> Result<()> {
    let token = Token::from_init(querier, api, init)?;
    TOKEN.save(store, &token)?;

    Ok(())
}

/*
    High-level concepts:

    1. All executions that go through the market can jump to the next block after
    2. All time jumps move the block height as well

    The basic idea is that it simulates real-world usage; tests which
    require manipulating the underlying machinery at a lower level must do
    so via the app, not the market wrapper.
*/

use crate::oracle::{
    ExecuteMsg as OracleExecuteMsg, InstantiateMsg as OracleInstantiateMsg, FEED_DECIMALS,
};
use crate::response::CosmosResponseExt;
use crate::time::{BlockInfoChange, TimeJump};
use crate::{EveroptApp, EveroptContract, TEST_DECIMALS, TEST_DENOM};
use anyhow::{Context as _, Result};
use cosmwasm_std::{Addr, Coin, Decimal256, Timestamp, Uint128};
use cw_multi_test::{AppResponse, Executor};
use everopt::contracts::feed::RoundDataResp;
use everopt::contracts::liquidity_pool::{
    ExecuteMsg as PoolExecuteMsg, InstantiateMsg as PoolInstantiateMsg,
    QueryMsg as PoolQueryMsg, StatsResp,
};
use everopt::contracts::market::config::ConfigUpdate;
use everopt::contracts::market::entry::{
    BucketsResp, EngineStateResp, GridParams, InstantiateMsg as MarketInstantiateMsg,
    PendingFundingResp, PositionResp, PositionsResp, QuoteResp, RiskNeutralResp,
};
use everopt::contracts::position_token::{
    BalanceResp, ExecuteMsg as TokenExecuteMsg, InstantiateMsg as TokenInstantiateMsg,
    QueryMsg as TokenQueryMsg,
};
use everopt::prelude::*;
use serde::de::DeserializeOwned;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;

/// Spot price every market starts at.
pub const DEFAULT_SPOT: &str = "3000";
/// Engine subsidy every market starts with.
pub const DEFAULT_SUBSIDY: &str = "10000";
/// Liquidity seeded into the pool, quote units.
pub const DEFAULT_POOL_LIQUIDITY: &str = "1000000";

pub struct OptionsMarket {
    // we can have multiple markets per app instance
    // EveroptApp is not thread-safe, however (i.e. it's RefCell not Mutex here)
    app: Rc<RefCell<EveroptApp>>,
    pub addr: Addr,
    pub pool_addr: Addr,
    pub position_token_addr: Addr,
    pub oracle_addr: Addr,
    pub owner: Addr,
    /// When enabled, time will jump by one block on every exec
    pub automatic_time_jump_enabled: bool,
}

impl OptionsMarket {
    pub fn new(app: Rc<RefCell<EveroptApp>>) -> Result<Self> {
        Self::new_custom(app, None)
    }

    /// Spin up a fully wired protocol: oracle, pool, position token and
    /// market, with liquidity deposited, the subsidy reserved and the
    /// engine initialized.
    pub fn new_custom(
        app: Rc<RefCell<EveroptApp>>,
        config: Option<ConfigUpdate>,
    ) -> Result<Self> {
        let owner = app.borrow().api().addr_make("protocol-owner");

        let oracle_addr = {
            let mut app = app.borrow_mut();
            let code_id = app.code_id(EveroptContract::Oracle);
            app.instantiate_contract(
                code_id,
                owner.clone(),
                &OracleInstantiateMsg { owner: None },
                &[],
                "oracle",
                None,
            )?
        };

        let pool_addr = {
            let mut app = app.borrow_mut();
            let code_id = app.code_id(EveroptContract::LiquidityPool);
            app.instantiate_contract(
                code_id,
                owner.clone(),
                &PoolInstantiateMsg {
                    owner: None,
                    token: TokenInit::Native {
                        denom: TEST_DENOM.to_string(),
                        decimal_places: TEST_DECIMALS,
                    },
                },
                &[],
                "liquidity-pool",
                None,
            )?
        };

        let position_token_addr = {
            let mut app = app.borrow_mut();
            let code_id = app.code_id(EveroptContract::PositionToken);
            app.instantiate_contract(
                code_id,
                owner.clone(),
                &TokenInstantiateMsg { owner: None },
                &[],
                "position-token",
                None,
            )?
        };

        let addr = {
            let mut app = app.borrow_mut();
            let code_id = app.code_id(EveroptContract::Market);
            app.instantiate_contract(
                code_id,
                owner.clone(),
                &MarketInstantiateMsg {
                    owner: None,
                    pool: (&pool_addr).into(),
                    position_token: (&position_token_addr).into(),
                    feed: Some(((&oracle_addr).into(), FEED_DECIMALS)),
                    token: TokenInit::Native {
                        denom: TEST_DENOM.to_string(),
                        decimal_places: TEST_DECIMALS,
                    },
                    grid: GridParams {
                        center_price: DEFAULT_SPOT.parse()?,
                        bucket_width: "50".parse()?,
                        num_regular: 64,
                    },
                    config,
                },
                &[],
                "market",
                None,
            )?
        };

        let market = OptionsMarket {
            app,
            addr,
            pool_addr,
            position_token_addr,
            oracle_addr,
            owner: owner.clone(),
            automatic_time_jump_enabled: true,
        };

        market.exec_set_price(DEFAULT_SPOT)?;

        market.app().execute_contract(
            owner.clone(),
            market.pool_addr.clone(),
            &PoolExecuteMsg::SetMarket {
                market: (&market.addr).into(),
            },
            &[],
        )?;
        market.app().execute_contract(
            owner.clone(),
            market.position_token_addr.clone(),
            &TokenExecuteMsg::SetMinter {
                minter: (&market.addr).into(),
            },
            &[],
        )?;

        // seed the pool and back the engine
        let liquidity: Collateral = DEFAULT_POOL_LIQUIDITY.parse()?;
        market.mint_quote(&owner, &liquidity.to_string())?;
        market.app().execute_contract(
            owner.clone(),
            market.pool_addr.clone(),
            &PoolExecuteMsg::Deposit {},
            &coins(&liquidity.to_string())?,
        )?;
        market.app().execute_contract(
            owner.clone(),
            market.pool_addr.clone(),
            &PoolExecuteMsg::ReserveSubsidy {
                amount: DEFAULT_SUBSIDY.parse()?,
            },
            &[],
        )?;
        market.exec(
            &owner,
            &MarketExecuteMsg::InitializeEngine {
                subsidy: DEFAULT_SUBSIDY.parse()?,
                sigma: None,
            },
            &[],
        )?;

        Ok(market)
    }

    pub fn app(&self) -> RefMut<EveroptApp> {
        self.app.borrow_mut()
    }

    pub fn now(&self) -> Timestamp {
        self.app().block_info().time
    }

    pub fn clone_trader(&self, index: u32) -> Result<Addr> {
        let trader = self.app().api().addr_make(&format!("trader-{index}"));
        // a million quote units of spending money
        self.mint_quote(&trader, "1000000")?;
        Ok(trader)
    }

    /// Mint quote units, given as a decimal string, to an address.
    pub fn mint_quote(&self, recipient: &Addr, amount: &str) -> Result<()> {
        let micro = decimal_to_micro(amount)?;
        self.app().mint_quote(recipient, micro)
    }

    pub fn jump_time(&self, jump: TimeJump) -> Result<()> {
        let change = BlockInfoChange::from_time_jump(jump);
        self.app().update_block(|block| change.apply(block));
        Ok(())
    }

    /// Jump time and immediately publish a fresh oracle round at the given
    /// price, keeping the feed inside its staleness window.
    pub fn jump_time_with_price(&self, jump: TimeJump, price: &str) -> Result<()> {
        self.jump_time(jump)?;
        self.exec_set_price(price)
    }

    pub fn exec_set_price(&self, price: &str) -> Result<()> {
        self.app()
            .execute_contract(
                self.owner.clone(),
                self.oracle_addr.clone(),
                &OracleExecuteMsg::SetPrice {
                    price: price.parse()?,
                    timestamp: None,
                },
                &[],
            )
            .map(|_| ())
    }

    pub fn exec_set_round_data(&self, round: RoundDataResp) -> Result<()> {
        self.app()
            .execute_contract(
                self.owner.clone(),
                self.oracle_addr.clone(),
                &OracleExecuteMsg::SetRoundData { round },
                &[],
            )
            .map(|_| ())
    }

    pub fn exec(
        &self,
        sender: &Addr,
        msg: &MarketExecuteMsg,
        funds: &[Coin],
    ) -> Result<AppResponse> {
        let resp =
            self.app()
                .execute_contract(sender.clone(), self.addr.clone(), msg, funds)?;
        if self.automatic_time_jump_enabled {
            self.jump_time(TimeJump::Blocks(1))?;
        }
        Ok(resp)
    }

    /// Buy an option, attaching the given quote units, and return the new
    /// position's id.
    pub fn exec_buy(
        &self,
        trader: &Addr,
        kind: OptionKind,
        strike: &str,
        size: &str,
        prefund: &str,
        attach: &str,
    ) -> Result<(PositionId, AppResponse)> {
        let resp = self.exec(
            trader,
            &MarketExecuteMsg::Buy {
                kind,
                strike: strike.parse()?,
                size: size.parse()?,
                prefund: prefund.parse()?,
            },
            &coins(attach)?,
        )?;
        let id = resp
            .event_first_attr("option-bought", "pos-id")?
            .parse()
            .context("malformed pos-id attribute")?;
        Ok((id, resp))
    }

    pub fn exec_sell(&self, trader: &Addr, id: PositionId, size: &str) -> Result<AppResponse> {
        self.exec(
            trader,
            &MarketExecuteMsg::Sell {
                id,
                size: size.parse()?,
            },
            &[],
        )
    }

    pub fn exec_exercise(&self, trader: &Addr, id: PositionId) -> Result<AppResponse> {
        self.exec(trader, &MarketExecuteMsg::Exercise { id }, &[])
    }

    pub fn exec_deposit_funding(
        &self,
        trader: &Addr,
        id: PositionId,
        amount: &str,
    ) -> Result<AppResponse> {
        self.exec(
            trader,
            &MarketExecuteMsg::DepositFunding { id },
            &coins(amount)?,
        )
    }

    pub fn exec_accrue_funding(&self, sender: &Addr, id: PositionId) -> Result<AppResponse> {
        self.exec(sender, &MarketExecuteMsg::AccrueFunding { id }, &[])
    }

    pub fn exec_liquidate(&self, sender: &Addr, id: PositionId) -> Result<AppResponse> {
        self.exec(sender, &MarketExecuteMsg::Liquidate { id }, &[])
    }

    pub fn exec_recenter(&self, sender: &Addr, new_center: &str) -> Result<AppResponse> {
        self.exec(
            sender,
            &MarketExecuteMsg::Recenter {
                new_center: new_center.parse()?,
            },
            &[],
        )
    }

    pub fn exec_verify_and_set_cost(
        &self,
        sender: &Addr,
        cost: Number,
        shares: Vec<Number>,
    ) -> Result<AppResponse> {
        self.exec(
            sender,
            &MarketExecuteMsg::VerifyAndSetCost { cost, shares },
            &[],
        )
    }

    pub fn exec_config_update(&self, update: ConfigUpdate) -> Result<AppResponse> {
        self.exec(
            &self.owner.clone(),
            &MarketExecuteMsg::Owner(everopt::contracts::market::entry::ExecuteOwnerMsg::ConfigUpdate {
                update,
            }),
            &[],
        )
    }

    pub fn exec_set_price_bounds(&self, root: Option<String>) -> Result<AppResponse> {
        self.exec(
            &self.owner.clone(),
            &MarketExecuteMsg::Owner(
                everopt::contracts::market::entry::ExecuteOwnerMsg::SetPriceBounds { root },
            ),
            &[],
        )
    }

    pub fn query<T: DeserializeOwned>(&self, msg: &MarketQueryMsg) -> Result<T> {
        self.app()
            .wrap()
            .query_wasm_smart(&self.addr, msg)
            .map_err(|e| e.into())
    }

    pub fn query_quote_buy(&self, kind: OptionKind, strike: &str, size: &str) -> Result<Collateral> {
        let resp: QuoteResp = self.query(&MarketQueryMsg::QuoteBuy {
            kind,
            strike: strike.parse()?,
            size: size.parse()?,
        })?;
        Ok(resp.amount)
    }

    pub fn query_quote_sell(
        &self,
        kind: OptionKind,
        strike: &str,
        size: &str,
    ) -> Result<Collateral> {
        let resp: QuoteResp = self.query(&MarketQueryMsg::QuoteSell {
            kind,
            strike: strike.parse()?,
            size: size.parse()?,
        })?;
        Ok(resp.amount)
    }

    pub fn query_risk_neutral_prices(&self) -> Result<Vec<Decimal256>> {
        let resp: RiskNeutralResp = self.query(&MarketQueryMsg::RiskNeutralPrices {})?;
        Ok(resp.prices)
    }

    pub fn query_engine_state(&self) -> Result<EngineStateResp> {
        self.query(&MarketQueryMsg::EngineState {})
    }

    pub fn query_buckets(&self) -> Result<BucketsResp> {
        self.query(&MarketQueryMsg::Buckets {})
    }

    pub fn query_bucket_index(&self, price: &str) -> Result<u32> {
        self.query(&MarketQueryMsg::BucketIndex {
            price: price.parse()?,
        })
    }

    pub fn query_spot_price(&self) -> Result<Price> {
        self.query(&MarketQueryMsg::SpotPrice {})
    }

    pub fn query_mark_price(&self, kind: OptionKind, strike: &str) -> Result<Price> {
        self.query(&MarketQueryMsg::MarkPrice {
            kind,
            strike: strike.parse()?,
        })
    }

    pub fn query_intrinsic(&self, kind: OptionKind, strike: &str) -> Result<Price> {
        self.query(&MarketQueryMsg::Intrinsic {
            kind,
            strike: strike.parse()?,
        })
    }

    pub fn query_funding_per_second(
        &self,
        kind: OptionKind,
        strike: &str,
        size: &str,
    ) -> Result<Collateral> {
        self.query(&MarketQueryMsg::FundingPerSecond {
            kind,
            strike: strike.parse()?,
            size: size.parse()?,
        })
    }

    pub fn query_position(&self, id: PositionId) -> Result<PositionResp> {
        self.query(&MarketQueryMsg::Position { id })
    }

    pub fn query_positions(&self, owner: &Addr) -> Result<PositionsResp> {
        self.query(&MarketQueryMsg::Positions {
            owner: owner.into(),
        })
    }

    pub fn query_pending_funding(&self, id: PositionId) -> Result<PendingFundingResp> {
        self.query(&MarketQueryMsg::PendingFunding { id })
    }

    pub fn query_is_liquidatable(&self, id: PositionId) -> Result<bool> {
        self.query(&MarketQueryMsg::IsLiquidatable { id })
    }

    pub fn query_pool_stats(&self) -> Result<StatsResp> {
        self.app()
            .wrap()
            .query_wasm_smart(&self.pool_addr, &PoolQueryMsg::Stats {})
            .map_err(|e| e.into())
    }

    pub fn query_pool_total_assets(&self) -> Result<Collateral> {
        self.app()
            .wrap()
            .query_wasm_smart(&self.pool_addr, &PoolQueryMsg::TotalAssets {})
            .map_err(|e| e.into())
    }

    pub fn query_position_token_balance(
        &self,
        owner: &Addr,
        kind: OptionKind,
        strike: &str,
    ) -> Result<BalanceResp> {
        self.app()
            .wrap()
            .query_wasm_smart(
                &self.position_token_addr,
                &TokenQueryMsg::Balance {
                    owner: owner.into(),
                    kind,
                    strike: strike.parse()?,
                },
            )
            .map_err(|e| e.into())
    }

    /// Bank balance of the quote asset, as a decimal.
    pub fn query_quote_balance(&self, addr: &Addr) -> Result<Collateral> {
        let coin = self.app().wrap().query_balance(addr, TEST_DENOM)?;
        Ok(Collateral::from_decimal256(Decimal256::from_atomics(
            coin.amount,
            TEST_DECIMALS.into(),
        )?))
    }
}

/// Native coins for the given decimal amount of the quote asset.
pub fn coins(amount: &str) -> Result<Vec<Coin>> {
    let micro = decimal_to_micro(amount)?;
    if micro == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![Coin {
        denom: TEST_DENOM.to_string(),
        amount: Uint128::new(micro),
    }])
}

fn decimal_to_micro(amount: &str) -> Result<u128> {
    let amount: Collateral = amount.parse()?;
    amount
        .into_number()
        .to_u128_with_precision(TEST_DECIMALS.into())
        .context("quote amount out of range")
}

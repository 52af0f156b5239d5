use cosmwasm_std::Addr;
use cw_storage_plus::Item;
use everopt::contracts::liquidity_pool::StatsResp;
use everopt::prelude::*;

pub(crate) const OWNER_ADDR: Item<Addr> = Item::new(namespace::OWNER_ADDR);
pub(crate) const TOKEN: Item<Token> = Item::new(namespace::TOKEN);
/// Set once through `SetMarket`; the market is the only caller allowed to
/// move pool capital.
pub(crate) const MARKET_ADDR: Item<Addr> = Item::new(namespace::POOL_MARKET_ADDR);
pub(crate) const STATS: Item<StatsResp> = Item::new(namespace::POOL_STATS);

pub(crate) fn assert_owner(store: &dyn Storage, addr: &Addr) -> Result<()> {
    let owner = OWNER_ADDR.load(store)?;
    opt_ensure!(
        *addr == owner,
        ErrorId::Auth,
        ErrorDomain::LiquidityPool,
        "{addr} is not the pool owner"
    );
    Ok(())
}

pub(crate) fn assert_market(store: &dyn Storage, addr: &Addr) -> Result<()> {
    let market = MARKET_ADDR.may_load(store)?.ok_or_else(|| {
        opt_anyhow!(
            ErrorId::NotInitialized,
            ErrorDomain::LiquidityPool,
            "no market has been wired to this pool"
        )
    })?;
    opt_ensure!(
        *addr == market,
        ErrorId::Auth,
        ErrorDomain::LiquidityPool,
        "{addr} is not the wired market"
    );
    Ok(())
}

use cosmwasm_std::{Addr, Decimal256};
use cw_storage_plus::{Item, Map};
use everopt::prelude::*;

pub(crate) const OWNER_ADDR: Item<Addr> = Item::new(namespace::OWNER_ADDR);
/// Set once through `SetMinter`; only the market mints and burns.
pub(crate) const MINTER: Item<Addr> = Item::new(namespace::MINTER);
/// Balances keyed by owner and decimal-encoded token id.
pub(crate) const BALANCES: Map<(&Addr, String), Decimal256> = Map::new(namespace::BALANCES);
/// Total minted size per decimal-encoded token id.
pub(crate) const TOKEN_SUPPLY: Map<String, Decimal256> = Map::new(namespace::TOKEN_SUPPLY);

pub(crate) fn assert_owner(store: &dyn Storage, addr: &Addr) -> Result<()> {
    let owner = OWNER_ADDR.load(store)?;
    opt_ensure!(
        *addr == owner,
        ErrorId::Auth,
        ErrorDomain::PositionToken,
        "{addr} is not the token owner"
    );
    Ok(())
}

pub(crate) fn assert_minter(store: &dyn Storage, addr: &Addr) -> Result<()> {
    let minter = MINTER.may_load(store)?.ok_or_else(|| {
        opt_anyhow!(
            ErrorId::NotInitialized,
            ErrorDomain::PositionToken,
            "no minter has been wired to this token"
        )
    })?;
    opt_ensure!(
        *addr == minter,
        ErrorId::Auth,
        ErrorDomain::PositionToken,
        "{addr} is not the wired minter"
    );
    Ok(())
}

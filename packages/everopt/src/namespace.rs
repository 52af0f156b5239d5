//! This is a centralized location for cw_storage Item storage keys and Map namespaces
#![allow(missing_docs)]

// market
pub const CONFIG: &str = "a";
pub const OWNER_ADDR: &str = "b";
pub const TOKEN: &str = "c";
pub const GRID: &str = "d";
pub const ENGINE_PRIOR: &str = "e";
pub const ENGINE_SHARES: &str = "f";
pub const ENGINE_COST: &str = "g";
pub const ENGINE_UTILITY: &str = "h";
pub const OPEN_POSITIONS: &str = "i";
pub const LAST_POSITION_ID: &str = "j";
pub const POSITIONS_BY_OWNER: &str = "k";
pub const PRICE_BOUNDS_ROOT: &str = "l";
pub const REENTRANCY: &str = "m";

// liquidity pool
pub const POOL_MARKET_ADDR: &str = "n";
pub const POOL_STATS: &str = "o";

// position token
pub const MINTER: &str = "p";
pub const BALANCES: &str = "q";
pub const TOKEN_SUPPLY: &str = "r";

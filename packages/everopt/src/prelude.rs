//! Exports very commonly used items into the prelude glob.
pub use crate::addr::RawAddr;
pub use crate::contracts::market::entry::{
    ExecuteMsg as MarketExecuteMsg, QueryMsg as MarketQueryMsg,
};
pub use crate::contracts::market::position::{OptionKind, Position, PositionId};
pub use crate::error::{error_id_of, ErrorDomain, ErrorId, OptError};
pub use crate::event::CosmwasmEventExt;
pub use crate::namespace;
pub use crate::number::{Collateral, NonZero, Number, Price, Signed, UnsignedDecimal};
pub use crate::response::ResponseBuilder;
pub use crate::result::QueryResultExt;
pub use crate::token::{Token, TokenInit};
pub use crate::{opt_anyhow, opt_bail, opt_ensure};

pub use anyhow::{anyhow, bail, Context, Result};
pub use cosmwasm_schema::cw_serde;
pub use cosmwasm_std::{Addr, Api, Decimal256, Event, Order, Storage, Timestamp};
pub use cw_storage_plus::{Bound, Item, Map};
pub use std::fmt::Display;
pub use std::str::FromStr;

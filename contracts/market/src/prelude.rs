pub(crate) use crate::state::{State, StateContext};
pub(crate) use everopt::contracts::market::config::Config;
pub(crate) use everopt::contracts::market::entry::{ExecuteMsg, ExecuteOwnerMsg, QueryMsg};
pub(crate) use everopt::prelude::*;

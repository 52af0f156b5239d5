#![deny(clippy::as_conversions)]

pub mod contract;
pub(crate) mod state;

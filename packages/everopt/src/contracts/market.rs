//! Data types for the market contract: entry messages, configuration,
//! positions and events.
pub mod config;
pub mod entry;
pub mod events;
pub mod position;

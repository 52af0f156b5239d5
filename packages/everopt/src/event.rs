//! Helpers for parsing event data into well typed event data types.
use crate::number::{Signed, UnsignedDecimal};
use anyhow::Context;
use cosmwasm_std::{Addr, Event, Timestamp};
use serde::de::DeserializeOwned;

use crate::error::{ErrorDomain, ErrorId};
use crate::opt_anyhow;

/// Extension trait to add methods to native cosmwasm events
pub trait CosmwasmEventExt {
    // these are the only two that require implementation
    // everything else builds on these

    /// Does the event have the given attribute?
    fn has_attr(&self, key: &str) -> bool;

    /// Parse the value associated with the key, if it exists
    fn try_map_attr<B>(&self, key: &str, f: impl Fn(&str) -> B) -> Option<B>;

    /// Parse the value associated with the key as JSON, if it exists
    fn try_json_attr<B: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<B>> {
        match self.try_map_attr(key, |s| serde_json::from_str(s)) {
            None => Ok(None),
            Some(x) => Ok(Some(x?)),
        }
    }

    /// Parse the value associated with the key as JSON
    fn json_attr<B: DeserializeOwned>(&self, key: &str) -> anyhow::Result<B> {
        self.map_attr_result(key, |s| {
            serde_json::from_str(s).map_err(anyhow::Error::from)
        })
    }

    /// Parse the value associated with the key as a u64
    fn u64_attr(&self, key: &str) -> anyhow::Result<u64> {
        self.map_attr_result(key, |s| s.parse().map_err(anyhow::Error::from))
    }

    /// Parse a timestamp attribute, given in nanoseconds
    fn timestamp_attr(&self, key: &str) -> anyhow::Result<Timestamp> {
        self.u64_attr(key).map(Timestamp::from_nanos)
    }

    /// Parse an unsigned decimal attribute
    fn decimal_attr<T: UnsignedDecimal>(&self, key: &str) -> anyhow::Result<T> {
        self.map_attr_result(key, |s| {
            s.parse()
                .ok()
                .with_context(|| format!("decimal_attr failed on key {key} and value {s}"))
        })
    }

    /// Parse a signed decimal attribute
    fn number_attr<T: UnsignedDecimal>(&self, key: &str) -> anyhow::Result<Signed<T>> {
        self.map_attr_result(key, |s| {
            s.parse()
                .ok()
                .with_context(|| format!("number_attr failed on key {key} and value {s}"))
        })
    }

    /// Parse a string attribute
    fn string_attr(&self, key: &str) -> anyhow::Result<String> {
        self.map_attr_ok(key, |s| s.to_string())
    }

    /// Parse a bool-as-string attribute
    fn bool_attr(&self, key: &str) -> anyhow::Result<bool> {
        self.string_attr(key)
            .and_then(|s| s.parse::<bool>().map_err(|err| err.into()))
    }

    /// Parse an address attribute without checking validity
    fn unchecked_addr_attr(&self, key: &str) -> anyhow::Result<Addr> {
        self.map_attr_ok(key, |s| Addr::unchecked(s))
    }

    /// Require an attribute and apply a function to the raw string value
    fn map_attr_ok<B>(&self, key: &str, f: impl Fn(&str) -> B) -> anyhow::Result<B> {
        match self.try_map_attr(key, f) {
            Some(x) => Ok(x),
            None => Err(opt_anyhow!(
                ErrorId::Any,
                ErrorDomain::Default,
                "no such key {}",
                key
            )),
        }
    }

    /// Require an attribute and try to parse its value with the given function
    fn map_attr_result<B>(
        &self,
        key: &str,
        f: impl Fn(&str) -> anyhow::Result<B>,
    ) -> anyhow::Result<B> {
        // just need to remove the one level of nesting for "no such key"
        self.map_attr_ok(key, f)?
    }
}

impl CosmwasmEventExt for Event {
    fn has_attr(&self, key: &str) -> bool {
        self.attributes.iter().any(|a| a.key == key)
    }
    fn try_map_attr<B>(&self, key: &str, f: impl Fn(&str) -> B) -> Option<B> {
        self.attributes.iter().find_map(|a| {
            if a.key == key {
                Some(f(a.value.as_str()))
            } else {
                None
            }
        })
    }
}

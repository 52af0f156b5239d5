// A single interface for working with events out of an AppResponse,
// papering over the "wasm-" prefix the chain adds to contract events.
use anyhow::{anyhow, Result};
use cosmwasm_std::Event;
use cw_multi_test::AppResponse;

pub trait CosmosResponseExt {
    // this is the only method needed to satisfy, everything else is derived
    fn events(&self) -> Box<dyn Iterator<Item = Event> + '_>;

    fn filter_events_type<'a>(&'a self, ty: &'a str) -> Box<dyn Iterator<Item = Event> + 'a> {
        let ty = wasm_event_type(ty);
        Box::new(self.events().filter(move |e| e.ty == ty))
    }

    fn event_first(&self, ty: &str) -> Result<Event> {
        self.filter_events_type(ty)
            .next()
            .ok_or_else(|| anyhow!("no event of type {ty}"))
    }

    fn event_first_attr(&self, ty: &str, key: &str) -> Result<String> {
        let evt = self.event_first(ty)?;
        evt.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.clone())
            .ok_or_else(|| anyhow!("event {ty} has no attribute {key}"))
    }

    fn has_wasm_event(&self, ty: &str) -> bool {
        self.filter_events_type(ty).next().is_some()
    }
}

impl CosmosResponseExt for AppResponse {
    fn events(&self) -> Box<dyn Iterator<Item = Event> + '_> {
        Box::new(self.events.iter().cloned())
    }
}

fn wasm_event_type(ty: &str) -> String {
    if ty.starts_with("wasm-") || ty == "wasm" || ty == "execute" || ty == "instantiate" {
        ty.to_string()
    } else {
        format!("wasm-{ty}")
    }
}

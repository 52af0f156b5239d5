use anyhow::Result;
use cosmwasm_std::{wasm_execute, CosmosMsg, Empty, Event, Response, SubMsg};
use cw2::ContractVersion;
use serde::Serialize;

/// Helper data type, following builder pattern, for constructing a [Response].
pub struct ResponseBuilder {
    resp: Response,
    event_type: EventType,
}

enum EventType {
    MuteEvents,
    EmitEvents {
        common_attrs: Vec<(&'static str, String)>,
    },
}

fn standard_event_attributes(
    ContractVersion { contract, version }: ContractVersion,
) -> Vec<(&'static str, String)> {
    vec![
        ("everopt_protocol", "options".to_string()),
        ("contract_version", version),
        ("contract_name", contract),
    ]
}

impl ResponseBuilder {
    /// Initialize a new builder.
    pub fn new(contract_version: ContractVersion) -> Self {
        ResponseBuilder {
            resp: Response::new(),
            event_type: EventType::EmitEvents {
                common_attrs: standard_event_attributes(contract_version),
            },
        }
    }

    /// Create a response where the event methods are no-ops.
    pub fn new_mute_events() -> Self {
        ResponseBuilder {
            resp: Response::new(),
            event_type: EventType::MuteEvents,
        }
    }

    /// Finalize the builder and generate the final response.
    pub fn into_response(self) -> Response {
        self.resp
    }

    /// Add a new [CosmosMsg] to the response.
    pub fn add_message(&mut self, msg: impl Into<CosmosMsg<Empty>>) {
        self.resp.messages.push(SubMsg::new(msg.into()));
    }

    /// Add a new one-shot submessage execution.
    pub fn add_execute_submessage_oneshot<C: Into<String>, T: Serialize>(
        &mut self,
        contract: C,
        msg: &T,
    ) -> Result<()> {
        self.resp
            .messages
            .push(SubMsg::new(wasm_execute(contract, msg, vec![])?));

        Ok(())
    }

    /// Add an event to the response.
    pub fn add_event(&mut self, event: impl Into<Event>) {
        let event: Event = event.into();

        match &self.event_type {
            EventType::MuteEvents => (),
            EventType::EmitEvents { common_attrs } => self
                .resp
                .events
                .push(event.add_attributes(common_attrs.clone())),
        }
    }
}

//! Wire envelope for outbound frames.

use serde::Serialize;

use perkhub_core::events::DomainEvent;

/// Envelope written to live connections.
#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    /// Frame type discriminator for clients.
    #[serde(rename = "type")]
    pub message_type: &'static str,
    /// The event being delivered.
    pub event: &'a DomainEvent,
}

impl<'a> OutboundMessage<'a> {
    /// Wrap a domain event for delivery.
    pub fn event(event: &'a DomainEvent) -> Self {
        Self {
            message_type: "domain_event",
            event,
        }
    }
}

//! Fan-out dispatcher: the [`EventSink`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use perkhub_core::events::DomainEvent;
use perkhub_core::traits::EventSink;

use crate::connection::ConnectionRegistry;
use crate::message::OutboundMessage;

/// Delivers each domain event to every live connection its recipient
/// holds. Serializes once per event, never blocks, never fails the
/// caller.
#[derive(Clone)]
pub struct FanoutDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl FanoutDispatcher {
    /// Creates a dispatcher over a connection registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher fans out through.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

#[async_trait]
impl EventSink for FanoutDispatcher {
    async fn emit(&self, recipient_id: Uuid, event: &DomainEvent) {
        let frame = match serde_json::to_string(&OutboundMessage::event(event)) {
            Ok(json) => Arc::<str>::from(json),
            Err(e) => {
                error!(event_id = %event.id, error = %e, "Failed to serialize outbound event");
                return;
            }
        };

        let delivered = self.registry.send_to(recipient_id, frame);
        debug!(
            event_id = %event.id,
            recipient_id = %recipient_id,
            delivered,
            "Event fanned out"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perkhub_core::config::RealtimeConfig;
    use perkhub_core::events::{EnrollmentEvent, EventPayload};

    #[tokio::test]
    async fn test_emit_reaches_live_connection() {
        let registry = Arc::new(ConnectionRegistry::new(RealtimeConfig::default()));
        let dispatcher = FanoutDispatcher::new(Arc::clone(&registry));

        let recipient = Uuid::new_v4();
        let (_handle, mut receiver) = registry.register(recipient);

        let event = DomainEvent::new(
            None,
            EventPayload::Enrollment(EnrollmentEvent::ProgramRemoved {
                program_id: Uuid::new_v4(),
            }),
        );
        dispatcher.emit(recipient, &event).await;

        let frame = receiver.recv().await.expect("frame delivered");
        let value: serde_json::Value = serde_json::from_str(&frame).expect("valid json");
        assert_eq!(value["type"], "domain_event");
        assert_eq!(value["event"]["id"], event.id.to_string());
    }

    #[tokio::test]
    async fn test_emit_without_connections_is_silent() {
        let registry = Arc::new(ConnectionRegistry::new(RealtimeConfig::default()));
        let dispatcher = FanoutDispatcher::new(registry);

        let event = DomainEvent::new(
            None,
            EventPayload::Enrollment(EnrollmentEvent::ProgramRemoved {
                program_id: Uuid::new_v4(),
            }),
        );
        // Must not error or panic with nobody listening.
        dispatcher.emit(Uuid::new_v4(), &event).await;
    }
}

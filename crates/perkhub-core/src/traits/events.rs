//! Fan-out sink trait for live event delivery.

use async_trait::async_trait;
use uuid::Uuid;

use crate::events::DomainEvent;

/// Best-effort "push event to recipient" capability.
///
/// Implementations must never propagate delivery failures to the caller;
/// a failed or absent live connection is logged and swallowed, because the
/// persisted notification row is the at-least-once delivery channel.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Deliver an event to every live connection of `recipient_id`.
    /// Fire-and-forget.
    async fn emit(&self, recipient_id: Uuid, event: &DomainEvent);
}

/// A sink that drops every event. Used when no real-time engine is wired.
#[derive(Debug, Default, Clone)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn emit(&self, _recipient_id: Uuid, _event: &DomainEvent) {}
}

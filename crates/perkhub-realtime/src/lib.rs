//! # perkhub-realtime
//!
//! Best-effort live delivery of domain events. A transport layer
//! (websocket, SSE) registers one [`connection::ConnectionHandle`] per
//! live client and drains frames from its receiver; the
//! [`dispatcher::FanoutDispatcher`] implements
//! [`perkhub_core::traits::EventSink`] and pushes each event to every
//! connection the recipient has open.
//!
//! Nothing here is a delivery guarantee: a slow or absent client loses
//! frames, and the persisted notification inbox is the channel of
//! record.

pub mod connection;
pub mod dispatcher;
pub mod message;

pub use connection::{ConnectionHandle, ConnectionRegistry};
pub use dispatcher::FanoutDispatcher;
pub use message::OutboundMessage;

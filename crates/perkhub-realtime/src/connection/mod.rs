//! Live connection registry.

mod registry;

pub use registry::{ConnectionHandle, ConnectionRegistry, Frame};

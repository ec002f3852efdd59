//! Notification inbox service.

mod service;

pub use service::NotificationService;

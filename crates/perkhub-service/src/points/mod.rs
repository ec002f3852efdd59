//! Points transaction processor.

mod service;

pub use service::PointsService;

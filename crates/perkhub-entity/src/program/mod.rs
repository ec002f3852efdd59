//! Slim program catalog entities.

pub mod model;

pub use model::{Program, Reward};

//! The order engine.

pub mod engine;

pub use engine::{CheckoutRequest, OrderEngine, OrderError};

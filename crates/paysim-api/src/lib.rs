//! paysim payment API library entry.
//!
//! Wires config, the payment metrics registry, request instrumentation, the
//! business simulation and the HTTP routes into one service. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod sim;

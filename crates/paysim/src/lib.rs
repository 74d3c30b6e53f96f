//! Top-level facade crate for paysim.
//!
//! Re-exports the metric core and the payment API so users can depend on a single crate.

pub mod core {
    pub use paysim_core::*;
}

pub mod api {
    pub use paysim_api::*;
}

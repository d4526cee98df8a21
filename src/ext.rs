//! Public extension contracts.
//!
//! Downstream services attach broker-issued sessions to whatever HTTP client they use through
//! [`RequestSignerExt`]. A `reqwest` adapter ships behind the default `reqwest` feature.

pub mod request_signer;

pub use request_signer::*;

//! Frontend Service Runtime
//!
//! Binds the inbound listener, serves the REST router on a separate task and
//! coordinates the signal-driven drain and join on shutdown.

pub mod lifecycle;
pub mod rest;
pub mod server;

pub use lifecycle::*;
pub use rest::*;
pub use server::*;

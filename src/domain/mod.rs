//! Domain layer - Resource addressing and port definitions
//!
//! This module defines the resource identifiers and the core traits (ports)
//! that adapters implement, following hexagonal architecture principles.

pub mod internal_id;
pub mod ports;

pub use internal_id::*;
pub use ports::*;

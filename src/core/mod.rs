//! Core infrastructure
//!
//! Logging macros and the parameter persistence layer that sits between the
//! platform-agnostic registry and the flash medium.

pub mod logging;
pub mod parameters;

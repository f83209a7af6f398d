//! Platform-agnostic trait abstractions.
//!
//! Trait definitions carry no feature gates; platform implementations live in
//! the root crate.

pub mod time;

pub use time::{MockTime, TimeSource};

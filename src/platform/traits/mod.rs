//! Platform abstraction traits
//!
//! This module defines the traits that storage implementations must provide.

pub mod flash;

pub use flash::FlashInterface;

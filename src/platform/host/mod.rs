//! Host platform implementation
//!
//! Storage backed by the host filesystem, for simulators and bench tools.

#![cfg(feature = "std")]

mod file_flash;

pub use file_flash::{FileFlash, DEFAULT_BLOCK_SIZE, DEFAULT_CAPACITY};

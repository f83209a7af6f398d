//! Mock platform implementation for testing
//!
//! In-memory storage for unit and integration tests, available in test
//! builds and with the `std` feature.
//!
//! # Example
//!
//! ```
//! use mpc_params::platform::mock::MockFlash;
//! use mpc_params::platform::traits::FlashInterface;
//!
//! let mut flash = MockFlash::new();
//! flash.erase(0x040000, 4096).unwrap();
//! flash.write(0x040000, b"PARA").unwrap();
//! ```

#![cfg(any(test, feature = "std"))]

mod flash;

pub use flash::MockFlash;

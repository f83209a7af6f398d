//! Platform abstraction layer
//!
//! Storage medium access for parameter persistence. All medium-specific code
//! is isolated to this module.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "std"))]
pub mod mock;

#[cfg(feature = "std")]
pub mod host;

pub use error::{FlashError, PlatformError, Result};
pub use traits::FlashInterface;

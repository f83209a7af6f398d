//! Parameter persistence
//!
//! Flash-backed load/save for the registry, plus the debounced save task on
//! Embassy targets.

pub mod saver;
pub mod storage;

#[cfg(feature = "embassy")]
pub use saver::{EmbassyClock, ParamSaver, SaveChannel, SaveRequest, SharedStorage};
pub use storage::{
    DroppedRecord, LoadReport, ParamStorage, PersistenceError, SaveReport, StorageLayout,
    StorageStats,
};

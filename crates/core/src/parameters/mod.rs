//! Parameter types, validation, registry and store format
//!
//! Everything here is platform-agnostic. Flash access, load/save and the
//! debounced save task are in the root crate.

pub mod cell;
pub mod crc;
pub mod debounce;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod record;
pub mod registry;
pub mod validate;
pub mod value;

pub use cell::{CellSnapshot, ValueCell};
pub use crc::{calculate_crc32, StoreChecksum};
pub use debounce::SaveDebouncer;
pub use descriptor::{make_name, ParamDescriptor, ParamFlags, ParamKind, ParamName, PARAM_NAME_LEN};
pub use error::{DropReason, ParameterError, RecordError};
pub use handle::{FloatParam, IntParam, ParamHandle, ParamWatch};
pub use record::{PersistedRecord, StoreHeader, FORMAT_VERSION, HEADER_LEN, RECORD_LEN};
pub use registry::{ParamEntry, ParamState, ParameterRegistry, MAX_PARAMS};
pub use validate::validate;
pub use value::{ParamType, ParamValue, RawValue};

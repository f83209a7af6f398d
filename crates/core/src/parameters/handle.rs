//! Pre-resolved parameter access
//!
//! Control loops read the same parameters every tick. A handle resolves the
//! name once; `get` afterwards is a single seqlock read with no hashing.

use super::error::ParameterError;
use super::registry::{ParamEntry, ParamState, ParameterRegistry};
use super::value::{ParamValue, RawValue};
use super::descriptor::ParamDescriptor;

/// Untyped handle to one registered parameter
#[derive(Clone, Copy)]
pub struct ParamHandle<'a> {
    registry: &'a ParameterRegistry,
    entry: &'a ParamEntry,
}

impl<'a> ParamHandle<'a> {
    pub(crate) fn new(registry: &'a ParameterRegistry, entry: &'a ParamEntry) -> Self {
        Self { registry, entry }
    }

    /// Declaration
    pub fn descriptor(&self) -> &'a ParamDescriptor {
        self.entry.descriptor()
    }

    /// Current value and version
    pub fn get(&self) -> (ParamValue, u32) {
        self.entry.get()
    }

    /// Full state
    pub fn state(&self) -> ParamState<'a> {
        self.entry.state()
    }

    /// Current version
    pub fn version(&self) -> u32 {
        self.entry.cell.version()
    }

    /// Validate and write; same semantics as [`ParameterRegistry::set`]
    pub fn set(&self, raw: impl Into<RawValue>) -> Result<u32, ParameterError> {
        let version = self.entry.set(raw.into())?;
        self.registry.bump_generation();
        Ok(version)
    }

    /// Start watching for changes from the current version
    pub fn watch(&self) -> ParamWatch<'a> {
        ParamWatch {
            handle: *self,
            seen: self.version(),
        }
    }
}

impl core::fmt::Debug for ParamHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParamHandle")
            .field("name", &self.entry.descriptor().name)
            .finish()
    }
}

/// Handle to a float parameter
#[derive(Debug, Clone, Copy)]
pub struct FloatParam<'a>(ParamHandle<'a>);

impl<'a> FloatParam<'a> {
    pub(crate) fn new(handle: ParamHandle<'a>) -> Self {
        Self(handle)
    }

    /// Current value
    pub fn get(&self) -> f32 {
        match self.0.get().0 {
            ParamValue::Float(v) => v,
            // Type is fixed at registration and checked when the handle is built
            ParamValue::Int32(v) => v as f32,
        }
    }

    /// Validate and write
    pub fn set(&self, value: f32) -> Result<u32, ParameterError> {
        self.0.set(value)
    }

    /// Untyped handle
    pub fn handle(&self) -> ParamHandle<'a> {
        self.0
    }
}

/// Handle to an int32 parameter
#[derive(Debug, Clone, Copy)]
pub struct IntParam<'a>(ParamHandle<'a>);

impl<'a> IntParam<'a> {
    pub(crate) fn new(handle: ParamHandle<'a>) -> Self {
        Self(handle)
    }

    /// Current value
    pub fn get(&self) -> i32 {
        match self.0.get().0 {
            ParamValue::Int32(v) => v,
            ParamValue::Float(v) => v as i32,
        }
    }

    /// Validate and write
    pub fn set(&self, value: i32) -> Result<u32, ParameterError> {
        self.0.set(value)
    }

    /// Untyped handle
    pub fn handle(&self) -> ParamHandle<'a> {
        self.0
    }
}

/// Version-based change detection for one parameter
///
/// Consumers that cache derived quantities (gains, limits) poll
/// [`ParamWatch::changed`] and recompute only when it returns a value.
#[derive(Debug, Clone, Copy)]
pub struct ParamWatch<'a> {
    handle: ParamHandle<'a>,
    seen: u32,
}

impl ParamWatch<'_> {
    /// Return the current value if it was written since the last call
    pub fn changed(&mut self) -> Option<ParamValue> {
        let (value, version) = self.handle.get();
        if version == self.seen {
            return None;
        }
        self.seen = version;
        Some(value)
    }

    /// Version last observed
    pub fn seen(&self) -> u32 {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParameterRegistry {
        let mut registry = ParameterRegistry::new();
        registry
            .register_all(&[
                ParamDescriptor::new_float("MPC_XY_P", 1.0, Some(0.0), None),
                ParamDescriptor::new_int32("MPC_FW_USE_ALT", 0, Some(0), Some(1)),
            ])
            .unwrap();
        registry
    }

    #[test]
    fn test_typed_handles() {
        let registry = registry();
        let xy_p = registry.float("MPC_XY_P").unwrap();
        let use_alt = registry.int("MPC_FW_USE_ALT").unwrap();

        assert_eq!(xy_p.get(), 1.0);
        assert_eq!(use_alt.get(), 0);

        assert_eq!(xy_p.set(2.5), Ok(1));
        assert_eq!(use_alt.set(2), Err(ParameterError::OutOfBounds));
        assert_eq!(registry.get_f32("MPC_XY_P"), Ok(2.5));
        assert!(registry.needs_save());
    }

    #[test]
    fn test_typed_handle_rejects_wrong_type() {
        let registry = registry();
        assert!(matches!(
            registry.float("MPC_FW_USE_ALT"),
            Err(ParameterError::TypeMismatch)
        ));
        assert!(matches!(
            registry.int("MPC_XY_P"),
            Err(ParameterError::TypeMismatch)
        ));
    }

    #[test]
    fn test_watch_reports_each_change_once() {
        let registry = registry();
        let handle = registry.handle("MPC_XY_P").unwrap();
        let mut watch = handle.watch();

        assert_eq!(watch.changed(), None);

        registry.set("MPC_XY_P", 0.7f32).unwrap();
        assert_eq!(watch.changed(), Some(ParamValue::Float(0.7)));
        assert_eq!(watch.changed(), None);

        // Rejected writes do not wake the watcher
        let _ = registry.set("MPC_XY_P", -1.0f32);
        assert_eq!(watch.changed(), None);
        assert_eq!(watch.seen(), 1);
    }
}

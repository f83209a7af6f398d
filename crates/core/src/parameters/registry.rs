//! Parameter registry
//!
//! Process-wide map from stable name to descriptor and value cell.
//!
//! # Lifecycle
//!
//! 1. Build with [`ParameterRegistry::new`] and register every descriptor.
//!    Registration takes `&mut self`, so it is finished before the registry
//!    can be shared.
//! 2. Overlay persisted values (`ParamStorage::load` in `mpc_params`).
//! 3. Share by reference (`&'static` on target, `&` or `Arc` on host). All
//!    runtime operations take `&self` and never hold more than one cell lock.
//!
//! Entries are never removed, so references handed out by
//! [`ParameterRegistry::handle`] stay valid for the registry's lifetime.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::index_map::FnvIndexMap;

use super::cell::ValueCell;
use super::descriptor::{make_name, ParamDescriptor, ParamName};
use super::error::ParameterError;
use super::handle::{FloatParam, IntParam, ParamHandle};
use super::validate::validate;
use super::value::{ParamType, ParamValue, RawValue};

/// Maximum number of registered parameters (power of two, index map requirement)
pub const MAX_PARAMS: usize = 256;

/// Maximum number of distinct group tags reported by [`ParameterRegistry::groups`]
pub const MAX_GROUPS: usize = 32;

/// Descriptor and value cell for one parameter
#[derive(Debug)]
pub struct ParamEntry {
    pub(crate) descriptor: ParamDescriptor,
    pub(crate) cell: ValueCell,
}

impl ParamEntry {
    fn new(descriptor: ParamDescriptor) -> Self {
        Self {
            cell: ValueCell::new(descriptor.default_value().to_bits()),
            descriptor,
        }
    }

    /// Immutable declaration
    pub fn descriptor(&self) -> &ParamDescriptor {
        &self.descriptor
    }

    /// Consistent read of the current state
    pub fn state(&self) -> ParamState<'_> {
        let snap = self.cell.read();
        ParamState {
            descriptor: &self.descriptor,
            value: ParamValue::from_bits(snap.bits, self.descriptor.param_type()),
            version: snap.version,
            dirty: snap.dirty,
        }
    }

    /// Current value and version
    pub fn get(&self) -> (ParamValue, u32) {
        let snap = self.cell.read();
        (
            ParamValue::from_bits(snap.bits, self.descriptor.param_type()),
            snap.version,
        )
    }

    /// Validate and write; returns the new version
    pub(crate) fn set(&self, raw: RawValue) -> Result<u32, ParameterError> {
        if self.descriptor.is_read_only() {
            return Err(ParameterError::ReadOnly);
        }

        // Validation happens before the cell is locked; a rejected value
        // never touches the cell.
        let value = validate(&self.descriptor, raw)?;

        let mut guard = self.cell.lock();
        guard.store(value.to_bits());
        guard.set_dirty(true);
        Ok(guard.next_version())
    }

    /// Rewrite to default and clear dirty; returns true if anything changed
    fn reset(&self) -> bool {
        let default_bits = self.descriptor.default_value().to_bits();
        let mut guard = self.cell.lock();
        let value_changed = guard.bits() != default_bits;
        let was_dirty = guard.dirty();
        if value_changed {
            guard.store(default_bits);
        }
        guard.set_dirty(false);
        value_changed || was_dirty
    }
}

/// Point-in-time view of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamState<'a> {
    /// Declaration
    pub descriptor: &'a ParamDescriptor,
    /// Current value
    pub value: ParamValue,
    /// Successful writes since registration
    pub version: u32,
    /// Written since registration or last reset
    pub dirty: bool,
}

impl ParamState<'_> {
    /// True if the value is bit-identical to the declared default
    pub fn is_default(&self) -> bool {
        self.value.same_bits(&self.descriptor.default_value())
    }

    /// True if this value belongs in the persisted set
    pub fn should_persist(&self) -> bool {
        self.dirty && !self.is_default()
    }
}

/// Parameter registry
pub struct ParameterRegistry {
    entries: FnvIndexMap<ParamName, ParamEntry, MAX_PARAMS>,
    /// Bumped on every state change visible to persistence
    generation: AtomicU32,
    /// Generation captured by the last successful save or load
    saved_generation: AtomicU32,
}

impl ParameterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
            generation: AtomicU32::new(0),
            saved_generation: AtomicU32::new(0),
        }
    }

    /// Register a parameter at its default value
    ///
    /// Registering an identical descriptor twice is a no-op; a different
    /// descriptor under an existing name fails with `DuplicateName`.
    pub fn register(&mut self, descriptor: ParamDescriptor) -> Result<(), ParameterError> {
        descriptor.check()?;
        let key = descriptor.key()?;

        if let Some(existing) = self.entries.get(&key) {
            return if existing.descriptor == descriptor {
                Ok(())
            } else {
                Err(ParameterError::DuplicateName)
            };
        }

        self.entries
            .insert(key, ParamEntry::new(descriptor))
            .map_err(|_| ParameterError::RegistryFull)?;
        Ok(())
    }

    /// Register a table of descriptors, stopping at the first failure
    pub fn register_all(&mut self, descriptors: &[ParamDescriptor]) -> Result<(), ParameterError> {
        for descriptor in descriptors {
            self.register(*descriptor)?;
        }
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&ParamEntry, ParameterError> {
        let key = make_name(name).map_err(|_| ParameterError::UnknownName)?;
        self.entries.get(&key).ok_or(ParameterError::UnknownName)
    }

    /// Current value and version; never blocks
    pub fn get(&self, name: &str) -> Result<(ParamValue, u32), ParameterError> {
        Ok(self.entry(name)?.get())
    }

    /// Current value of a float parameter
    pub fn get_f32(&self, name: &str) -> Result<f32, ParameterError> {
        self.get(name)?
            .0
            .as_f32()
            .ok_or(ParameterError::TypeMismatch)
    }

    /// Current value of an int32 parameter
    pub fn get_i32(&self, name: &str) -> Result<i32, ParameterError> {
        self.get(name)?
            .0
            .as_i32()
            .ok_or(ParameterError::TypeMismatch)
    }

    /// Validate and write a new value; returns the new version
    ///
    /// On error the resident value is unchanged.
    pub fn set(&self, name: &str, raw: impl Into<RawValue>) -> Result<u32, ParameterError> {
        let version = self.entry(name)?.set(raw.into())?;
        self.bump_generation();
        Ok(version)
    }

    /// Rewrite one parameter to its default and clear its dirty flag
    pub fn reset_to_default(&self, name: &str) -> Result<(), ParameterError> {
        if self.entry(name)?.reset() {
            self.bump_generation();
        }
        Ok(())
    }

    /// Rewrite every parameter to its default
    ///
    /// Cells are reset one at a time; no lock spans the whole registry.
    pub fn reset_all(&self) {
        let mut changed = false;
        for entry in self.entries.values() {
            changed |= entry.reset();
        }
        if changed {
            self.bump_generation();
        }
    }

    /// Descriptor for `name`
    pub fn descriptor(&self, name: &str) -> Result<&ParamDescriptor, ParameterError> {
        Ok(&self.entry(name)?.descriptor)
    }

    /// Full state for `name`
    pub fn state(&self, name: &str) -> Result<ParamState<'_>, ParameterError> {
        Ok(self.entry(name)?.state())
    }

    /// Whether `name` has been written since registration or last reset
    pub fn is_dirty(&self, name: &str) -> Result<bool, ParameterError> {
        Ok(self.entry(name)?.cell.read().dirty)
    }

    /// Resolve `name` once for repeated lookup-free access
    pub fn handle(&self, name: &str) -> Result<ParamHandle<'_>, ParameterError> {
        self.entry(name).map(|entry| ParamHandle::new(self, entry))
    }

    /// Resolve a float parameter
    pub fn float(&self, name: &str) -> Result<FloatParam<'_>, ParameterError> {
        let entry = self.entry(name)?;
        match entry.descriptor.param_type() {
            ParamType::Float => Ok(FloatParam::new(ParamHandle::new(self, entry))),
            ParamType::Int32 => Err(ParameterError::TypeMismatch),
        }
    }

    /// Resolve an int32 parameter
    pub fn int(&self, name: &str) -> Result<IntParam<'_>, ParameterError> {
        let entry = self.entry(name)?;
        match entry.descriptor.param_type() {
            ParamType::Int32 => Ok(IntParam::new(ParamHandle::new(self, entry))),
            ParamType::Float => Err(ParameterError::TypeMismatch),
        }
    }

    /// Descriptors in registration order, optionally filtered by group
    ///
    /// The iterator is lazy; call `list` again to restart it.
    pub fn list<'a>(
        &'a self,
        group: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ParamDescriptor> + 'a {
        self.entries
            .values()
            .map(|entry| &entry.descriptor)
            .filter(move |descriptor| group.map_or(true, |g| descriptor.group == g))
    }

    /// Per-parameter states in registration order
    ///
    /// Each state is read independently; no lock spans the iteration.
    pub fn states(&self) -> impl Iterator<Item = ParamState<'_>> + '_ {
        self.entries.values().map(ParamEntry::state)
    }

    /// Distinct group tags in first-registration order
    pub fn groups(&self) -> heapless::Vec<&str, MAX_GROUPS> {
        let mut groups: heapless::Vec<&str, MAX_GROUPS> = heapless::Vec::new();
        for entry in self.entries.values() {
            let group = entry.descriptor.group;
            if !groups.contains(&group) && groups.push(group).is_err() {
                break;
            }
        }
        groups
    }

    /// Number of registered parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry-wide change counter
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// True if state changed since the last successful save or load
    pub fn needs_save(&self) -> bool {
        self.generation() != self.saved_generation.load(Ordering::Acquire)
    }

    /// Record that the store reflects the registry as of `generation`
    ///
    /// Called by persistence with the generation read *before* taking its
    /// snapshot, so writes racing with a save still count as unsaved.
    pub fn mark_saved(&self, generation: u32) {
        self.saved_generation.store(generation, Ordering::Release);
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

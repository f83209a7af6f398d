//! Flash parameter storage
//!
//! Persists the registry's non-default values with redundant slot rotation
//! for wear leveling and crash safety.
//!
//! # Commit protocol
//!
//! A save never touches the active slot. It erases the next slot in
//! round-robin order, writes header and records, and writes the CRC trailer
//! last. A slot only counts once its trailer matches, and the valid slot
//! with the newest sequence number is the active store. Power loss at any
//! point of a save therefore leaves the previous store active.

use core::fmt;

use mpc_params_core::parameters::record::{CRC_LEN, HEADER_LEN, RECORD_LEN};
use mpc_params_core::parameters::{
    DropReason, ParamName, ParameterRegistry, PersistedRecord, RecordError, StoreChecksum,
    StoreHeader, FORMAT_VERSION, MAX_PARAMS,
};

use crate::platform::{FlashInterface, PlatformError};

/// Maximum number of slots a layout may use
pub const MAX_SLOTS: usize = 8;

/// Maximum number of dropped records kept in a [`LoadReport`]
pub const MAX_DROPPED: usize = 32;

/// Flash transfer chunk size
const CHUNK_SIZE: usize = 256;

/// Records per write chunk
const RECORDS_PER_CHUNK: usize = CHUNK_SIZE / RECORD_LEN;

/// Decoded records of one store, before validation
type StoredRecords = heapless::Vec<Result<PersistedRecord, RecordError>, MAX_PARAMS>;

/// Where the store lives on the medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLayout {
    /// Address of slot 0
    pub base: u32,
    /// Bytes per slot (multiple of the flash block size)
    pub slot_size: u32,
    /// Number of slots in rotation (2..=MAX_SLOTS)
    pub slot_count: u8,
}

impl StorageLayout {
    /// Four 8 KB slots right after a 256 KB firmware region
    pub const DEFAULT: Self = Self {
        base: 0x040000,
        slot_size: 0x2000,
        slot_count: 4,
    };

    /// Start address of `slot`
    pub const fn slot_address(&self, slot: u8) -> u32 {
        self.base + slot as u32 * self.slot_size
    }

    fn check<F: FlashInterface>(&self, flash: &F) -> Result<(), PersistenceError> {
        let block = flash.block_size();
        let end = self.base as u64 + self.slot_size as u64 * self.slot_count as u64;
        let valid = (2..=MAX_SLOTS as u8).contains(&self.slot_count)
            && block != 0
            && self.base % block == 0
            && self.slot_size % block == 0
            && self.slot_size as usize >= HEADER_LEN + CRC_LEN
            && end <= flash.capacity() as u64;
        if valid {
            Ok(())
        } else {
            Err(PersistenceError::InvalidLayout)
        }
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceError {
    /// The medium failed; the registry stays authoritative
    Io(PlatformError),
    /// The persisted set does not fit one slot
    StoreFull,
    /// Layout does not fit the medium
    InvalidLayout,
    /// The store failed its checksum when read back for loading
    Corrupt,
}

impl PersistenceError {
    /// Short identifier used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            PersistenceError::Io(e) => e.as_str(),
            PersistenceError::StoreFull => "store full",
            PersistenceError::InvalidLayout => "invalid storage layout",
            PersistenceError::Corrupt => "store changed during load",
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "Persistence I/O error: {}", e),
            PersistenceError::StoreFull => write!(f, "Parameter store full"),
            PersistenceError::InvalidLayout => write!(f, "Invalid storage layout"),
            PersistenceError::Corrupt => write!(f, "Parameter store changed during load"),
        }
    }
}

impl From<PlatformError> for PersistenceError {
    fn from(error: PlatformError) -> Self {
        PersistenceError::Io(error)
    }
}

/// Storage statistics for wear monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Successful saves since construction
    pub total_saves: u32,
    /// Failed saves since construction
    pub failed_saves: u32,
    /// Slot holding the active store
    pub active_slot: Option<u8>,
    /// Sequence number of the active store
    pub sequence: Option<u16>,
    /// Erases issued per slot since construction
    pub erase_counts: [u32; MAX_SLOTS],
}

/// A persisted record that was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    /// Record name; `None` if the name itself could not be decoded
    pub name: Option<ParamName>,
    /// Why it was dropped
    pub reason: DropReason,
}

/// Result of [`ParamStorage::load`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Slot the store was read from; `None` if no valid store exists
    pub slot: Option<u8>,
    /// Sequence number of that store
    pub sequence: Option<u16>,
    /// Format version of that store
    pub format_version: Option<u16>,
    /// Records applied to the registry
    pub loaded: usize,
    /// Dropped records (first `MAX_DROPPED`)
    pub dropped: heapless::Vec<DroppedRecord, MAX_DROPPED>,
    /// Total dropped records, including those not kept in `dropped`
    pub dropped_total: usize,
}

impl LoadReport {
    fn drop_record(&mut self, name: Option<ParamName>, reason: DropReason) {
        self.dropped_total += 1;
        let _ = self.dropped.push(DroppedRecord { name, reason });
    }
}

/// Result of [`ParamStorage::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Slot written
    pub slot: u8,
    /// Sequence number written
    pub sequence: u16,
    /// Records written
    pub records: usize,
    /// Bytes written including header and trailer
    pub bytes: usize,
}

/// Wrap-safe "a was written after b" for 16-bit sequence numbers
pub fn sequence_newer(a: u16, b: u16) -> bool {
    (a.wrapping_sub(b) as i16) > 0
}

/// Flash-backed persistence for a [`ParameterRegistry`]
///
/// # Example
///
/// ```
/// use mpc_params::core::parameters::storage::ParamStorage;
/// use mpc_params::platform::mock::MockFlash;
/// use mpc_params_core::parameters::{ParamDescriptor, ParameterRegistry};
///
/// let mut registry = ParameterRegistry::new();
/// registry
///     .register(ParamDescriptor::new_float("MPC_XY_P", 1.0, Some(0.0), None))
///     .unwrap();
///
/// let mut storage = ParamStorage::new(MockFlash::new()).unwrap();
/// registry.set("MPC_XY_P", 1.5f32).unwrap();
/// storage.save(&registry).unwrap();
///
/// registry.reset_all();
/// let report = storage.load(&registry).unwrap();
/// assert_eq!(report.loaded, 1);
/// assert_eq!(registry.get_f32("MPC_XY_P"), Ok(1.5));
/// ```
pub struct ParamStorage<F: FlashInterface> {
    flash: F,
    layout: StorageLayout,
    /// (slot, sequence) of the active store, once known
    active: Option<(u8, u16)>,
    scanned: bool,
    stats: StorageStats,
}

impl<F: FlashInterface> ParamStorage<F> {
    /// Storage with [`StorageLayout::DEFAULT`]
    pub fn new(flash: F) -> Result<Self, PersistenceError> {
        Self::with_layout(flash, StorageLayout::DEFAULT)
    }

    /// Storage with an explicit layout
    pub fn with_layout(flash: F, layout: StorageLayout) -> Result<Self, PersistenceError> {
        layout.check(&flash)?;
        Ok(Self {
            flash,
            layout,
            active: None,
            scanned: false,
            stats: StorageStats {
                total_saves: 0,
                failed_saves: 0,
                active_slot: None,
                sequence: None,
                erase_counts: [0; MAX_SLOTS],
            },
        })
    }

    /// Stream `len` bytes starting at `address` through `checksum`
    fn checksum_range(
        &mut self,
        checksum: &mut StoreChecksum,
        address: u32,
        len: usize,
    ) -> Result<(), PlatformError> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut offset = 0usize;
        while offset < len {
            let n = (len - offset).min(CHUNK_SIZE);
            self.flash.read(address + offset as u32, &mut chunk[..n])?;
            checksum.update(&chunk[..n]);
            offset += n;
        }
        Ok(())
    }

    fn read_crc(&mut self, address: u32) -> Result<u32, PlatformError> {
        let mut crc_buf = [0u8; CRC_LEN];
        self.flash.read(address, &mut crc_buf)?;
        Ok(u32::from_le_bytes(crc_buf))
    }

    /// Validate one slot; returns its header if the CRC matches
    fn scan_slot(&mut self, slot: u8) -> Result<Option<StoreHeader>, PlatformError> {
        let address = self.layout.slot_address(slot);

        let mut header_buf = [0u8; HEADER_LEN];
        self.flash.read(address, &mut header_buf)?;
        let Ok(header) = StoreHeader::from_bytes(&header_buf) else {
            return Ok(None);
        };

        let body_len = match header.total_len() {
            Ok(total) if total <= self.layout.slot_size as usize => total - CRC_LEN,
            _ => return Ok(None),
        };

        let mut checksum = StoreChecksum::new();
        self.checksum_range(&mut checksum, address, body_len)?;

        if checksum.finalize() == self.read_crc(address + body_len as u32)? {
            Ok(Some(header))
        } else {
            Ok(None)
        }
    }

    /// Find the valid slot with the newest sequence number
    ///
    /// Corrupt, erased or half-written slots are skipped, so a damaged newest
    /// slot falls back to the next newest. A slot that cannot be read at all
    /// fails the scan: it may hold the newest store, and picking an older
    /// one would let the next save bury it.
    pub fn find_active_slot(&mut self) -> Result<Option<(u8, StoreHeader)>, PersistenceError> {
        let mut newest: Option<(u8, StoreHeader)> = None;

        for slot in 0..self.layout.slot_count {
            match self.scan_slot(slot) {
                Ok(Some(header)) => {
                    let is_newer = newest
                        .map_or(true, |(_, best)| sequence_newer(header.sequence, best.sequence));
                    if is_newer {
                        newest = Some((slot, header));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    crate::log_warn!("Parameter slot {} unreadable: {}", slot, e.as_str());
                    return Err(e.into());
                }
            }
        }

        self.set_active(newest.map(|(slot, header)| (slot, header.sequence)));
        Ok(newest)
    }

    fn set_active(&mut self, active: Option<(u8, u16)>) {
        self.active = active;
        self.scanned = true;
        self.stats.active_slot = active.map(|(slot, _)| slot);
        self.stats.sequence = active.map(|(_, seq)| seq);
    }

    /// Read and decode every record of the store in `slot`
    ///
    /// The CRC is recomputed over exactly the bytes decoded here, so the
    /// returned records are the ones the checksum vouches for. Records past
    /// `MAX_PARAMS` cannot belong to any registry and are only counted.
    fn read_records(
        &mut self,
        slot: u8,
        header: &StoreHeader,
    ) -> Result<(StoredRecords, usize), PersistenceError> {
        let address = self.layout.slot_address(slot);
        let body_len = header.body_len().map_err(|_| PersistenceError::Corrupt)?;

        let mut checksum = StoreChecksum::new();
        self.checksum_range(&mut checksum, address, header.header_len as usize)?;

        let mut records = StoredRecords::new();
        let mut overflow = 0usize;
        let mut buf = [0u8; RECORD_LEN];
        for index in 0..header.count {
            let record_address = address + header.record_offset(index) as u32;
            self.flash.read(record_address, &mut buf)?;
            checksum.update(&buf);
            // Fields appended by newer format versions
            self.checksum_range(
                &mut checksum,
                record_address + RECORD_LEN as u32,
                header.record_len as usize - RECORD_LEN,
            )?;

            if records.push(PersistedRecord::decode(&buf)).is_err() {
                overflow += 1;
            }
        }

        if checksum.finalize() != self.read_crc(address + body_len as u32)? {
            return Err(PersistenceError::Corrupt);
        }
        Ok((records, overflow))
    }

    /// Overlay the newest valid store onto `registry`
    ///
    /// Every record goes through the same validation as a runtime `set`.
    /// Records that fail are dropped and reported; their parameters keep
    /// their current value. A missing or corrupt store is not an error.
    ///
    /// The whole store is read and checked before the first record is
    /// applied. If the medium fails part way, `load` returns the error with
    /// the registry untouched, so the stored values stay authoritative and
    /// a later `load` can retry.
    pub fn load(&mut self, registry: &ParameterRegistry) -> Result<LoadReport, PersistenceError> {
        let mut report = LoadReport::default();

        let Some((slot, header)) = self.find_active_slot()? else {
            crate::log_info!("No valid parameter store, using defaults");
            return Ok(report);
        };

        report.slot = Some(slot);
        report.sequence = Some(header.sequence);
        report.format_version = Some(header.version);

        if header.version > FORMAT_VERSION {
            crate::log_warn!(
                "Parameter store version {} is newer than {}, reading known fields",
                header.version,
                FORMAT_VERSION
            );
        }

        let (records, overflow) = match self.read_records(slot, &header) {
            Ok(read) => read,
            Err(e) => {
                // Rescan before the next save
                self.scanned = false;
                crate::log_error!("Parameter store read failed: {}", e.as_str());
                return Err(e);
            }
        };

        let in_sync = !registry.needs_save();
        let generation_before = registry.generation();

        for record in records {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    report.drop_record(None, e.into());
                    continue;
                }
            };

            let Some(raw) = record.value() else {
                report.drop_record(Some(record.name), DropReason::UnknownType);
                continue;
            };

            match registry.set(record.name.as_str(), raw) {
                Ok(_) => report.loaded += 1,
                Err(e) => report.drop_record(Some(record.name), e.into()),
            }
        }
        for _ in 0..overflow {
            report.drop_record(None, DropReason::CorruptRecord);
        }

        for dropped in &report.dropped {
            let name = dropped.name.as_ref().map_or("?", |n| n.as_str());
            crate::log_warn!(
                "Dropped stored parameter {}: {}",
                name,
                dropped.reason.as_str()
            );
        }

        // The store matches the registry only if nothing was dropped and no
        // other write happened before or during the load. Otherwise the next
        // save rewrites it.
        let generation_after = registry.generation();
        if in_sync
            && report.dropped_total == 0
            && generation_after == generation_before.wrapping_add(report.loaded as u32)
        {
            registry.mark_saved(generation_after);
        }

        crate::log_info!(
            "Loaded {} parameters from slot {} (seq {}), dropped {}",
            report.loaded,
            slot,
            header.sequence,
            report.dropped_total
        );
        Ok(report)
    }

    /// Write every dirty, non-default value to a fresh slot
    ///
    /// Each value is read with its own consistent snapshot; no lock spans
    /// the registry. On failure the previous store stays active and the
    /// registry keeps reporting `needs_save`.
    pub fn save(&mut self, registry: &ParameterRegistry) -> Result<SaveReport, PersistenceError> {
        match self.try_save(registry) {
            Ok(report) => {
                self.stats.total_saves += 1;
                crate::log_info!(
                    "Saved {} parameters to slot {} (seq {})",
                    report.records,
                    report.slot,
                    report.sequence
                );
                Ok(report)
            }
            Err(e) => {
                self.stats.failed_saves += 1;
                crate::log_error!("Parameter save failed: {}", e.as_str());
                Err(e)
            }
        }
    }

    fn try_save(&mut self, registry: &ParameterRegistry) -> Result<SaveReport, PersistenceError> {
        // Read before the snapshot: writes racing with this save stay unsaved.
        let generation = registry.generation();

        let mut records: heapless::Vec<PersistedRecord, MAX_PARAMS> = heapless::Vec::new();
        for state in registry.states().filter(|s| s.should_persist()) {
            let name = state
                .descriptor
                .key()
                .map_err(|_| PersistenceError::StoreFull)?;
            records
                .push(PersistedRecord::new(name, state.value))
                .map_err(|_| PersistenceError::StoreFull)?;
        }

        let header = StoreHeader::new(0, records.len() as u32);
        let total = header
            .total_len()
            .map_err(|_| PersistenceError::StoreFull)?;
        if total > self.layout.slot_size as usize {
            return Err(PersistenceError::StoreFull);
        }

        if !self.scanned {
            self.find_active_slot()?;
        }
        let (slot, sequence) = match self.active {
            Some((slot, seq)) => ((slot + 1) % self.layout.slot_count, seq.wrapping_add(1)),
            None => (0, 1),
        };
        let header = StoreHeader { sequence, ..header };
        let address = self.layout.slot_address(slot);

        self.flash.erase(address, self.layout.slot_size)?;
        self.stats.erase_counts[slot as usize] += 1;

        let mut checksum = StoreChecksum::new();
        let header_bytes = header.to_bytes();
        self.flash.write(address, &header_bytes)?;
        checksum.update(&header_bytes);

        let mut offset = HEADER_LEN;
        let mut chunk = [0u8; RECORDS_PER_CHUNK * RECORD_LEN];
        for group in records.chunks(RECORDS_PER_CHUNK) {
            let len = group.len() * RECORD_LEN;
            for (record, out) in group.iter().zip(chunk.chunks_mut(RECORD_LEN)) {
                record
                    .encode(out)
                    .map_err(|_| PersistenceError::StoreFull)?;
            }
            self.flash.write(address + offset as u32, &chunk[..len])?;
            checksum.update(&chunk[..len]);
            offset += len;
        }

        // Commit point
        let crc = checksum.finalize();
        self.flash.write(address + offset as u32, &crc.to_le_bytes())?;
        self.flash.sync()?;

        self.set_active(Some((slot, sequence)));
        registry.mark_saved(generation);

        Ok(SaveReport {
            slot,
            sequence,
            records: records.len(),
            bytes: total,
        })
    }

    /// Save only if the registry changed since the last save or load
    pub fn save_if_needed(
        &mut self,
        registry: &ParameterRegistry,
    ) -> Result<Option<SaveReport>, PersistenceError> {
        if !registry.needs_save() {
            crate::log_debug!("No modified parameters, skipping save");
            return Ok(None);
        }
        self.save(registry).map(Some)
    }

    /// Erase every slot (factory reset of the store)
    ///
    /// The registry is untouched; call `reset_all` on it as well to return
    /// to defaults.
    pub fn erase_all(&mut self) -> Result<(), PersistenceError> {
        for slot in 0..self.layout.slot_count {
            self.flash
                .erase(self.layout.slot_address(slot), self.layout.slot_size)?;
            self.stats.erase_counts[slot as usize] += 1;
        }
        self.set_active(None);
        crate::log_info!("Parameter store erased");
        Ok(())
    }

    /// Storage statistics
    pub fn stats(&self) -> StorageStats {
        self.stats
    }

    /// Layout in use
    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Flash interface reference (for testing)
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the medium
    pub fn into_flash(self) -> F {
        self.flash
    }
}

//! Lock-free value cell
//!
//! Each parameter owns one [`ValueCell`]: the raw 32-bit value, a sequence
//! counter and the dirty flag. The sequence counter is a seqlock:
//!
//! - even: no writer inside, `seq / 2` is the value's version
//! - odd: a writer holds the cell
//!
//! Readers never lock. They retry only while a writer is inside its critical
//! section, which is a handful of stores. Writers acquire the cell by moving
//! `seq` from even to odd with a CAS, so writers to the same parameter are
//! serialized while writers to different parameters never interact.
//!
//! A writer that does not change the value releases the cell with the
//! original sequence, so the version counts successful writes only.

use core::hint::spin_loop;
use core::sync::atomic::{fence, AtomicBool, AtomicU32, Ordering};

/// Consistent (value, version) pair read from a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Raw value bits
    pub bits: u32,
    /// Number of successful writes since creation
    pub version: u32,
    /// Dirty flag at the time of the read
    pub dirty: bool,
}

/// Single-parameter storage slot
#[derive(Debug)]
pub struct ValueCell {
    seq: AtomicU32,
    bits: AtomicU32,
    dirty: AtomicBool,
}

impl ValueCell {
    /// Create a cell holding `bits` at version 0, clean
    pub const fn new(bits: u32) -> Self {
        Self {
            seq: AtomicU32::new(0),
            bits: AtomicU32::new(bits),
            dirty: AtomicBool::new(false),
        }
    }

    /// Read a consistent snapshot without blocking
    pub fn read(&self) -> CellSnapshot {
        loop {
            let start = self.seq.load(Ordering::Acquire);
            if start & 1 == 1 {
                spin_loop();
                continue;
            }

            let bits = self.bits.load(Ordering::Relaxed);
            let dirty = self.dirty.load(Ordering::Relaxed);
            fence(Ordering::Acquire);

            if self.seq.load(Ordering::Relaxed) == start {
                return CellSnapshot {
                    bits,
                    version: start >> 1,
                    dirty,
                };
            }
            spin_loop();
        }
    }

    /// Current version without reading the value
    pub fn version(&self) -> u32 {
        loop {
            let seq = self.seq.load(Ordering::Acquire);
            if seq & 1 == 0 {
                return seq >> 1;
            }
            spin_loop();
        }
    }

    /// Acquire the cell for writing
    ///
    /// Spins only while another writer of this same cell is inside its
    /// critical section.
    pub fn lock(&self) -> CellGuard<'_> {
        loop {
            let start = self.seq.load(Ordering::Relaxed);
            if start & 1 == 0
                && self
                    .seq
                    .compare_exchange_weak(start, start | 1, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                fence(Ordering::Release);
                return CellGuard {
                    cell: self,
                    start,
                    written: false,
                };
            }
            spin_loop();
        }
    }
}

/// Exclusive write access to a [`ValueCell`]
///
/// Dropping the guard publishes the write. The version advances only if
/// [`CellGuard::store`] was called.
#[derive(Debug)]
pub struct CellGuard<'a> {
    cell: &'a ValueCell,
    start: u32,
    written: bool,
}

impl CellGuard<'_> {
    /// Current raw value
    pub fn bits(&self) -> u32 {
        self.cell.bits.load(Ordering::Relaxed)
    }

    /// Current dirty flag
    pub fn dirty(&self) -> bool {
        self.cell.dirty.load(Ordering::Relaxed)
    }

    /// Version the cell had when the guard was taken
    pub fn version(&self) -> u32 {
        self.start >> 1
    }

    /// Version the cell will have once the guard is dropped
    pub fn next_version(&self) -> u32 {
        if self.written {
            self.start.wrapping_add(2) >> 1
        } else {
            self.version()
        }
    }

    /// Replace the value (counts as a write)
    pub fn store(&mut self, bits: u32) {
        self.cell.bits.store(bits, Ordering::Relaxed);
        self.written = true;
    }

    /// Change the dirty flag (does not count as a write)
    pub fn set_dirty(&mut self, dirty: bool) {
        self.cell.dirty.store(dirty, Ordering::Relaxed);
    }
}

impl Drop for CellGuard<'_> {
    fn drop(&mut self) {
        let release = if self.written {
            self.start.wrapping_add(2)
        } else {
            self.start
        };
        self.cell.seq.store(release, Ordering::Release);
    }
}

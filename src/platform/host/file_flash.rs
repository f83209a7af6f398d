//! File-backed flash for host builds
//!
//! Emulates a flash part inside a regular file so parameters survive process
//! restarts on a development machine. The file is created (or extended) with
//! erased 0xFF bytes and writes only clear bits, matching real flash.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::platform::{error::FlashError, traits::FlashInterface, PlatformError, Result};

/// Default emulated block size (4 KB)
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Default emulated capacity (covers the default parameter layout)
pub const DEFAULT_CAPACITY: u32 = 0x080000;

/// Flash emulated in a file
#[derive(Debug)]
pub struct FileFlash {
    file: File,
    block_size: u32,
    capacity: u32,
}

impl FileFlash {
    /// Open `path` with the default geometry
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, DEFAULT_CAPACITY, DEFAULT_BLOCK_SIZE)
    }

    /// Open `path`, creating it or extending it to `capacity` erased bytes
    ///
    /// Existing content inside `capacity` is kept.
    pub fn open_with(path: impl AsRef<Path>, capacity: u32, block_size: u32) -> Result<Self> {
        if block_size == 0 || capacity == 0 || capacity % block_size != 0 {
            return Err(PlatformError::InvalidConfig);
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())
            .map_err(|_| PlatformError::ResourceUnavailable)?;

        let len = file
            .metadata()
            .map_err(|_| PlatformError::ResourceUnavailable)?
            .len();
        if len < capacity as u64 {
            file.seek(SeekFrom::Start(len))
                .map_err(|_| FlashError::WriteFailed)?;
            let fill = vec![0xFF; (capacity as u64 - len) as usize];
            file.write_all(&fill).map_err(|_| FlashError::WriteFailed)?;
            file.sync_data().map_err(|_| FlashError::WriteFailed)?;
        }

        Ok(Self {
            file,
            block_size,
            capacity,
        })
    }

    fn check_range(&self, address: u32, len: usize) -> Result<()> {
        if address as u64 + len as u64 > self.capacity as u64 {
            return Err(FlashError::InvalidAddress.into());
        }
        Ok(())
    }

    fn read_at(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(address as u64))
            .map_err(|_| FlashError::ReadFailed)?;
        self.file
            .read_exact(buf)
            .map_err(|_| FlashError::ReadFailed.into())
    }

    fn write_at(&mut self, address: u32, data: &[u8], error: FlashError) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(address as u64))
            .map_err(|_| error)?;
        self.file.write_all(data).map_err(|_| error.into())
    }
}

impl FlashInterface for FileFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(address, buf.len())?;
        self.read_at(address, buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.check_range(address, data.len())?;

        // Flash can only change bits from 1→0
        let mut merged = vec![0u8; data.len()];
        self.read_at(address, &mut merged)?;
        for (cell, byte) in merged.iter_mut().zip(data) {
            *cell &= *byte;
        }
        self.write_at(address, &merged, FlashError::WriteFailed)
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if address % self.block_size != 0 || size % self.block_size != 0 {
            return Err(FlashError::InvalidAddress.into());
        }
        self.check_range(address, size as usize)?;

        let erased = vec![0xFF; size as usize];
        self.write_at(address, &erased, FlashError::EraseFailed)
    }

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn sync(&mut self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|_| FlashError::WriteFailed.into())
    }
}

//! Mock Flash implementation for testing
//!
//! In-memory flash with fault injection for persistence tests.

use crate::platform::{error::FlashError, traits::FlashInterface, Result};

/// Flash block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Flash capacity (4 MB, same as Pico 2 W)
const FLASH_CAPACITY: u32 = 4 * 1024 * 1024;

/// Minimum firmware size (protect first 256 KB)
const FIRMWARE_SIZE: u32 = 0x40000;

/// Pending power-loss injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PowerState {
    On,
    /// Power drops during the write after this many more complete writes
    FailAfter(u32),
    /// Power is gone; writes and erases fail until restored
    Off,
}

/// Mock Flash implementation
///
/// Simulates Flash storage in memory. Supports:
/// - Read/write/erase with 1→0-only writes and firmware-region protection
/// - Corruption injection
/// - Erase count tracking per block
/// - Power loss part way through a write sequence
/// - Hard write failures
/// - One-shot read failures
///
/// # Example
///
/// ```
/// use mpc_params::platform::mock::MockFlash;
/// use mpc_params::platform::traits::FlashInterface;
///
/// let mut flash = MockFlash::new();
/// flash.erase(0x040000, 4096).unwrap();
///
/// let data = *b"PARA";
/// flash.write(0x040000, &data).unwrap();
///
/// let mut buf = [0u8; 4];
/// flash.read(0x040000, &mut buf).unwrap();
/// assert_eq!(buf, data);
/// assert_eq!(flash.erase_count(0x040000), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: Vec<u8>,
    /// Erase count per block
    erase_counts: Vec<u32>,
    power: PowerState,
    /// Fail the next write without touching storage
    fail_next_write: bool,
    /// Reads left before one read fails
    fail_read_in: Option<u32>,
    writes: u32,
    syncs: u32,
}

impl MockFlash {
    /// Create a new erased mock Flash instance
    pub fn new() -> Self {
        let block_count = (FLASH_CAPACITY / BLOCK_SIZE) as usize;
        Self {
            storage: vec![0xFF; FLASH_CAPACITY as usize],
            erase_counts: vec![0; block_count],
            power: PowerState::On,
            fail_next_write: false,
            fail_read_in: None,
            writes: 0,
            syncs: 0,
        }
    }

    /// Flash contents (for test verification)
    pub fn contents(&self, address: u32, len: usize) -> &[u8] {
        &self.storage[address as usize..address as usize + len]
    }

    /// Flip bits (XOR 0xAA) regardless of erase state
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        for byte in &mut self.storage[address as usize..address as usize + len] {
            *byte ^= 0xAA;
        }
    }

    /// Overwrite bytes with exact content regardless of erase state
    pub fn poke(&mut self, address: u32, data: &[u8]) {
        self.storage[address as usize..address as usize + data.len()].copy_from_slice(data);
    }

    /// Number of times the block containing `address` was erased
    pub fn erase_count(&self, address: u32) -> u32 {
        self.erase_counts[(address / BLOCK_SIZE) as usize]
    }

    /// Total erase count across all blocks
    pub fn total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Completed write calls
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// Completed sync calls
    pub fn sync_count(&self) -> u32 {
        self.syncs
    }

    /// Lose power part way through a later write
    ///
    /// `writes` more writes complete normally; the next one stores only its
    /// first half, then every write and erase fails until
    /// [`restore_power`](Self::restore_power).
    pub fn simulate_power_loss_after(&mut self, writes: u32) {
        self.power = PowerState::FailAfter(writes);
    }

    /// Power back on (a reboot from the medium's point of view)
    pub fn restore_power(&mut self) {
        self.power = PowerState::On;
    }

    /// True while simulated power is off
    pub fn is_powered_off(&self) -> bool {
        self.power == PowerState::Off
    }

    /// Fail the next write with `WriteFailed` without modifying storage
    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }

    /// Let `reads` more reads succeed, then fail one with `ReadFailed`
    pub fn fail_read_after(&mut self, reads: u32) {
        self.fail_read_in = Some(reads);
    }

    fn check_range(&self, address: u32, len: usize) -> Result<()> {
        let end = address as usize + len;
        if address >= FLASH_CAPACITY || end > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }
        Ok(())
    }

    fn is_writable(&self, address: u32) -> bool {
        (FIRMWARE_SIZE..FLASH_CAPACITY).contains(&address)
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(address, buf.len())?;
        match self.fail_read_in {
            Some(0) => {
                self.fail_read_in = None;
                return Err(FlashError::ReadFailed.into());
            }
            Some(n) => self.fail_read_in = Some(n - 1),
            None => {}
        }
        buf.copy_from_slice(&self.storage[address as usize..address as usize + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if !self.is_writable(address) {
            return Err(FlashError::InvalidAddress.into());
        }
        self.check_range(address, data.len())?;

        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(FlashError::WriteFailed.into());
        }

        let write_len = match self.power {
            PowerState::On => data.len(),
            PowerState::FailAfter(0) => {
                self.power = PowerState::Off;
                data.len() / 2
            }
            PowerState::FailAfter(n) => {
                self.power = PowerState::FailAfter(n - 1);
                data.len()
            }
            PowerState::Off => 0,
        };

        // Flash can only change bits from 1→0
        let start = address as usize;
        for (cell, byte) in self.storage[start..start + write_len]
            .iter_mut()
            .zip(data)
        {
            *cell &= *byte;
        }

        if write_len < data.len() {
            return Err(FlashError::WriteFailed.into());
        }
        self.writes += 1;
        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.is_writable(address)
            || address % BLOCK_SIZE != 0
            || size % BLOCK_SIZE != 0
            || address as u64 + size as u64 > FLASH_CAPACITY as u64
        {
            return Err(FlashError::InvalidAddress.into());
        }
        if self.power == PowerState::Off {
            return Err(FlashError::EraseFailed.into());
        }

        let start = address as usize;
        self.storage[start..start + size as usize].fill(0xFF);

        let first_block = (address / BLOCK_SIZE) as usize;
        for count in &mut self.erase_counts[first_block..first_block + (size / BLOCK_SIZE) as usize] {
            *count += 1;
        }
        Ok(())
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    fn capacity(&self) -> u32 {
        FLASH_CAPACITY
    }

    fn sync(&mut self) -> Result<()> {
        if self.power == PowerState::Off {
            return Err(FlashError::WriteFailed.into());
        }
        self.syncs += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    #[test]
    fn test_mock_flash_read_write() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();

        let data = [0x50, 0x41, 0x52, 0x41];
        flash.write(0x040000, &data).unwrap();

        let mut buf = [0u8; 4];
        flash.read(0x040000, &mut buf).unwrap();
        assert_eq!(buf, data);
        assert_eq!(flash.write_count(), 1);
    }

    #[test]
    fn test_mock_flash_erase_count() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 8192).unwrap();
        flash.erase(0x040000, 4096).unwrap();

        assert_eq!(flash.erase_count(0x040000), 2);
        assert_eq!(flash.erase_count(0x041000), 1);
        assert_eq!(flash.total_erase_count(), 3);
        assert!(flash.contents(0x040000, 8192).iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_mock_flash_invalid_address() {
        let mut flash = MockFlash::new();

        // Firmware region is protected
        assert_eq!(
            flash.write(0x000000, &[0x00; 4]),
            Err(PlatformError::Flash(FlashError::InvalidAddress))
        );

        let mut buf = [0u8; 4];
        assert!(flash.read(FLASH_CAPACITY, &mut buf).is_err());
        assert!(flash.read(FLASH_CAPACITY - 2, &mut buf).is_err());

        // Unaligned erase
        assert!(flash.erase(0x040100, 4096).is_err());
        assert!(flash.erase(0x040000, 1024).is_err());
    }

    #[test]
    fn test_mock_flash_write_only_clears_bits() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();

        flash.write(0x040000, &[0x0F]).unwrap();
        flash.write(0x040000, &[0xFF]).unwrap();

        let mut buf = [0u8; 1];
        flash.read(0x040000, &mut buf).unwrap();
        assert_eq!(buf[0], 0x0F);
    }

    #[test]
    fn test_mock_flash_power_loss_after_writes() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();
        flash.simulate_power_loss_after(1);

        flash.write(0x040000, &[0x11; 16]).unwrap();
        assert!(flash.write(0x040010, &[0x22; 16]).is_err());
        assert!(flash.is_powered_off());

        // Half of the interrupted write landed
        assert_eq!(flash.contents(0x040010, 8), &[0x22; 8]);
        assert_eq!(flash.contents(0x040018, 8), &[0xFF; 8]);

        // Nothing else gets through until power returns
        assert!(flash.write(0x040020, &[0x33; 4]).is_err());
        assert!(flash.erase(0x041000, 4096).is_err());
        assert!(flash.sync().is_err());

        flash.restore_power();
        flash.write(0x040020, &[0x33; 4]).unwrap();
    }

    #[test]
    fn test_mock_flash_fail_next_write() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();
        flash.fail_next_write();

        assert_eq!(
            flash.write(0x040000, &[0; 4]),
            Err(PlatformError::Flash(FlashError::WriteFailed))
        );
        assert_eq!(flash.contents(0x040000, 4), &[0xFF; 4]);
        flash.write(0x040000, &[0; 4]).unwrap();
    }

    #[test]
    fn test_mock_flash_fail_read_after() {
        let mut flash = MockFlash::new();
        flash.fail_read_after(1);

        let mut buf = [0u8; 4];
        flash.read(0x040000, &mut buf).unwrap();
        assert_eq!(
            flash.read(0x040000, &mut buf),
            Err(PlatformError::Flash(FlashError::ReadFailed))
        );
        flash.read(0x040000, &mut buf).unwrap();
    }

    #[test]
    fn test_mock_flash_inject_corruption() {
        let mut flash = MockFlash::new();
        flash.erase(0x040000, 4096).unwrap();
        flash.write(0x040000, &[0x00; 4]).unwrap();
        flash.inject_corruption(0x040000, 2);
        assert_eq!(flash.contents(0x040000, 4), &[0xAA, 0xAA, 0x00, 0x00]);
    }
}

//! Flash interface trait
//!
//! The persistent store lives on a flash-like medium: block-erasable, with
//! writes that can only clear bits.

use crate::platform::Result;

/// Flash interface trait
///
/// # Flash Characteristics
///
/// - Flash is organized in blocks (typically 4 KB on RP2040/RP2350)
/// - Erase operations set all bytes to 0xFF
/// - Write operations can only change bits from 1→0 (must erase first to reset to 1)
/// - Flash operations are blocking and can take 100ms+ (run them from a low-priority task)
///
/// # Memory Layout (RP2040/RP2350)
///
/// ```text
/// [Firmware]          0x000000 - 0x040000 (256 KB) - DO NOT WRITE
/// [Parameter Slot 0]  0x040000 - 0x042000 (8 KB)
/// [Parameter Slot 1]  0x042000 - 0x044000 (8 KB)
/// [Parameter Slot 2]  0x044000 - 0x046000 (8 KB)
/// [Parameter Slot 3]  0x046000 - 0x048000 (8 KB)
/// ```
pub trait FlashInterface {
    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if the range is out of bounds,
    /// `FlashError::ReadFailed` if the medium fails.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `address`
    ///
    /// The target range must have been erased; writing can only clear bits.
    ///
    /// # Errors
    ///
    /// `FlashError::InvalidAddress` if the range is protected or out of
    /// bounds, `FlashError::WriteFailed` if the medium fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `address` to 0xFF
    ///
    /// Both `address` and `size` must be multiples of [`block_size`](Self::block_size).
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Minimum erasable unit in bytes
    fn block_size(&self) -> u32;

    /// Total capacity in bytes
    fn capacity(&self) -> u32;

    /// Make completed writes durable
    ///
    /// Raw flash is durable once `write` returns. Media with a write cache
    /// (host files) override this.
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F: FlashInterface + ?Sized> FlashInterface for &mut F {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(address, buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        (**self).erase(address, size)
    }

    fn block_size(&self) -> u32 {
        (**self).block_size()
    }

    fn capacity(&self) -> u32 {
        (**self).capacity()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}

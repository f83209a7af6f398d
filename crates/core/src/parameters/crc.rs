//! CRC32 for parameter store integrity
//!
//! The store trailer is a CRC-32-ISO-HDLC (polynomial 0x04C11DB7, as used by
//! Ethernet and ZIP) over the header and all records. A slot whose trailer
//! does not match is treated as never written.

use crc::{Crc, Digest, CRC_32_ISO_HDLC};

/// CRC32 algorithm (ISO HDLC / Ethernet / ZIP)
static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Calculate the CRC32 of a contiguous buffer
///
/// # Example
///
/// ```
/// use mpc_params_core::parameters::crc::calculate_crc32;
///
/// assert_eq!(calculate_crc32(b"123456789"), 0xCBF43926);
/// ```
pub fn calculate_crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Incremental CRC32 over data written or read in chunks
pub struct StoreChecksum {
    digest: Digest<'static, u32>,
}

impl StoreChecksum {
    /// Start a new checksum
    pub fn new() -> Self {
        Self {
            digest: CRC32.digest(),
        }
    }

    /// Feed the next chunk
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Final CRC value
    pub fn finalize(self) -> u32 {
        self.digest.finalize()
    }
}

impl Default for StoreChecksum {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        let test_cases = [
            (b"" as &[u8], 0x00000000u32),
            (b"a", 0xE8B7BE43),
            (b"abc", 0x352441C2),
            (b"123456789", 0xCBF43926),
        ];

        for (data, expected) in test_cases {
            assert_eq!(calculate_crc32(data), expected);
        }
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let data = b"PARA header followed by records";
        let mut checksum = StoreChecksum::new();
        for chunk in data.chunks(5) {
            checksum.update(chunk);
        }
        assert_eq!(checksum.finalize(), calculate_crc32(data));
    }

    #[test]
    fn test_bit_flip_changes_crc() {
        let mut data = *b"MPC_THR_MIN\0\0\0\0\0";
        let crc = calculate_crc32(&data);

        data[3] ^= 0x01;
        assert_ne!(calculate_crc32(&data), crc);
    }
}

//! Persisted store format
//!
//! ```text
//! header (16 bytes, little endian)
//!   [0..2)   format version
//!   [2..6)   record count
//!   [6..8)   sequence number (wraps)
//!   [8..10)  record length (stride)
//!   [10..12) header length
//!   [12..16) magic "PARA"
//! records (count * record length)
//!   [0..16)  name, NUL padded
//!   [16]     type tag
//!   [17..21) value bits
//! trailer
//!   crc32 over header and records
//! ```
//!
//! Readers honor the header and record lengths written by the store, so a
//! store written by a newer format version with a longer header or wider
//! records is read for the fields known here.

use super::descriptor::{make_name, ParamName, PARAM_NAME_LEN};
use super::error::RecordError;
use super::value::{ParamType, ParamValue, RawValue};

/// Magic number for parameter stores ("PARA")
pub const STORE_MAGIC: [u8; 4] = *b"PARA";

/// Format version written by this crate
pub const FORMAT_VERSION: u16 = 1;

/// Header length written by this crate
pub const HEADER_LEN: usize = 16;

/// Record length written by this crate
pub const RECORD_LEN: usize = PARAM_NAME_LEN + 1 + 4;

/// CRC trailer length
pub const CRC_LEN: usize = 4;

/// Store header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreHeader {
    /// Format version
    pub version: u16,
    /// Save sequence number
    pub sequence: u16,
    /// Number of records
    pub count: u32,
    /// Bytes per record
    pub record_len: u16,
    /// Bytes in the header, including fields unknown to this version
    pub header_len: u16,
}

impl StoreHeader {
    /// Header for a store written by this crate
    pub const fn new(sequence: u16, count: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            sequence,
            count,
            record_len: RECORD_LEN as u16,
            header_len: HEADER_LEN as u16,
        }
    }

    /// Serialize to the fixed 16-byte prefix
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.version.to_le_bytes());
        buf[2..6].copy_from_slice(&self.count.to_le_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_le_bytes());
        buf[8..10].copy_from_slice(&self.record_len.to_le_bytes());
        buf[10..12].copy_from_slice(&self.header_len.to_le_bytes());
        buf[12..16].copy_from_slice(&STORE_MAGIC);
        buf
    }

    /// Parse a header from the start of `buf`
    ///
    /// Only the first 16 bytes are read. Newer versions are accepted as long
    /// as their header and record lengths can hold the fields known here.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() < HEADER_LEN {
            return Err(RecordError::Truncated);
        }
        if buf[12..16] != STORE_MAGIC {
            return Err(RecordError::BadMagic);
        }

        let header = Self {
            version: u16::from_le_bytes([buf[0], buf[1]]),
            count: u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]),
            sequence: u16::from_le_bytes([buf[6], buf[7]]),
            record_len: u16::from_le_bytes([buf[8], buf[9]]),
            header_len: u16::from_le_bytes([buf[10], buf[11]]),
        };

        if header.version == 0 {
            return Err(RecordError::UnsupportedVersion);
        }
        if (header.header_len as usize) < HEADER_LEN || (header.record_len as usize) < RECORD_LEN {
            return Err(RecordError::BadLayout);
        }
        Ok(header)
    }

    /// Bytes covered by the CRC: header plus records
    pub fn body_len(&self) -> Result<usize, RecordError> {
        (self.count as usize)
            .checked_mul(self.record_len as usize)
            .and_then(|records| records.checked_add(self.header_len as usize))
            .ok_or(RecordError::Overflow)
    }

    /// Total bytes including the CRC trailer
    pub fn total_len(&self) -> Result<usize, RecordError> {
        self.body_len()?
            .checked_add(CRC_LEN)
            .ok_or(RecordError::Overflow)
    }

    /// Offset of record `index` from the start of the store
    pub fn record_offset(&self, index: u32) -> usize {
        self.header_len as usize + index as usize * self.record_len as usize
    }
}

/// One persisted (name, type tag, bits) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    /// Parameter name
    pub name: ParamName,
    /// Raw type tag; may be unknown to this version
    pub type_tag: u8,
    /// Little-endian value bits
    pub raw: u32,
}

impl PersistedRecord {
    /// Record for a resident value
    pub fn new(name: ParamName, value: ParamValue) -> Self {
        Self {
            name,
            type_tag: value.param_type().tag(),
            raw: value.to_bits(),
        }
    }

    /// Serialize into the first `RECORD_LEN` bytes of `buf`
    pub fn encode(&self, buf: &mut [u8]) -> Result<(), RecordError> {
        if buf.len() < RECORD_LEN {
            return Err(RecordError::Truncated);
        }
        let name = self.name.as_bytes();
        buf[..PARAM_NAME_LEN].fill(0);
        buf[..name.len()].copy_from_slice(name);
        buf[PARAM_NAME_LEN] = self.type_tag;
        buf[PARAM_NAME_LEN + 1..RECORD_LEN].copy_from_slice(&self.raw.to_le_bytes());
        Ok(())
    }

    /// Parse the first `RECORD_LEN` bytes of `buf`; trailing bytes are ignored
    pub fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() < RECORD_LEN {
            return Err(RecordError::Truncated);
        }

        let name_bytes = &buf[..PARAM_NAME_LEN];
        let end = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PARAM_NAME_LEN);
        // Padding must be all NUL
        if name_bytes[end..].iter().any(|&b| b != 0) {
            return Err(RecordError::InvalidName);
        }
        let name = core::str::from_utf8(&name_bytes[..end])
            .ok()
            .and_then(|s| make_name(s).ok())
            .ok_or(RecordError::InvalidName)?;

        let raw = u32::from_le_bytes([
            buf[PARAM_NAME_LEN + 1],
            buf[PARAM_NAME_LEN + 2],
            buf[PARAM_NAME_LEN + 3],
            buf[PARAM_NAME_LEN + 4],
        ]);

        Ok(Self {
            name,
            type_tag: buf[PARAM_NAME_LEN],
            raw,
        })
    }

    /// Decoded type, if the tag is known
    pub fn param_type(&self) -> Option<ParamType> {
        ParamType::from_tag(self.type_tag)
    }

    /// Value as a validator input, if the tag is known
    pub fn value(&self) -> Option<RawValue> {
        self.param_type()
            .map(|ty| RawValue::from(ParamValue::from_bits(self.raw, ty)))
    }
}

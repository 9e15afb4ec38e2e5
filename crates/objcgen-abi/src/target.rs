//! Target data layout: scalar widths and byte order.

use serde::{Deserialize, Serialize};

/// Width of `int` on every supported target.
pub const INT_SIZE: u8 = 4;
/// Width of `short` on every supported target.
pub const SHORT_SIZE: u8 = 2;

/// Scalar widths and endianness of the platform the metadata is built for.
///
/// Alignment is natural: every scalar aligns to its own size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetData {
    pub pointer_size: u8,
    pub long_size: u8,
    #[serde(default)]
    pub big_endian: bool,
}

impl TargetData {
    /// 64-bit Unix: 8-byte pointers and longs.
    pub const LP64: Self = Self {
        pointer_size: 8,
        long_size: 8,
        big_endian: false,
    };

    /// 32-bit targets: 4-byte pointers and longs.
    pub const ILP32: Self = Self {
        pointer_size: 4,
        long_size: 4,
        big_endian: false,
    };

    /// 64-bit Windows: 8-byte pointers, 4-byte longs.
    pub const LLP64: Self = Self {
        pointer_size: 8,
        long_size: 4,
        big_endian: false,
    };

    /// Whether the widths are ones the encoder can write.
    pub fn is_supported(&self) -> bool {
        matches!(self.pointer_size, 4 | 8) && matches!(self.long_size, 4 | 8)
    }

    /// Number of bits in a pointer-sized word.
    pub fn pointer_bits(&self) -> u32 {
        self.pointer_size as u32 * 8
    }

    /// Write `value` truncated to `width` bytes in target byte order.
    pub fn write_int(&self, out: &mut [u8], value: i64, width: usize) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        if self.big_endian {
            out[..width].copy_from_slice(&bytes[8 - width..]);
        } else {
            out[..width].copy_from_slice(&bytes[..width]);
        }
    }

    /// Read a sign-extended integer of `width` bytes in target byte order.
    pub fn read_int(&self, bytes: &[u8], width: usize) -> i64 {
        let mut buf = [0u8; 8];
        if self.big_endian {
            buf[8 - width..].copy_from_slice(&bytes[..width]);
            let shift = (8 - width) * 8;
            (i64::from_be_bytes(buf) << shift) >> shift
        } else {
            buf[..width].copy_from_slice(&bytes[..width]);
            let shift = (8 - width) * 8;
            (i64::from_le_bytes(buf) << shift) >> shift
        }
    }
}

impl Default for TargetData {
    fn default() -> Self {
        Self::LP64
    }
}

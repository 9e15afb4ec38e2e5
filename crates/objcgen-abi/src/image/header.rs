//! Metadata image header (64 bytes).
//!
//! Offsets are computed from counts + SECTION_ALIGN (16 bytes).
//! Section order: Header → Names → CStrings → Data → Symbols → Relocations

use super::{MAGIC, SECTION_ALIGN, VERSION};
use crate::target::TargetData;

/// Symbol index meaning "none".
pub const NO_SYMBOL: u32 = u32::MAX;

/// Size of one symbol record.
pub const SYMBOL_RECORD_SIZE: u32 = 16;
/// Size of one relocation record.
pub const RELOC_RECORD_SIZE: u32 = 16;

/// Image header - first 64 bytes of the file. Always little-endian,
/// independent of the target byte order used inside the data section.
///
/// - 0-35: identity, sizes, and counts (9 × u32)
/// - 36-47: load thunk, entry point, and argument symbol indices (3 × u32)
/// - 48-51: target pointer width, long width, endianness, reserved
/// - 52-63: reserved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Magic bytes: b"OBJM"
    pub magic: [u8; 4],
    /// Format version (currently 1)
    pub version: u32,
    /// CRC32 checksum of everything after the header
    pub checksum: u32,
    /// Total file size in bytes
    pub total_size: u32,
    pub names_size: u32,
    pub cstrings_size: u32,
    pub data_size: u32,
    pub symbols_count: u32,
    pub relocs_count: u32,

    pub thunk_symbol: u32,
    pub entry_symbol: u32,
    pub argument_symbol: u32,

    pub pointer_size: u8,
    pub long_size: u8,
    pub big_endian: bool,

    pub _reserved: [u8; 13],
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: 0,
            total_size: 0,
            names_size: 0,
            cstrings_size: 0,
            data_size: 0,
            symbols_count: 0,
            relocs_count: 0,
            thunk_symbol: NO_SYMBOL,
            entry_symbol: NO_SYMBOL,
            argument_symbol: NO_SYMBOL,
            pointer_size: 8,
            long_size: 8,
            big_endian: false,
            _reserved: [0; 13],
        }
    }
}

/// Computed section offsets derived from header counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionOffsets {
    pub names: u32,
    pub cstrings: u32,
    pub data: u32,
    pub symbols: u32,
    pub relocs: u32,
    /// End of the relocation section, before final padding.
    pub end: u32,
}

impl Header {
    /// Decode header from 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= 64, "header too short");

        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let mut reserved = [0u8; 13];
        reserved.copy_from_slice(&bytes[51..64]);

        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: word(4),
            checksum: word(8),
            total_size: word(12),
            names_size: word(16),
            cstrings_size: word(20),
            data_size: word(24),
            symbols_count: word(28),
            relocs_count: word(32),
            thunk_symbol: word(36),
            entry_symbol: word(40),
            argument_symbol: word(44),
            pointer_size: bytes[48],
            long_size: bytes[49],
            big_endian: bytes[50] != 0,
            _reserved: reserved,
        }
    }

    /// Encode header to 64 bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.total_size.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.names_size.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.cstrings_size.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.data_size.to_le_bytes());
        bytes[28..32].copy_from_slice(&self.symbols_count.to_le_bytes());
        bytes[32..36].copy_from_slice(&self.relocs_count.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.thunk_symbol.to_le_bytes());
        bytes[40..44].copy_from_slice(&self.entry_symbol.to_le_bytes());
        bytes[44..48].copy_from_slice(&self.argument_symbol.to_le_bytes());
        bytes[48] = self.pointer_size;
        bytes[49] = self.long_size;
        bytes[50] = self.big_endian as u8;
        bytes[51..64].copy_from_slice(&self._reserved);
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == VERSION
    }

    pub fn target(&self) -> TargetData {
        TargetData {
            pointer_size: self.pointer_size,
            long_size: self.long_size,
            big_endian: self.big_endian,
        }
    }

    /// Compute section offsets from counts and blob sizes.
    ///
    /// Section order (all 16-byte aligned):
    /// Header → Names → CStrings → Data → Symbols → Relocations
    ///
    /// Returns `None` if any offset does not fit in 32 bits.
    pub fn compute_offsets(&self) -> Option<SectionOffsets> {
        let align = SECTION_ALIGN as u32;

        let names = 64u32;
        let cstrings = align_up(names.checked_add(self.names_size)?, align)?;
        let data = align_up(cstrings.checked_add(self.cstrings_size)?, align)?;
        let symbols = align_up(data.checked_add(self.data_size)?, align)?;
        let relocs = align_up(symbols.checked_add(self.symbols_size()?)?, align)?;
        let end = relocs.checked_add(self.relocs_size()?)?;

        Some(SectionOffsets {
            names,
            cstrings,
            data,
            symbols,
            relocs,
            end,
        })
    }

    /// Byte size of the symbol section.
    pub fn symbols_size(&self) -> Option<u32> {
        self.symbols_count.checked_mul(SYMBOL_RECORD_SIZE)
    }

    /// Byte size of the relocation section.
    pub fn relocs_size(&self) -> Option<u32> {
        self.relocs_count.checked_mul(RELOC_RECORD_SIZE)
    }
}

/// Round up to the next multiple of `align`.
fn align_up(value: u32, align: u32) -> Option<u32> {
    Some(value.checked_add(align - 1)? & !(align - 1))
}

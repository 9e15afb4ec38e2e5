//! Relocatable metadata image: the binary container an `ObjectUnit` is encoded into.
//!
//! The image carries the data bytes of every defined global, laid out at
//! natural alignment for one target, together with the symbol and relocation
//! tables a linker needs to place it. Pointer slots hold zero in the data
//! section; their value comes from the relocation covering them.

mod dump;
mod encoder;
mod header;
mod view;


pub use dump::dump_image;
pub use encoder::{EncodeError, encode};
pub use header::{Header, NO_SYMBOL, RELOC_RECORD_SIZE, SYMBOL_RECORD_SIZE, SectionOffsets};
pub use view::{Image, ImageError, has_magic};

use crate::object::Linkage;

/// Magic bytes at the start of every image.
pub const MAGIC: [u8; 4] = *b"OBJM";
/// Current image format version.
pub const VERSION: u32 = 1;
/// Alignment of every section.
pub const SECTION_ALIGN: usize = 16;

/// What a symbol names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Data,
    Function,
}

impl SymbolKind {
    fn as_u8(self) -> u8 {
        match self {
            SymbolKind::Data => 0,
            SymbolKind::Function => 1,
        }
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SymbolKind::Data),
            1 => Some(SymbolKind::Function),
            _ => None,
        }
    }
}

/// Decoded symbol table entry.
///
/// Layout: `name_offset (u32) | value (u32) | size (u32) | kind (u8) | linkage (u8) | defined (u8) | pad (u8)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolRecord<'a> {
    pub name: &'a str,
    /// Offset of the symbol's bytes inside the data section.
    pub value: u32,
    pub size: u32,
    pub kind: SymbolKind,
    pub linkage: Linkage,
    pub defined: bool,
}

/// What a relocation's `target` field indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelocKind {
    /// Index into the symbol table.
    Symbol,
    /// Byte offset into the C-string section.
    CString,
}

impl RelocKind {
    fn as_u8(self) -> u8 {
        match self {
            RelocKind::Symbol => 0,
            RelocKind::CString => 1,
        }
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RelocKind::Symbol),
            1 => Some(RelocKind::CString),
            _ => None,
        }
    }
}

/// Decoded relocation entry.
///
/// Layout: `offset (u32) | target (u32) | addend (u32) | kind (u8) | width (u8) | pad (u16)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// Offset of the patched slot inside the data section.
    pub offset: u32,
    pub target: u32,
    pub addend: u32,
    pub kind: RelocKind,
    /// Width of the patched slot in bytes.
    pub width: u8,
}

impl Relocation {
    fn to_bytes(self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&self.offset.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.target.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.addend.to_le_bytes());
        bytes[12] = self.kind.as_u8();
        bytes[13] = self.width;
        bytes
    }
}

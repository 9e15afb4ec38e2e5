//! Read-only view over an encoded image.

use super::header::{Header, RELOC_RECORD_SIZE, SYMBOL_RECORD_SIZE, SectionOffsets};
use super::{MAGIC, RelocKind, Relocation, SymbolKind, SymbolRecord, VERSION};
use crate::object::Linkage;
use crate::target::TargetData;

/// Errors when loading an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("file too small: {0} bytes (minimum 64)")]
    FileTooSmall(usize),

    #[error("invalid magic: expected OBJM")]
    InvalidMagic,

    #[error("unsupported version: {0} (expected {VERSION})")]
    UnsupportedVersion(u32),

    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },

    #[error("checksum mismatch: header says {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("truncated {section} section")]
    Truncated { section: &'static str },

    #[error("malformed {what} at index {index}")]
    Malformed { what: &'static str, index: u32 },
}

/// A validated image. Borrowed records are decoded lazily from the bytes.
#[derive(Debug)]
pub struct Image<'a> {
    bytes: &'a [u8],
    header: Header,
    offsets: SectionOffsets,
}

impl<'a> Image<'a> {
    /// Validate `bytes` and wrap them.
    ///
    /// Checks size, magic, version, declared total size, checksum, and that
    /// every section fits; symbol and relocation records are checked on access.
    pub fn load(bytes: &'a [u8]) -> Result<Self, ImageError> {
        if bytes.len() < 64 {
            return Err(ImageError::FileTooSmall(bytes.len()));
        }

        let header = Header::from_bytes(&bytes[..64]);
        if !header.validate_magic() {
            return Err(ImageError::InvalidMagic);
        }
        if !header.validate_version() {
            return Err(ImageError::UnsupportedVersion(header.version));
        }
        if header.total_size as usize != bytes.len() {
            return Err(ImageError::SizeMismatch {
                header: header.total_size,
                actual: bytes.len(),
            });
        }

        let actual = crc32fast::hash(&bytes[64..]);
        if actual != header.checksum {
            return Err(ImageError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        let offsets = header
            .compute_offsets()
            .ok_or(ImageError::Truncated { section: "header" })?;
        let sections = [
            ("names", offsets.names, Some(header.names_size)),
            ("cstrings", offsets.cstrings, Some(header.cstrings_size)),
            ("data", offsets.data, Some(header.data_size)),
            ("symbols", offsets.symbols, header.symbols_size()),
            ("relocations", offsets.relocs, header.relocs_size()),
        ];
        for (section, start, len) in sections {
            let end = len.and_then(|len| (start as usize).checked_add(len as usize));
            if end.is_none_or(|end| end > bytes.len()) {
                return Err(ImageError::Truncated { section });
            }
        }

        Ok(Self {
            bytes,
            header,
            offsets,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn target(&self) -> TargetData {
        self.header.target()
    }

    /// Data section bytes. Pointer slots are zero; see `relocations`.
    pub fn data(&self) -> &'a [u8] {
        self.section(self.offsets.data, self.header.data_size)
    }

    pub fn symbol_count(&self) -> u32 {
        self.header.symbols_count
    }

    pub fn relocation_count(&self) -> u32 {
        self.header.relocs_count
    }

    /// Decode symbol `index`.
    pub fn symbol(&self, index: u32) -> Result<SymbolRecord<'a>, ImageError> {
        let malformed = ImageError::Malformed {
            what: "symbol",
            index,
        };
        if index >= self.header.symbols_count {
            return Err(malformed);
        }
        let at = self.offsets.symbols as usize + index as usize * SYMBOL_RECORD_SIZE as usize;
        let record = &self.bytes[at..at + SYMBOL_RECORD_SIZE as usize];

        let name_offset = word(record, 0);
        let name = self.names_entry(name_offset).ok_or(malformed.clone())?;
        let kind = SymbolKind::from_u8(record[12]).ok_or(malformed.clone())?;
        let linkage = Linkage::from_u8(record[13]).ok_or(malformed)?;

        Ok(SymbolRecord {
            name,
            value: word(record, 4),
            size: word(record, 8),
            kind,
            linkage,
            defined: record[14] != 0,
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = Result<SymbolRecord<'a>, ImageError>> + '_ {
        (0..self.header.symbols_count).map(|i| self.symbol(i))
    }

    /// Find a symbol by name.
    pub fn find_symbol(&self, name: &str) -> Option<SymbolRecord<'a>> {
        self.symbols().filter_map(Result::ok).find(|s| s.name == name)
    }

    /// Decode relocation `index`.
    pub fn relocation(&self, index: u32) -> Result<Relocation, ImageError> {
        let malformed = ImageError::Malformed {
            what: "relocation",
            index,
        };
        if index >= self.header.relocs_count {
            return Err(malformed);
        }
        let at = self.offsets.relocs as usize + index as usize * RELOC_RECORD_SIZE as usize;
        let record = &self.bytes[at..at + RELOC_RECORD_SIZE as usize];
        let kind = RelocKind::from_u8(record[12]).ok_or(malformed)?;

        Ok(Relocation {
            offset: word(record, 0),
            target: word(record, 4),
            addend: word(record, 8),
            kind,
            width: record[13],
        })
    }

    pub fn relocations(&self) -> impl Iterator<Item = Result<Relocation, ImageError>> + '_ {
        (0..self.header.relocs_count).map(|i| self.relocation(i))
    }

    /// The NUL-terminated string starting at `offset` in the C-string section.
    pub fn cstring(&self, offset: u32) -> Option<&'a str> {
        let section = self.section(self.offsets.cstrings, self.header.cstrings_size);
        nul_terminated(section, offset)
    }

    fn names_entry(&self, offset: u32) -> Option<&'a str> {
        let section = self.section(self.offsets.names, self.header.names_size);
        nul_terminated(section, offset)
    }

    /// Bounds were checked by `load`.
    fn section(&self, start: u32, len: u32) -> &'a [u8] {
        let start = start as usize;
        &self.bytes[start..start + len as usize]
    }
}

/// Whether `bytes` start with the image magic.
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == MAGIC
}

fn word(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn nul_terminated(section: &[u8], offset: u32) -> Option<&str> {
    let rest = section.get(offset as usize..)?;
    let end = rest.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&rest[..end]).ok()
}

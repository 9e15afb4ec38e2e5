//! Encode an `ObjectUnit` into a metadata image.

use std::collections::HashMap;

use objcgen_core::Interner;

use super::header::{Header, RELOC_RECORD_SIZE, SYMBOL_RECORD_SIZE};
use super::{RelocKind, Relocation, SECTION_ALIGN, SymbolKind};
use crate::constant::{Constant, PlaceholderId};
use crate::object::{Linkage, ObjectUnit};
use crate::target::TargetData;
use crate::types::{FieldType, align_up};

/// Errors from encoding a unit into an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("unsupported target: {pointer_size}-byte pointers, {long_size}-byte longs")]
    UnsupportedTarget { pointer_size: u8, long_size: u8 },

    #[error("global `{0}` is defined more than once")]
    DuplicateGlobal(String),

    #[error("global `{global}` still contains forward reference {id}")]
    UnresolvedPlaceholder { global: String, id: PlaceholderId },

    #[error("global `{global}`: cannot store {found} in a {expected} slot")]
    TypeMismatch {
        global: String,
        expected: String,
        found: String,
    },

    #[error("global `{global}` takes the address inside unknown global `{target}`")]
    UnknownGepTarget { global: String, target: String },

    #[error("global `{global}`: element path {indices:?} is out of range for `{target}`")]
    GepOutOfRange {
        global: String,
        target: String,
        indices: Vec<u32>,
    },

    #[error("image exceeds 4 GiB")]
    ImageTooLarge,
}

struct PendingSymbol {
    name: String,
    kind: SymbolKind,
    linkage: Linkage,
    defined: bool,
    value: u32,
    size: u32,
}

/// Symbol table under construction. Undefined symbols are appended on first reference.
#[derive(Default)]
struct SymbolTableBuilder {
    entries: Vec<PendingSymbol>,
    lookup: HashMap<String, u32>,
}

impl SymbolTableBuilder {
    fn insert(&mut self, sym: PendingSymbol) -> Result<u32, EncodeError> {
        if self.lookup.contains_key(&sym.name) {
            return Err(EncodeError::DuplicateGlobal(sym.name));
        }
        let index = self.entries.len() as u32;
        self.lookup.insert(sym.name.clone(), index);
        self.entries.push(sym);
        Ok(index)
    }

    fn get_or_declare(&mut self, name: &str, kind: SymbolKind) -> u32 {
        if let Some(&index) = self.lookup.get(name) {
            return index;
        }
        let index = self.entries.len() as u32;
        self.lookup.insert(name.to_string(), index);
        self.entries.push(PendingSymbol {
            name: name.to_string(),
            kind,
            linkage: Linkage::External,
            defined: false,
            value: 0,
            size: 0,
        });
        index
    }
}

/// Uniqued NUL-terminated strings referenced by pointer slots.
///
/// Offsets are handed out as strings are first seen; the section bytes are
/// laid out in the same order once writing is done.
#[derive(Default)]
struct CStringSection {
    pool: Interner,
    offsets: Vec<u32>,
    end: u32,
}

impl CStringSection {
    fn offset_of(&mut self, s: &str) -> u32 {
        let sym = self.pool.intern(s);
        if sym.index() == self.offsets.len() {
            self.offsets.push(self.end);
            self.end += s.len() as u32 + 1;
        }
        self.offsets[sym.index()]
    }
}

struct DataWriter<'u> {
    target: TargetData,
    types: HashMap<&'u str, &'u FieldType>,
    data: Vec<u8>,
    relocs: Vec<Relocation>,
    symbols: SymbolTableBuilder,
    cstrings: CStringSection,
}

impl<'u> DataWriter<'u> {
    fn write(
        &mut self,
        global: &str,
        ty: &FieldType,
        value: &Constant,
        at: u64,
    ) -> Result<(), EncodeError> {
        match (ty, value) {
            (_, Constant::Placeholder(id)) => Err(EncodeError::UnresolvedPlaceholder {
                global: global.to_string(),
                id: *id,
            }),
            (_, Constant::Null) => Ok(()),
            (FieldType::Ptr | FieldType::Long | FieldType::Int | FieldType::Short, Constant::Int(v)) => {
                let width = ty.size(&self.target) as usize;
                let at = at as usize;
                self.target.write_int(&mut self.data[at..at + width], *v, width);
                Ok(())
            }
            (FieldType::Ptr, Constant::CString(s)) => {
                let target = self.cstrings.offset_of(s);
                self.push_reloc(at, RelocKind::CString, target, 0);
                Ok(())
            }
            (FieldType::Ptr, Constant::Symbol(name)) => {
                let target = self.symbols.get_or_declare(name, SymbolKind::Data);
                self.push_reloc(at, RelocKind::Symbol, target, 0);
                Ok(())
            }
            (FieldType::Ptr, Constant::Gep { symbol, indices }) => {
                let Some(&base) = self.types.get(symbol.as_str()) else {
                    return Err(EncodeError::UnknownGepTarget {
                        global: global.to_string(),
                        target: symbol.clone(),
                    });
                };
                let Some((addend, _)) = base.offset_of(indices, &self.target) else {
                    return Err(EncodeError::GepOutOfRange {
                        global: global.to_string(),
                        target: symbol.clone(),
                        indices: indices.clone(),
                    });
                };
                let target = self.symbols.get_or_declare(symbol, SymbolKind::Data);
                self.push_reloc(at, RelocKind::Symbol, target, addend as u32);
                Ok(())
            }
            (FieldType::Struct(s), Constant::Struct(items)) if s.len() == items.len() => {
                let offsets = s.offsets(&self.target);
                for ((field, item), offset) in s.fields.iter().zip(items).zip(offsets) {
                    self.write(global, field, item, at + offset)?;
                }
                Ok(())
            }
            (FieldType::Array(elem, len), Constant::Array(items)) if *len as usize == items.len() => {
                let stride = elem.size(&self.target);
                for (i, item) in items.iter().enumerate() {
                    self.write(global, elem, item, at + stride * i as u64)?;
                }
                Ok(())
            }
            _ => Err(EncodeError::TypeMismatch {
                global: global.to_string(),
                expected: ty.to_string(),
                found: describe(value),
            }),
        }
    }

    fn push_reloc(&mut self, at: u64, kind: RelocKind, target: u32, addend: u32) {
        self.relocs.push(Relocation {
            offset: at as u32,
            target,
            addend,
            kind,
            width: self.target.pointer_size,
        });
    }
}

fn describe(value: &Constant) -> String {
    match value {
        Constant::Struct(items) => format!("a {}-field struct", items.len()),
        Constant::Array(items) => format!("a {}-element array", items.len()),
        Constant::CString(_) => "a string address".to_string(),
        Constant::Symbol(_) | Constant::Gep { .. } => "an address".to_string(),
        other => other.to_string(),
    }
}

/// Encode `unit` for `target`.
///
/// Defined globals are laid out in unit order; declarations and symbols that
/// are only referenced become undefined entries after the defined ones.
pub fn encode(unit: &ObjectUnit, target: &TargetData) -> Result<Vec<u8>, EncodeError> {
    if !target.is_supported() {
        return Err(EncodeError::UnsupportedTarget {
            pointer_size: target.pointer_size,
            long_size: target.long_size,
        });
    }

    // Place defined globals first so their symbol indices come before any
    // undefined reference.
    let mut symbols = SymbolTableBuilder::default();
    let mut placements = Vec::new();
    let mut cursor = 0u64;
    for global in unit.definitions() {
        let size = global.ty.size(target);
        cursor = align_up(cursor, global.ty.align(target));
        symbols.insert(PendingSymbol {
            name: global.name.clone(),
            kind: SymbolKind::Data,
            linkage: global.linkage,
            defined: true,
            value: cursor as u32,
            size: size as u32,
        })?;
        placements.push((global, cursor));
        cursor += size;
    }
    if cursor > u32::MAX as u64 {
        return Err(EncodeError::ImageTooLarge);
    }

    let thunk_index = symbols.insert(PendingSymbol {
        name: unit.load_thunk.name.clone(),
        kind: SymbolKind::Function,
        linkage: Linkage::Internal,
        defined: true,
        value: 0,
        size: 0,
    })?;

    for global in unit.globals.iter().filter(|g| !g.is_definition()) {
        let index = symbols.get_or_declare(&global.name, SymbolKind::Data) as usize;
        let entry = &mut symbols.entries[index];
        if !entry.defined {
            entry.linkage = global.linkage;
        }
    }

    let mut writer = DataWriter {
        target: *target,
        types: unit.globals.iter().map(|g| (g.name.as_str(), &g.ty)).collect(),
        data: vec![0u8; cursor as usize],
        relocs: Vec::new(),
        symbols,
        cstrings: CStringSection::default(),
    };
    for (global, at) in placements {
        if let Some(init) = &global.init {
            writer.write(&global.name, &global.ty, init, at)?;
        }
    }

    let entry_index = writer
        .symbols
        .get_or_declare(&unit.load_thunk.entry, SymbolKind::Function);
    let argument_index = writer
        .symbols
        .get_or_declare(&unit.load_thunk.argument, SymbolKind::Data);

    let DataWriter {
        data,
        relocs,
        symbols,
        cstrings,
        ..
    } = writer;

    let (cstring_bytes, _) = cstrings.pool.to_c_blob();

    let mut names = Vec::new();
    let mut symbol_bytes = Vec::with_capacity(symbols.entries.len() * SYMBOL_RECORD_SIZE as usize);
    for sym in &symbols.entries {
        let name_offset = names.len() as u32;
        names.extend_from_slice(sym.name.as_bytes());
        names.push(0);

        symbol_bytes.extend_from_slice(&name_offset.to_le_bytes());
        symbol_bytes.extend_from_slice(&sym.value.to_le_bytes());
        symbol_bytes.extend_from_slice(&sym.size.to_le_bytes());
        symbol_bytes.push(sym.kind.as_u8());
        symbol_bytes.push(sym.linkage.as_u8());
        symbol_bytes.push(sym.defined as u8);
        symbol_bytes.push(0);
    }

    let mut reloc_bytes = Vec::with_capacity(relocs.len() * RELOC_RECORD_SIZE as usize);
    for reloc in &relocs {
        reloc_bytes.extend_from_slice(&reloc.to_bytes());
    }

    // Header → Names → CStrings → Data → Symbols → Relocations
    let mut output = vec![0u8; 64];
    emit_section(&mut output, &names);
    emit_section(&mut output, &cstring_bytes);
    emit_section(&mut output, &data);
    emit_section(&mut output, &symbol_bytes);
    emit_section(&mut output, &reloc_bytes);
    pad_to_section(&mut output);

    if output.len() > u32::MAX as usize {
        return Err(EncodeError::ImageTooLarge);
    }

    let mut header = Header {
        total_size: output.len() as u32,
        names_size: names.len() as u32,
        cstrings_size: cstring_bytes.len() as u32,
        data_size: data.len() as u32,
        symbols_count: symbols.entries.len() as u32,
        relocs_count: relocs.len() as u32,
        thunk_symbol: thunk_index,
        entry_symbol: entry_index,
        argument_symbol: argument_index,
        pointer_size: target.pointer_size,
        long_size: target.long_size,
        big_endian: target.big_endian,
        ..Default::default()
    };
    header.checksum = crc32fast::hash(&output[64..]);
    output[..64].copy_from_slice(&header.to_bytes());

    Ok(output)
}

/// Pad a buffer to the section alignment boundary.
fn pad_to_section(buf: &mut Vec<u8>) {
    let rem = buf.len() % SECTION_ALIGN;
    if rem != 0 {
        let padding = SECTION_ALIGN - rem;
        buf.resize(buf.len() + padding, 0);
    }
}

fn emit_section(output: &mut Vec<u8>, data: &[u8]) {
    pad_to_section(output);
    output.extend_from_slice(data);
}

//! Human-readable dump of an encoded image.

use std::fmt::Write as _;

use objcgen_core::Colors;

use super::view::{Image, ImageError};
use super::{RelocKind, SymbolKind};

/// Render header facts, symbols, and relocations of a loaded image.
///
/// Fails only if a symbol or relocation record is malformed.
pub fn dump_image(image: &Image<'_>, colors: Colors) -> Result<String, ImageError> {
    let c = &colors;
    let header = image.header();
    let mut out = String::new();

    writeln!(out, "{}[image]{}", c.blue, c.reset).unwrap();
    writeln!(
        out,
        "target   {}ptr={} long={} {}{}",
        c.dim,
        header.pointer_size,
        header.long_size,
        if header.big_endian { "big" } else { "little" },
        c.reset
    )
    .unwrap();
    writeln!(out, "size     {}", header.total_size).unwrap();
    writeln!(out, "data     {}", header.data_size).unwrap();
    writeln!(out, "checksum {:#010x}", header.checksum).unwrap();
    out.push('\n');

    let sw = width_for_count(image.symbol_count() as usize);
    writeln!(out, "{}[symbols]{}", c.blue, c.reset).unwrap();
    for (i, sym) in image.symbols().enumerate() {
        let sym = sym?;
        let kind = match sym.kind {
            SymbolKind::Data => "data",
            SymbolKind::Function => "func",
        };
        if sym.defined {
            writeln!(
                out,
                "Y{i:0sw$} {kind} {:<8} {}@{:#06x}+{}{} {}",
                sym.linkage.to_string(),
                c.dim,
                sym.value,
                sym.size,
                c.reset,
                sym.name
            )
            .unwrap();
        } else {
            writeln!(
                out,
                "Y{i:0sw$} {kind} {:<8} {}undef{} {}",
                sym.linkage.to_string(),
                c.dim,
                c.reset,
                sym.name
            )
            .unwrap();
        }
    }
    out.push('\n');

    writeln!(out, "{}[relocations]{}", c.blue, c.reset).unwrap();
    for reloc in image.relocations() {
        let reloc = reloc?;
        let target = match reloc.kind {
            RelocKind::Symbol => image.symbol(reloc.target)?.name.to_string(),
            RelocKind::CString => {
                let text = image.cstring(reloc.target).unwrap_or("<invalid>");
                format!("{}{text:?}{}", c.green, c.reset)
            }
        };
        if reloc.addend == 0 {
            writeln!(out, "{:#06x} w{} -> {target}", reloc.offset, reloc.width).unwrap();
        } else {
            writeln!(
                out,
                "{:#06x} w{} -> {target}+{}",
                reloc.offset, reloc.width, reloc.addend
            )
            .unwrap();
        }
    }

    Ok(out)
}

/// Digits needed to print indices below `count`.
fn width_for_count(count: usize) -> usize {
    if count <= 1 {
        1
    } else {
        ((count - 1) as f64).log10() as usize + 1
    }
}

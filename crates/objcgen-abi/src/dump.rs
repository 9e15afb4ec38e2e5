//! Human-readable dump of an emitted unit.

use std::fmt::Write as _;

use objcgen_core::Colors;

use crate::object::{Global, ObjectUnit};

/// Render every global in definition order, then the load thunk.
pub fn dump(unit: &ObjectUnit, colors: Colors) -> String {
    let c = &colors;
    let mut out = String::new();

    writeln!(out, "{}; source: {}{}", c.dim, unit.source_path, c.reset).unwrap();
    writeln!(out, "{}[globals]{}", c.blue, c.reset).unwrap();
    for global in &unit.globals {
        dump_global(&mut out, global, c);
    }

    let thunk = &unit.load_thunk;
    writeln!(out, "{}[load]{}", c.blue, c.reset).unwrap();
    writeln!(
        out,
        "@{} = internal fn() {{ call @{}(@{}) }}",
        thunk.name, thunk.entry, thunk.argument
    )
    .unwrap();

    out
}

/// One line per global: `@name = linkage type init`.
pub fn dump_global(out: &mut String, global: &Global, c: &Colors) {
    write!(
        out,
        "{}@{}{} = {}{} {}{}",
        c.blue, global.name, c.reset, c.dim, global.linkage, global.ty, c.reset
    )
    .unwrap();
    match &global.init {
        Some(init) => writeln!(out, " {init}").unwrap(),
        None => writeln!(out, " {}declare{}", c.dim, c.reset).unwrap(),
    }
}

//! Constant initializers of emitted globals.

use std::fmt;

/// Identity of a forward reference whose final value is not known yet.
///
/// Handed out by the emitter's ledger; a constant tree containing one cannot
/// be encoded until the placeholder has been backpatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderId(pub u32);

impl PlaceholderId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Initializer value of a global or of one of its fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    /// All-zero bytes of the field's type.
    Null,
    Int(i64),
    /// Address of a uniqued, NUL-terminated byte string.
    CString(String),
    /// Address of a named global.
    Symbol(String),
    /// Address of a field or element inside a named global.
    Gep { symbol: String, indices: Vec<u32> },
    /// Forward reference, backpatched before encoding.
    Placeholder(PlaceholderId),
    Struct(Vec<Constant>),
    Array(Vec<Constant>),
}

impl Constant {
    pub fn cstr(s: impl Into<String>) -> Self {
        Constant::CString(s.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Constant::Symbol(name.into())
    }

    pub fn gep(symbol: impl Into<String>, indices: impl Into<Vec<u32>>) -> Self {
        Constant::Gep {
            symbol: symbol.into(),
            indices: indices.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null)
    }

    /// Slot reached by descending `path` through nested structs and arrays.
    pub fn at_path(&self, path: &[u32]) -> Option<&Constant> {
        let mut current = self;
        for &index in path {
            current = match current {
                Constant::Struct(items) | Constant::Array(items) => items.get(index as usize)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable slot reached by descending `path`.
    pub fn at_path_mut(&mut self, path: &[u32]) -> Option<&mut Constant> {
        let mut current = self;
        for &index in path {
            current = match current {
                Constant::Struct(items) | Constant::Array(items) => {
                    items.get_mut(index as usize)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Collect the path of every placeholder in this tree, depth first.
    pub fn placeholders(&self) -> Vec<(PlaceholderId, Vec<u32>)> {
        let mut found = Vec::new();
        let mut path = Vec::new();
        collect_placeholders(self, &mut path, &mut found);
        found
    }

    /// Names of every global this constant refers to, in first-use order.
    pub fn referenced_symbols(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_symbols(self, &mut names);
        names
    }
}

fn collect_placeholders(
    constant: &Constant,
    path: &mut Vec<u32>,
    found: &mut Vec<(PlaceholderId, Vec<u32>)>,
) {
    match constant {
        Constant::Placeholder(id) => found.push((*id, path.clone())),
        Constant::Struct(items) | Constant::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(i as u32);
                collect_placeholders(item, path, found);
                path.pop();
            }
        }
        _ => {}
    }
}

fn collect_symbols<'a>(constant: &'a Constant, names: &mut Vec<&'a str>) {
    match constant {
        Constant::Symbol(name) | Constant::Gep { symbol: name, .. } => {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        Constant::Struct(items) | Constant::Array(items) => {
            for item in items {
                collect_symbols(item, names);
            }
        }
        _ => {}
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Int(v) => write!(f, "{v}"),
            Constant::CString(s) => write!(f, "c{s:?}"),
            Constant::Symbol(name) => write!(f, "@{name}"),
            Constant::Gep { symbol, indices } => {
                write!(f, "@{symbol}")?;
                for index in indices {
                    write!(f, "[{index}]")?;
                }
                Ok(())
            }
            Constant::Placeholder(id) => write!(f, "{id}"),
            Constant::Struct(items) => write_items(f, "{", items, "}"),
            Constant::Array(items) => write_items(f, "[", items, "]"),
        }
    }
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: &[Constant],
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

//! Content interning for selector names and constant string literals.
//!
//! Converts strings into cheap integer handles (`Symbol`). Two requests for
//! byte-identical content return the same handle; identities are assigned in
//! first-intern order, so iteration order is reproducible for identical input.

use indexmap::IndexSet;

/// A lightweight handle to an interned string.
///
/// Comparing two symbols is O(1). Symbols are ordered by insertion order,
/// not lexicographically. Use `Interner::resolve` if you need string ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// Position of this symbol in its pool's insertion order.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Create a Symbol from a raw index.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// # Panics
    /// Panics if a pool grows past `u32::MAX` entries.
    pub(crate) fn at(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(raw) => Self(raw),
            Err(_) => panic!("Interner: pool overflow at {index} entries (max {})", u32::MAX),
        }
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// String pool. Deduplicates strings and returns cheap Symbol handles.
///
/// There is no eviction: a pool lives for the whole compilation unit and is
/// consumed when the unit is finalized.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    strings: IndexSet<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its Symbol.
    /// If the string was already interned, returns the existing Symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(index) = self.strings.get_index_of(s) {
            return Symbol::at(index);
        }

        let (index, _) = self.strings.insert_full(s.to_owned());
        Symbol::at(index)
    }

    /// Intern an owned string, avoiding clone if not already present.
    pub fn intern_owned(&mut self, s: String) -> Symbol {
        let (index, _) = self.strings.insert_full(s);
        Symbol::at(index)
    }

    /// Look up an already interned string without inserting it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.strings.get_index_of(s).map(Symbol::at)
    }

    /// Resolve a Symbol back to its string.
    ///
    /// # Panics
    /// Panics if the symbol was not created by this interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.try_resolve(sym).unwrap_or_else(|| {
            panic!(
                "Interner: symbol {sym} out of range (pool holds {} entries)",
                self.strings.len()
            )
        })
    }

    /// Try to resolve a Symbol, returning None if invalid.
    #[inline]
    pub fn try_resolve(&self, sym: Symbol) -> Option<&str> {
        self.strings.get_index(sym.index()).map(|s| s.as_str())
    }

    /// Number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the interner is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all interned strings with their symbols, in first-intern order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (Symbol::at(i), s.as_str()))
    }

    /// Emit the pool as NUL-terminated C strings laid end to end.
    ///
    /// Returns (concatenated bytes, start offset of each string). Offsets are
    /// indexed by `Symbol::index`.
    pub fn to_c_blob(&self) -> (Vec<u8>, Vec<u32>) {
        let mut blob = Vec::new();
        let mut offsets = Vec::with_capacity(self.strings.len());

        for s in &self.strings {
            offsets.push(blob.len() as u32);
            blob.extend_from_slice(s.as_bytes());
            blob.push(0);
        }

        (blob, offsets)
    }
}

use std::{
    collections::HashMap,
    hash::{BuildHasher, Hash, Hasher, RandomState},
};

use crate::runtime::symbol::Symbol;

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

/// Context-wide string table.
///
/// Property names, string values and constant-pool entries are interned so
/// that identity comparison of [`Symbol`]s suffices for lookup. All text is
/// kept in one contiguous buffer; strings live as long as the interner.
///
/// # Example
///
/// ```
/// use asvm::runtime::interner::Interner;
///
/// let mut interner = Interner::new();
/// let a = interner.intern("prototype");
/// let b = interner.intern("prototype");
///
/// assert_eq!(a, b);
/// assert_eq!(interner.resolve(a), "prototype");
/// ```
#[derive(Debug, Clone)]
pub struct Interner {
    hasher: RandomState,
    buckets: HashMap<u64, Vec<Symbol>>,
    spans: Vec<Span>,
    storage: String,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self {
            hasher: RandomState::new(),
            buckets: HashMap::default(),
            spans: Vec::new(),
            storage: String::new(),
        }
    }

    /// Creates an interner with room for `symbols` entries and `storage_bytes`
    /// bytes of text.
    pub fn with_capacity(symbols: usize, storage_bytes: usize) -> Self {
        Self {
            hasher: RandomState::new(),
            buckets: HashMap::with_capacity(symbols),
            spans: Vec::with_capacity(symbols),
            storage: String::with_capacity(storage_bytes),
        }
    }

    /// Interns `s`, returning the existing symbol if it was seen before.
    ///
    /// # Panics
    ///
    /// Panics if the number of unique strings exceeds `u32::MAX`.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let hash = self.hash_str(s);
        if let Some(candidates) = self.buckets.get(&hash) {
            for candidate in candidates {
                if self.resolve(*candidate) == s {
                    return *candidate;
                }
            }
        }

        let index = self.spans.len();
        assert!(
            index < u32::MAX as usize,
            "string table overflow: cannot intern more than {} unique strings",
            u32::MAX
        );
        let sym = Symbol::new(index as u32);

        let start = self.storage.len();
        self.storage.push_str(s);
        let end = self.storage.len();

        self.spans.push(Span { start, end });
        self.buckets.entry(hash).or_default().push(sym);
        sym
    }

    /// Returns the symbol for `s` if it has been interned, without inserting.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        let hash = self.hash_str(s);
        self.buckets
            .get(&hash)?
            .iter()
            .copied()
            .find(|candidate| self.resolve(*candidate) == s)
    }

    /// Resolves a symbol to its text.
    ///
    /// Symbols are bound to the interner that made them; one from another
    /// interner resolves to the empty string. Use [`Interner::try_resolve`]
    /// to tell the two apart.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.try_resolve(sym).unwrap_or("")
    }

    pub fn try_resolve(&self, sym: Symbol) -> Option<&str> {
        let span = self.spans.get(sym.as_u32() as usize)?;
        self.storage.get(span.start..span.end)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn hash_str(&self, s: &str) -> u64 {
        let mut h = self.hasher.build_hasher();
        s.hash(&mut h);
        h.finish()
    }
}

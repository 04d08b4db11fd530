use std::fmt;

/// Handle to a string interned in a context's [`Interner`](super::interner::Interner).
///
/// Symbols are cheap to copy and compare; two symbols from the same interner
/// are equal exactly when their text is equal, so property lookup compares
/// symbols instead of strings. A symbol only means something to the context
/// that interned it; elsewhere it reads as the empty string.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// Creates a symbol from a raw index.
    ///
    /// Intended for the interner only; arbitrary indices do not resolve.
    #[inline]
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this symbol.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

use std::fmt;

/// Handle to an object owned by a context's heap.
///
/// A handle is a copyable slot index plus the generation of the slot at the
/// time of allocation. Once the collector sweeps the slot its generation is
/// bumped, so lookups through an old handle fail instead of aliasing the
/// next object that reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ObjectHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw heap slot index backing this handle.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({}@{})", self.index, self.generation)
    }
}

/// Handle to an object known to be a function.
///
/// Only the context hands these out, after checking the object kind, so
/// call sites taking a `FunctionHandle` need no further narrowing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionHandle(pub(crate) ObjectHandle);

impl FunctionHandle {
    /// Widens to a plain object handle.
    pub fn object(self) -> ObjectHandle {
        self.0
    }
}

impl From<FunctionHandle> for ObjectHandle {
    fn from(function: FunctionHandle) -> Self {
        function.0
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionHandle({}@{})", self.0.index, self.0.generation)
    }
}

use std::{fmt, ops};

use crate::runtime::{NativeFn, value::Value};

/// Attribute bits of a property slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VariableFlags(u32);

impl VariableFlags {
    pub const NONE: Self = Self(0);
    /// Skipped by script-level enumeration.
    pub const DONT_ENUM: Self = Self(1 << 0);
    /// Plain writes leave the value untouched.
    pub const READONLY: Self = Self(1 << 1);
    /// `delete` reports success without removing the slot.
    pub const PERMANENT: Self = Self(1 << 2);
    /// Backed by getter/setter routines instead of the stored value.
    pub const NATIVE: Self = Self(1 << 3);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0xf)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Applies `flags` to the bits selected by `mask`, keeping the others.
    pub const fn apply(self, flags: Self, mask: Self) -> Self {
        Self((self.0 & !mask.0) | (flags.0 & mask.0))
    }
}

impl ops::BitOr for VariableFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for VariableFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for VariableFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::DONT_ENUM) {
            names.push("DONT_ENUM");
        }
        if self.contains(Self::READONLY) {
            names.push("READONLY");
        }
        if self.contains(Self::PERMANENT) {
            names.push("PERMANENT");
        }
        if self.contains(Self::NATIVE) {
            names.push("NATIVE");
        }
        if names.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

/// Getter/setter pair of a native variable.
#[derive(Clone, Copy)]
pub struct Accessor {
    pub get: NativeFn,
    pub set: Option<NativeFn>,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor(set={})", self.set.is_some())
    }
}

/// One property slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Variable {
    pub value: Value,
    pub flags: VariableFlags,
    pub accessor: Option<Accessor>,
}

impl Variable {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            flags: VariableFlags::NONE,
            accessor: None,
        }
    }

    /// Overwrites the stored value unless the slot is read-only.
    ///
    /// Returns whether the write took effect.
    pub fn assign(&mut self, value: Value) -> bool {
        if self.flags.contains(VariableFlags::READONLY) {
            return false;
        }
        self.value = value;
        true
    }
}

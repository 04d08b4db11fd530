use std::{fmt, ops, rc::Rc};

use sha2::{Digest, Sha256};

/// Register preloading behaviour declared by a compiled function.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(u32);

impl ScriptFlags {
    pub const NONE: Self = Self(0);
    pub const PRELOAD_THIS: Self = Self(1 << 0);
    pub const SUPPRESS_THIS: Self = Self(1 << 1);
    pub const PRELOAD_ARGS: Self = Self(1 << 2);
    pub const SUPPRESS_ARGS: Self = Self(1 << 3);
    pub const PRELOAD_SUPER: Self = Self(1 << 4);
    pub const SUPPRESS_SUPER: Self = Self(1 << 5);
    pub const PRELOAD_ROOT: Self = Self(1 << 6);
    pub const PRELOAD_PARENT: Self = Self(1 << 7);
    pub const PRELOAD_GLOBAL: Self = Self(1 << 8);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0x1ff)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ops::BitOr for ScriptFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ScriptFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptFlags({:#05x})", self.0)
    }
}

/// A declared parameter of a compiled function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptArgument {
    pub name: String,
    /// Register the argument is preloaded into; 0 means "store as a local".
    pub preload: u32,
}

impl ScriptArgument {
    pub fn new(name: impl Into<String>, preload: u32) -> Self {
        Self {
            name: name.into(),
            preload,
        }
    }
}

/// Compiled instruction buffer plus the metadata frames need.
///
/// Produced by the decoder; the runtime never parses `bytecode`, it only
/// hands it to the executor. Shared immutably through [`Rc`].
#[derive(Clone, PartialEq, Eq)]
pub struct Script {
    name: String,
    version: u8,
    n_registers: u32,
    flags: ScriptFlags,
    constant_pool: Vec<String>,
    arguments: Vec<ScriptArgument>,
    bytecode: Rc<[u8]>,
    fingerprint: [u8; 32],
}

impl Script {
    pub fn new(name: impl Into<String>, version: u8, bytecode: impl Into<Rc<[u8]>>) -> Self {
        let bytecode = bytecode.into();
        let fingerprint = fingerprint_of(&bytecode);
        Self {
            name: name.into(),
            version,
            n_registers: 0,
            flags: ScriptFlags::NONE,
            constant_pool: Vec::new(),
            arguments: Vec::new(),
            bytecode,
            fingerprint,
        }
    }

    pub fn with_registers(mut self, n_registers: u32) -> Self {
        self.n_registers = n_registers;
        self
    }

    pub fn with_flags(mut self, flags: ScriptFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_constant_pool(mut self, pool: Vec<String>) -> Self {
        self.constant_pool = pool;
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<ScriptArgument>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn n_registers(&self) -> u32 {
        self.n_registers
    }

    pub fn flags(&self) -> ScriptFlags {
        self.flags
    }

    pub fn constant_pool(&self) -> &[String] {
        &self.constant_pool
    }

    pub fn arguments(&self) -> &[ScriptArgument] {
        &self.arguments
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// SHA-256 of the instruction buffer.
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    /// First four fingerprint bytes as hex, for diagnostics.
    pub fn short_id(&self) -> String {
        self.fingerprint[..4]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("n_registers", &self.n_registers)
            .field("flags", &self.flags)
            .field("id", &self.short_id())
            .finish()
    }
}

fn fingerprint_of(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

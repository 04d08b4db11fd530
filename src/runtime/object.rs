use std::{collections::HashMap, fmt};

use crate::runtime::{
    function::FunctionData, gc::ObjectHandle, symbol::Symbol, variable::Variable,
};

/// Bytes charged for a plain object.
pub const OBJECT_SIZE: usize = std::mem::size_of::<AsObject>();
/// Bytes charged for each property slot.
pub const VARIABLE_SIZE: usize = std::mem::size_of::<Variable>();
/// Bytes charged for a function object.
pub const FUNCTION_SIZE: usize = OBJECT_SIZE + std::mem::size_of::<FunctionData>();

/// Data-less tag naming an object kind.
///
/// Used where a kind must be named without an instance: constructor
/// allocation and `this` requirements of native routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    Object,
    Array,
    Function,
    Scope,
}

impl ClassId {
    pub fn label(self) -> &'static str {
        match self {
            ClassId::Object => "Object",
            ClassId::Array => "Array",
            ClassId::Function => "Function",
            ClassId::Scope => "Scope",
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Activation object of a scripted frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeData {
    /// Enclosing lexical scope.
    pub parent: Option<ObjectHandle>,
    /// Object whose properties are visible through this scope (the `this`
    /// of a top-level run); also what the scope resolves to.
    pub target: Option<ObjectHandle>,
}

/// Kind-specific payload of an object.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Plain,
    Array,
    Function(Box<FunctionData>),
    Scope(ScopeData),
}

impl ObjectKind {
    pub fn class_id(&self) -> ClassId {
        match self {
            ObjectKind::Plain => ClassId::Object,
            ObjectKind::Array => ClassId::Array,
            ObjectKind::Function(_) => ClassId::Function,
            ObjectKind::Scope(_) => ClassId::Scope,
        }
    }

    /// Empty payload for a kind allocated by a constructor.
    ///
    /// Functions and scopes are never built this way; they fall back to a
    /// plain object.
    pub fn for_class(class: ClassId) -> Self {
        match class {
            ClassId::Array => ObjectKind::Array,
            ClassId::Object | ClassId::Function | ClassId::Scope => ObjectKind::Plain,
        }
    }
}

/// A dynamically extensible property bag with one prototype link.
#[derive(Debug, Clone)]
pub struct AsObject {
    pub kind: ObjectKind,
    pub properties: HashMap<Symbol, Variable>,
    pub prototype: Option<ObjectHandle>,
    /// Bytes charged for the object itself, credited back on collection.
    pub size: usize,
}

impl AsObject {
    pub fn new(kind: ObjectKind, size: usize) -> Self {
        Self {
            kind,
            properties: HashMap::new(),
            prototype: None,
            size,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.kind.class_id()
    }

    pub fn function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn scope(&self) -> Option<&ScopeData> {
        match &self.kind {
            ObjectKind::Scope(data) => Some(data),
            _ => None,
        }
    }

    /// Total bytes this object accounts for: itself plus its slots.
    pub fn charged_bytes(&self) -> usize {
        self.size + self.properties.len() * VARIABLE_SIZE
    }
}

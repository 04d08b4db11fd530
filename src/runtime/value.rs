use std::fmt;

use crate::runtime::{gc::ObjectHandle, symbol::Symbol};

/// Runtime value used by frames, registers, the value stack and property
/// slots.
///
/// Values are small and `Copy`: strings are interned [`Symbol`]s and objects
/// are [`ObjectHandle`]s into the owning context's heap, so copying a value
/// never touches the heap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// The absent value; also the result of any missing property.
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    /// IEEE-754 double; the only numeric type.
    Number(f64),
    /// Interned string.
    String(Symbol),
    /// Reference to a heap object.
    Object(ObjectHandle),
}

impl Value {
    /// Returns the type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<Symbol> {
        match self {
            Value::String(sym) => Some(*sym),
            _ => None,
        }
    }

    /// Truthiness of primitives; objects are always true.
    ///
    /// Strings need the interner to be judged, so they are handled by
    /// `Context::value_to_boolean`; here every string counts as true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(_) | Value::Object(_) => true,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<ObjectHandle> for Value {
    fn from(value: ObjectHandle) -> Self {
        Value::Object(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(sym) => write!(f, "<string {}>", sym),
            Value::Object(handle) => write!(f, "<object {}>", handle.index()),
        }
    }
}

/// Formats a number the way scripts print it: integral values without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

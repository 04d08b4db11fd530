use std::collections::HashSet;

use crate::runtime::{
    class::{ObjectClass, set_property, snapshot},
    context::Context,
    gc::ObjectHandle,
    object::ClassId,
    symbol::Symbol,
    value::Value,
    variable::VariableFlags,
};

/// Parses a canonical array index ("0", "17"; not "017", "-1" or "1.0").
pub fn array_index(name: &str) -> Option<u32> {
    if name.is_empty() || name.len() > 10 {
        return None;
    }
    if name.len() > 1 && name.starts_with('0') {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

/// Arrays keep an own, non-enumerable, permanent `length` one past the
/// highest index property. Writing a smaller `length` drops the indices at
/// or above it.
pub struct ArrayClass;

impl ArrayClass {
    pub fn length(cx: &Context, array: ObjectHandle) -> u32 {
        let name = cx.names.length;
        cx.heap
            .get(array)
            .and_then(|obj| obj.properties.get(&name))
            .and_then(|var| var.value.as_number())
            .map(|n| n as u32)
            .unwrap_or(0)
    }

    fn store_length(cx: &mut Context, array: ObjectHandle, length: u32) {
        let name = cx.names.length;
        set_property(cx, array, name, Value::Number(length as f64));
    }

    fn truncate(cx: &mut Context, array: ObjectHandle, length: u32) {
        let doomed: HashSet<Symbol> = snapshot(cx, array)
            .into_iter()
            .filter(|(name, _, _)| {
                array_index(cx.interner.resolve(*name)).is_some_and(|index| index >= length)
            })
            .map(|(name, _, _)| name)
            .collect();
        if !doomed.is_empty() {
            cx.foreach_remove(array, |name, _, _| doomed.contains(&name));
        }
    }
}

impl ObjectClass for ArrayClass {
    fn id(&self) -> ClassId {
        ClassId::Array
    }

    fn add(&self, cx: &mut Context, object: ObjectHandle) {
        Self::store_length(cx, object, 0);
        let flags = VariableFlags::DONT_ENUM | VariableFlags::PERMANENT;
        let name = cx.names.length;
        self.set_flags(cx, object, name, flags, flags);
    }

    fn set(&self, cx: &mut Context, object: ObjectHandle, name: Symbol, value: Value) {
        if name == cx.names.length {
            let Some(length) = value
                .as_number()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u32)
            else {
                log::warn!("ignoring invalid array length {}", value);
                return;
            };
            if length < Self::length(cx, object) {
                Self::truncate(cx, object, length);
            }
            Self::store_length(cx, object, length);
            return;
        }

        set_property(cx, object, name, value);
        if let Some(index) = array_index(cx.interner.resolve(name)) {
            if index >= Self::length(cx, object) {
                Self::store_length(cx, object, index + 1);
            }
        }
    }
}

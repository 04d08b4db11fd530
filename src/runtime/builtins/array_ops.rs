use std::collections::HashMap;

use crate::runtime::{
    class::{ArrayClass, array_index},
    context::Context,
    error::RuntimeError,
    frame::Frame,
    function::ConstructInfo,
    gc::ObjectHandle,
    object::{ClassId, OBJECT_SIZE},
    value::Value,
};

use super::{BuiltinMethod, install_constructor, install_methods};

static ARRAY_METHODS: &[BuiltinMethod] = &[
    BuiltinMethod {
        name: "push",
        func: builtin_push,
        min_args: 0,
        this_class: Some(ClassId::Array),
    },
    BuiltinMethod {
        name: "pop",
        func: builtin_pop,
        min_args: 0,
        this_class: Some(ClassId::Array),
    },
    BuiltinMethod {
        name: "reverse",
        func: builtin_reverse,
        min_args: 0,
        this_class: Some(ClassId::Array),
    },
];

pub(super) fn init(cx: &mut Context) {
    let prototype = cx.array_prototype();
    let ctor = install_constructor(cx, "Array", builtin_array, prototype);
    if let Some(ctor) = ctor {
        cx.set_construct_info(
            ctor,
            ConstructInfo {
                class: ClassId::Array,
                size: OBJECT_SIZE,
            },
        );
    }
    cx.builtins.array = ctor;
    install_methods(cx, prototype, ARRAY_METHODS);
}

fn store_index(cx: &mut Context, array: ObjectHandle, index: u32, value: Value) {
    let name = cx.intern(&index.to_string());
    cx.set(array, name, value);
}

/// `Array(n)` makes an array of length `n`; any other argument list
/// becomes the elements.
pub(super) fn builtin_array(
    cx: &mut Context,
    this: ObjectHandle,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let construct = cx.frame().is_some_and(Frame::is_construct);
    let array = if construct && cx.class_id(this) == Some(ClassId::Array) {
        this
    } else {
        match cx.new_array() {
            Some(array) => array,
            None => return Ok(Value::Undefined),
        }
    };

    if let [Value::Number(length)] = args {
        let name = cx.names.length;
        cx.set(array, name, Value::Number(*length));
    } else {
        for (index, value) in args.iter().enumerate() {
            store_index(cx, array, index as u32, *value);
        }
    }

    if construct && array == this {
        Ok(Value::Undefined)
    } else {
        Ok(Value::Object(array))
    }
}

/// Appends the arguments and returns the new length.
pub(super) fn builtin_push(
    cx: &mut Context,
    this: ObjectHandle,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    for value in args {
        let length = ArrayClass::length(cx, this);
        store_index(cx, this, length, *value);
    }
    Ok(Value::Number(ArrayClass::length(cx, this) as f64))
}

/// Removes and returns the last element.
pub(super) fn builtin_pop(
    cx: &mut Context,
    this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let length = ArrayClass::length(cx, this);
    if length == 0 {
        return Ok(Value::Undefined);
    }
    let name = cx.intern(&(length - 1).to_string());
    let value = cx.peek_variable(this, name).unwrap_or_default();
    let name = cx.names.length;
    cx.set(this, name, Value::Number((length - 1) as f64));
    Ok(value)
}

/// Reverses in place by renaming index `i` to `length - 1 - i`.
pub(super) fn builtin_reverse(
    cx: &mut Context,
    this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let length = ArrayClass::length(cx, this);
    let mut targets = Vec::new();
    cx.foreach(this, |name, _, _| {
        targets.push(name);
        true
    });
    let moves: Vec<_> = targets
        .into_iter()
        .filter_map(|name| {
            let index = array_index(cx.string(name))?;
            (index < length).then_some((name, length - 1 - index))
        })
        .collect();
    let mut renames = HashMap::with_capacity(moves.len());
    for (name, index) in moves {
        renames.insert(name, cx.intern(&index.to_string()));
    }

    cx.foreach_rename(this, |_, name, _, _| {
        Some(renames.get(&name).copied().unwrap_or(name))
    });
    Ok(Value::Object(this))
}

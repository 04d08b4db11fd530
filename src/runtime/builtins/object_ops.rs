use crate::runtime::{
    context::Context, error::RuntimeError, frame::Frame, gc::ObjectHandle, value::Value,
    variable::VariableFlags,
};

use super::{BuiltinMethod, install_constructor, install_methods};

/// `hasOwnProperty` only exists from version 6 on.
const HAS_OWN_PROPERTY_VERSION: u8 = 6;

static OBJECT_METHODS: &[BuiltinMethod] = &[
    BuiltinMethod {
        name: "valueOf",
        func: builtin_value_of,
        min_args: 0,
        this_class: None,
    },
    BuiltinMethod {
        name: "toString",
        func: builtin_to_string,
        min_args: 0,
        this_class: None,
    },
];

static HAS_OWN_PROPERTY: BuiltinMethod = BuiltinMethod {
    name: "hasOwnProperty",
    func: builtin_has_own_property,
    min_args: 1,
    this_class: None,
};

pub(super) fn init(cx: &mut Context) {
    let prototype = cx.object_prototype();
    let ctor = install_constructor(cx, "Object", builtin_object, prototype);
    cx.builtins.object = ctor;

    install_methods(cx, prototype, OBJECT_METHODS);
    if cx.version() >= HAS_OWN_PROPERTY_VERSION {
        install_methods(cx, prototype, std::slice::from_ref(&HAS_OWN_PROPERTY));
    }
}

/// `Object(value)` hands objects back unchanged. Otherwise a plain call
/// makes a new object and `new Object()` keeps the one being constructed.
pub(super) fn builtin_object(
    cx: &mut Context,
    _this: ObjectHandle,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    if let Some(Value::Object(object)) = args.first() {
        return Ok(Value::Object(*object));
    }
    if cx.frame().is_some_and(Frame::is_construct) {
        return Ok(Value::Undefined);
    }
    Ok(cx.new_object().map(Value::Object).unwrap_or_default())
}

pub(super) fn builtin_value_of(
    _cx: &mut Context,
    this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Object(this))
}

pub(super) fn builtin_to_string(
    cx: &mut Context,
    this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let text = cx.value_to_string(&Value::Object(this));
    Ok(cx.new_string(&text))
}

/// True for own properties that are not backed by native accessors.
pub(super) fn builtin_has_own_property(
    cx: &mut Context,
    this: ObjectHandle,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let name = cx.value_to_string(&args.first().copied().unwrap_or_default());
    let name = cx.intern(&name);
    let own = cx
        .get(this, name)
        .is_some_and(|(_, flags)| !flags.contains(VariableFlags::NATIVE));
    Ok(Value::Boolean(own))
}

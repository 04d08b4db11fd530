use crate::runtime::{
    context::Context, error::RuntimeError, frame::Args, gc::ObjectHandle, object::ClassId,
    value::Value,
};

use super::{BuiltinMethod, install_constructor, install_methods};

static FUNCTION_METHODS: &[BuiltinMethod] = &[BuiltinMethod {
    name: "call",
    func: builtin_call,
    min_args: 0,
    this_class: Some(ClassId::Function),
}];

pub(super) fn init(cx: &mut Context) {
    let prototype = cx.function_prototype();
    let ctor = install_constructor(cx, "Function", builtin_function, prototype);
    cx.builtins.function = ctor;
    install_methods(cx, prototype, FUNCTION_METHODS);
}

/// Functions cannot be built from source at run time; `Function()` does
/// nothing.
fn builtin_function(
    _cx: &mut Context,
    _this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Undefined)
}

/// `f.call(thisObject, ...)`: a non-object `thisObject` means the global
/// object.
fn builtin_call(cx: &mut Context, this: ObjectHandle, args: &[Value]) -> Result<Value, RuntimeError> {
    let Some(function) = cx.as_function(this) else {
        return Ok(Value::Undefined);
    };
    let target = args
        .first()
        .and_then(Value::as_object)
        .unwrap_or_else(|| cx.global());
    let rest = args.get(1..).unwrap_or_default();
    cx.call(function, target, Args::Values(rest))
}

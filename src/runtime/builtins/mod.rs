//! Standard objects every context starts with: `Object`, `Function` and
//! `Array` with their prototypes, installed on the global object.

use crate::runtime::{
    NativeFn,
    context::Context,
    gc::{FunctionHandle, ObjectHandle},
    object::ClassId,
    value::Value,
    variable::VariableFlags,
};

mod array_ops;
mod function_ops;
mod object_ops;

/// Handles of the built-in objects; all of them are GC roots.
#[derive(Debug, Clone)]
pub(crate) struct Builtins {
    pub global: ObjectHandle,
    pub object_prototype: ObjectHandle,
    pub function_prototype: ObjectHandle,
    pub array_prototype: ObjectHandle,
    pub object: Option<FunctionHandle>,
    pub function: Option<FunctionHandle>,
    pub array: Option<FunctionHandle>,
}

impl Builtins {
    pub fn trace(&self, out: &mut Vec<ObjectHandle>) {
        out.extend([
            self.global,
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
        ]);
        out.extend(
            [self.object, self.function, self.array]
                .into_iter()
                .flatten()
                .map(FunctionHandle::object),
        );
    }
}

/// A native method installed on a built-in prototype.
pub(crate) struct BuiltinMethod {
    pub name: &'static str,
    pub func: NativeFn,
    pub min_args: usize,
    pub this_class: Option<ClassId>,
}

pub(crate) fn init(cx: &mut Context) {
    let object_prototype = cx.object_prototype();
    for inheritor in [cx.global(), cx.function_prototype(), cx.array_prototype()] {
        let proto = cx.names.proto;
        cx.set(inheritor, proto, Value::Object(object_prototype));
    }

    object_ops::init(cx);
    function_ops::init(cx);
    array_ops::init(cx);
}

fn install_methods(cx: &mut Context, target: ObjectHandle, methods: &[BuiltinMethod]) {
    for method in methods {
        cx.add_function(
            target,
            method.name,
            method.this_class,
            Some(method.func),
            method.min_args,
        );
    }
}

/// Defines the global constructor `name` and ties it to `prototype` in
/// both directions.
fn install_constructor(
    cx: &mut Context,
    name: &str,
    func: NativeFn,
    prototype: ObjectHandle,
) -> Option<FunctionHandle> {
    let global = cx.global();
    let ctor = cx.add_function(global, name, None, Some(func), 0)?;

    let key = cx.names.prototype;
    cx.set(ctor.object(), key, Value::Object(prototype));
    cx.set_variable_flags(
        ctor.object(),
        key,
        VariableFlags::DONT_ENUM | VariableFlags::PERMANENT | VariableFlags::READONLY,
    );

    let key = cx.names.constructor;
    cx.set(prototype, key, Value::Object(ctor.object()));
    cx.set_variable_flags(prototype, key, VariableFlags::DONT_ENUM);
    Some(ctor)
}

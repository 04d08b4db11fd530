//! Per-kind property semantics.
//!
//! Every object kind implements [`ObjectClass`]. The default methods give
//! plain-object behaviour over the shared property map; kinds override only
//! what they specialise (arrays keep `length` in sync, functions and scopes
//! mark extra references, scopes resolve to their target). Dispatch goes
//! through [`class_of`], which maps the object's [`ObjectKind`] to a static
//! class instance.

use crate::runtime::{
    context::Context,
    gc::ObjectHandle,
    object::{AsObject, ClassId, ObjectKind, VARIABLE_SIZE},
    symbol::Symbol,
    value::Value,
    variable::{Variable, VariableFlags},
};

mod array;
mod function;
mod plain;
mod scope;

pub use array::{ArrayClass, array_index};
pub use function::FunctionClass;
pub use plain::PlainClass;
pub use scope::ScopeClass;

/// Visitor of own properties; returning `false` stops the walk.
pub type ForeachFn<'a> = dyn FnMut(Symbol, Value, VariableFlags) -> bool + 'a;

/// The capability set every object kind provides.
pub trait ObjectClass: Sync {
    fn id(&self) -> ClassId;

    /// Pushes every object directly referenced by `object` onto `worklist`.
    fn mark(&self, object: &AsObject, worklist: &mut Vec<ObjectHandle>) {
        mark_properties(object, worklist);
    }

    /// Runs once, right after the object is registered with the context.
    fn add(&self, _cx: &mut Context, _object: ObjectHandle) {}

    /// Own-property lookup; never walks the prototype chain.
    fn get(
        &self,
        cx: &Context,
        object: ObjectHandle,
        name: Symbol,
    ) -> Option<(Value, VariableFlags)> {
        let (_, var) = lookup(cx, object, name)?;
        Some((var.value, var.flags))
    }

    fn set(&self, cx: &mut Context, object: ObjectHandle, name: Symbol, value: Value) {
        set_property(cx, object, name, value);
    }

    fn set_flags(
        &self,
        cx: &mut Context,
        object: ObjectHandle,
        name: Symbol,
        flags: VariableFlags,
        mask: VariableFlags,
    ) {
        let Some((key, _)) = lookup(cx, object, name) else {
            return;
        };
        if let Some(var) = cx
            .heap
            .get_mut(object)
            .and_then(|o| o.properties.get_mut(&key))
        {
            var.flags = var.flags.apply(flags, mask);
        }
    }

    /// Removes an own property.
    ///
    /// Returns `false` when no such property exists; a permanent property
    /// reports `true` and stays.
    fn delete(&self, cx: &mut Context, object: ObjectHandle, name: Symbol) -> bool {
        delete_property(cx, object, name)
    }

    fn foreach(&self, cx: &Context, object: ObjectHandle, visit: &mut ForeachFn<'_>) -> bool {
        for (name, value, flags) in snapshot(cx, object) {
            if !visit(name, value, flags) {
                return false;
            }
        }
        true
    }

    /// Short diagnostic name.
    fn debug(&self, _cx: &Context, _object: ObjectHandle) -> String {
        self.id().label().to_string()
    }

    /// Object that may be exposed to scripts in place of `object`.
    fn resolve(&self, _cx: &Context, object: ObjectHandle) -> ObjectHandle {
        object
    }
}

static PLAIN: PlainClass = PlainClass;
static ARRAY: ArrayClass = ArrayClass;
static FUNCTION: FunctionClass = FunctionClass;
static SCOPE: ScopeClass = ScopeClass;

pub fn class_of(kind: &ObjectKind) -> &'static dyn ObjectClass {
    match kind {
        ObjectKind::Plain => &PLAIN,
        ObjectKind::Array => &ARRAY,
        ObjectKind::Function(_) => &FUNCTION,
        ObjectKind::Scope(_) => &SCOPE,
    }
}

/// Marks the prototype and every object-valued property.
pub(crate) fn mark_properties(object: &AsObject, worklist: &mut Vec<ObjectHandle>) {
    if let Some(proto) = object.prototype {
        worklist.push(proto);
    }
    for var in object.properties.values() {
        if let Value::Object(handle) = var.value {
            worklist.push(handle);
        }
    }
}

/// Finds the own slot for `name`, returning the key it is stored under.
///
/// Exact match first; before version 7 a case-insensitive scan follows.
pub(crate) fn lookup<'a>(
    cx: &'a Context,
    object: ObjectHandle,
    name: Symbol,
) -> Option<(Symbol, &'a Variable)> {
    let obj = cx.heap.get(object)?;
    if let Some(var) = obj.properties.get(&name) {
        return Some((name, var));
    }
    if cx.is_case_sensitive() {
        return None;
    }

    let wanted = cx.interner.resolve(name);
    let (key, var) = obj
        .properties
        .iter()
        .find(|(key, _)| cx.interner.resolve(**key).eq_ignore_ascii_case(wanted))?;
    log::warn!(
        "case-insensitive match: {} resolved to {}",
        wanted,
        cx.interner.resolve(*key)
    );
    Some((*key, var))
}

/// Default write: updates the prototype link for `__proto__`, otherwise
/// assigns to an existing slot (unless read-only) or creates a new one.
pub(crate) fn set_property(cx: &mut Context, object: ObjectHandle, name: Symbol, value: Value) {
    if name == cx.names.proto {
        if let Some(obj) = cx.heap.get_mut(object) {
            obj.prototype = value.as_object();
        }
        return;
    }

    if let Some((key, _)) = lookup(cx, object, name) {
        if let Some(var) = cx
            .heap
            .get_mut(object)
            .and_then(|o| o.properties.get_mut(&key))
        {
            var.assign(value);
        }
        return;
    }

    if !cx.use_mem(VARIABLE_SIZE) {
        return;
    }
    match cx.heap.get_mut(object) {
        Some(obj) => {
            obj.properties.insert(name, Variable::new(value));
        }
        None => cx.unuse_mem(VARIABLE_SIZE),
    }
}

/// Default delete, honouring the permanent flag.
pub(crate) fn delete_property(cx: &mut Context, object: ObjectHandle, name: Symbol) -> bool {
    let Some(obj) = cx.heap.get_mut(object) else {
        return false;
    };
    match obj.properties.get(&name) {
        None => false,
        Some(var) if var.flags.contains(VariableFlags::PERMANENT) => true,
        Some(_) => {
            obj.properties.remove(&name);
            cx.unuse_mem(VARIABLE_SIZE);
            true
        }
    }
}

/// Copies out the own properties so visitors may touch the context.
pub(crate) fn snapshot(cx: &Context, object: ObjectHandle) -> Vec<(Symbol, Value, VariableFlags)> {
    cx.heap
        .get(object)
        .map(|obj| {
            obj.properties
                .iter()
                .map(|(name, var)| (*name, var.value, var.flags))
                .collect()
        })
        .unwrap_or_default()
}

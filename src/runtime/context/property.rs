use crate::runtime::{
    NativeFn,
    class::{self, ObjectClass},
    error::RuntimeError,
    gc::{FunctionHandle, ObjectHandle},
    object::{ClassId, OBJECT_SIZE, ObjectKind, VARIABLE_SIZE},
    symbol::Symbol,
    value::Value,
    variable::{Accessor, Variable, VariableFlags},
};

use super::Context;

/// Longest prototype chain a lookup will walk before it aborts the context.
pub const PROTOTYPE_RECURSION_LIMIT: usize = 256;

/// Outcome of a prototype-chain lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub flags: VariableFlags,
    /// Object on the chain that holds the property; `None` when absent.
    pub owner: Option<ObjectHandle>,
}

impl Resolved {
    pub(super) fn missing() -> Self {
        Self {
            value: Value::Undefined,
            flags: VariableFlags::NONE,
            owner: None,
        }
    }
}

fn do_nothing(_cx: &mut Context, _this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Undefined)
}

impl Context {
    fn class(&self, object: ObjectHandle) -> Option<&'static dyn ObjectClass> {
        self.heap.get(object).map(|o| class::class_of(&o.kind))
    }

    // ── Object creation ─────────────────────────────────────────────────

    /// A plain object with no prototype and no properties.
    pub fn new_empty_object(&mut self) -> Option<ObjectHandle> {
        self.operation(|cx| cx.alloc_object(ObjectKind::Plain, OBJECT_SIZE))
    }

    /// A plain object inheriting from `Object.prototype`, with its
    /// `constructor` set to `Object`.
    pub fn new_object(&mut self) -> Option<ObjectHandle> {
        self.operation(|cx| {
            let object = cx.alloc_object(ObjectKind::Plain, OBJECT_SIZE)?;
            let proto = cx.builtins.object_prototype;
            let name = cx.names.proto;
            cx.set(object, name, Value::Object(proto));
            if let Some(ctor) = cx.builtins.object {
                let name = cx.names.constructor;
                cx.set(object, name, Value::Object(ctor.object()));
            }
            Some(object)
        })
    }

    /// An empty array inheriting from `Array.prototype`.
    pub fn new_array(&mut self) -> Option<ObjectHandle> {
        self.operation(|cx| {
            let array = cx.alloc_object(ObjectKind::Array, OBJECT_SIZE)?;
            let proto = cx.builtins.array_prototype;
            let name = cx.names.proto;
            cx.set(array, name, Value::Object(proto));
            Some(array)
        })
    }

    /// An array holding `values` at indices `0..`.
    pub fn new_array_from(&mut self, values: &[Value]) -> Option<ObjectHandle> {
        self.operation(|cx| {
            let array = cx.new_array()?;
            for (index, value) in values.iter().enumerate() {
                let name = cx.interner.intern(&index.to_string());
                cx.set(array, name, *value);
            }
            Some(array)
        })
    }

    pub fn class_id(&self, object: ObjectHandle) -> Option<ClassId> {
        self.heap.get(object).map(|o| o.class_id())
    }

    pub fn prototype_of(&self, object: ObjectHandle) -> Option<ObjectHandle> {
        self.heap.get(object).and_then(|o| o.prototype)
    }

    // ── Per-kind operations ─────────────────────────────────────────────

    /// Own-property read; `__proto__` reports the prototype link.
    pub fn get(&self, object: ObjectHandle, name: Symbol) -> Option<(Value, VariableFlags)> {
        if name == self.names.proto {
            return self
                .prototype_of(object)
                .map(|proto| (Value::Object(proto), VariableFlags::DONT_ENUM));
        }
        self.class(object)?.get(self, object, name)
    }

    /// Own-property write through the object's kind. Allocation failure
    /// leaves the object unchanged.
    pub fn set(&mut self, object: ObjectHandle, name: Symbol, value: Value) {
        if let Some(class) = self.class(object) {
            class.set(self, object, name, value);
        }
    }

    pub fn set_flags(
        &mut self,
        object: ObjectHandle,
        name: Symbol,
        flags: VariableFlags,
        mask: VariableFlags,
    ) {
        if let Some(class) = self.class(object) {
            class.set_flags(self, object, name, flags, mask);
        }
    }

    pub fn set_variable_flags(&mut self, object: ObjectHandle, name: Symbol, flags: VariableFlags) {
        self.set_flags(object, name, flags, flags);
    }

    pub fn unset_variable_flags(&mut self, object: ObjectHandle, name: Symbol, flags: VariableFlags) {
        self.set_flags(object, name, VariableFlags::NONE, flags);
    }

    /// Deletes an own property; see [`ObjectClass::delete`].
    pub fn delete(&mut self, object: ObjectHandle, name: Symbol) -> bool {
        match self.class(object) {
            Some(class) => class.delete(self, object, name),
            None => false,
        }
    }

    /// Visits own properties until `visit` returns `false`; returns whether
    /// the walk completed.
    pub fn foreach(
        &self,
        object: ObjectHandle,
        mut visit: impl FnMut(Symbol, Value, VariableFlags) -> bool,
    ) -> bool {
        match self.class(object) {
            Some(class) => class.foreach(self, object, &mut visit),
            None => true,
        }
    }

    pub fn debug(&self, object: ObjectHandle) -> String {
        match self.class(object) {
            Some(class) => class.debug(self, object),
            None => "<collected>".to_string(),
        }
    }

    /// The object scripts may see in place of `object`.
    pub fn resolve(&self, object: ObjectHandle) -> ObjectHandle {
        match self.class(object) {
            Some(class) => class.resolve(self, object),
            None => object,
        }
    }

    // ── Prototype chain ─────────────────────────────────────────────────

    /// Looks `name` up on `object` and then along its prototype chain.
    ///
    /// Walking more than [`PROTOTYPE_RECURSION_LIMIT`] objects means the
    /// chain is cyclic or absurdly deep: the context is aborted and the
    /// lookup reports a missing property.
    pub fn resolve_property(&mut self, object: ObjectHandle, name: Symbol) -> Resolved {
        let mut current = Some(object);
        for _ in 0..PROTOTYPE_RECURSION_LIMIT {
            let Some(obj) = current else {
                return Resolved::missing();
            };
            if let Some((value, flags)) = self.get(obj, name) {
                return Resolved {
                    value,
                    flags,
                    owner: Some(obj),
                };
            }
            current = self.prototype_of(obj);
        }
        if current.is_some() {
            log::warn!(
                "prototype chain of {} longer than {} while looking up {}",
                self.debug(object),
                PROTOTYPE_RECURSION_LIMIT,
                self.string(name)
            );
            self.abort(RuntimeError::PrototypeRecursion);
        }
        Resolved::missing()
    }

    /// Script-level read: prototype-chain lookup that runs getters of
    /// native variables with `object` as `this`.
    pub fn get_variable(&mut self, object: ObjectHandle, name: Symbol) -> Result<Value, RuntimeError> {
        let resolved = self.resolve_property(object, name);
        self.ensure_running()?;
        if resolved.flags.contains(VariableFlags::NATIVE) {
            if let Some(accessor) = resolved.owner.and_then(|owner| self.accessor(owner, name)) {
                return self.operation(|cx| (accessor.get)(cx, object, &[]));
            }
        }
        Ok(resolved.value)
    }

    /// Script-level write: runs the setter of an own native variable,
    /// otherwise writes through the object's kind.
    pub fn set_variable(
        &mut self,
        object: ObjectHandle,
        name: Symbol,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.ensure_running()?;
        if let Some(accessor) = self.accessor(object, name) {
            match accessor.set {
                Some(setter) => {
                    self.operation(|cx| setter(cx, object, &[value]))?;
                }
                None => log::debug!("{} has no setter", self.string(name)),
            }
            return Ok(());
        }
        self.set(object, name, value);
        Ok(())
    }

    fn accessor(&self, object: ObjectHandle, name: Symbol) -> Option<Accessor> {
        let (_, var) = class::lookup(self, object, name)?;
        if var.flags.contains(VariableFlags::NATIVE) {
            var.accessor
        } else {
            None
        }
    }

    /// Reads an own property without running accessors or walking the
    /// chain.
    pub fn peek_variable(&self, object: ObjectHandle, name: Symbol) -> Option<Value> {
        class::lookup(self, object, name).map(|(_, var)| var.value)
    }

    /// Defines a native variable backed by `getter` and, unless read-only,
    /// `setter`.
    pub fn add_variable(
        &mut self,
        object: ObjectHandle,
        name: &str,
        getter: NativeFn,
        setter: Option<NativeFn>,
    ) -> bool {
        let name = self.interner.intern(name);
        let accessor = Accessor {
            get: getter,
            set: setter,
        };

        if let Some((key, _)) = class::lookup(self, object, name) {
            if let Some(var) = self
                .heap
                .get_mut(object)
                .and_then(|o| o.properties.get_mut(&key))
            {
                var.flags |= VariableFlags::NATIVE;
                var.accessor = Some(accessor);
                return true;
            }
            return false;
        }

        if !self.heap.contains(object) || !self.use_mem(VARIABLE_SIZE) {
            return false;
        }
        match self.heap.get_mut(object) {
            Some(obj) => {
                obj.properties.insert(
                    name,
                    Variable {
                        value: Value::Undefined,
                        flags: VariableFlags::NATIVE,
                        accessor: Some(accessor),
                    },
                );
                true
            }
            None => {
                self.unuse_mem(VARIABLE_SIZE);
                false
            }
        }
    }

    // ── Bulk operations ─────────────────────────────────────────────────

    /// Removes every own property `remove` selects, ignoring the permanent
    /// flag. Returns how many were removed.
    pub fn foreach_remove(
        &mut self,
        object: ObjectHandle,
        mut remove: impl FnMut(Symbol, Value, VariableFlags) -> bool,
    ) -> usize {
        let doomed: Vec<Symbol> = class::snapshot(self, object)
            .into_iter()
            .filter(|(name, value, flags)| remove(*name, *value, *flags))
            .map(|(name, _, _)| name)
            .collect();

        let Some(obj) = self.heap.get_mut(object) else {
            return 0;
        };
        let removed = doomed
            .iter()
            .filter(|name| obj.properties.remove(name).is_some())
            .count();
        self.unuse_mem(removed * VARIABLE_SIZE);
        removed
    }

    /// Renames own properties: `rename` returns the new name, or `None` to
    /// drop the property. Values and flags move with the name.
    pub fn foreach_rename(
        &mut self,
        object: ObjectHandle,
        mut rename: impl FnMut(&Context, Symbol, Value, VariableFlags) -> Option<Symbol>,
    ) {
        let Some(obj) = self.heap.get(object) else {
            return;
        };
        let mut entries: Vec<(Symbol, Variable)> =
            obj.properties.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(name, _)| *name);

        let cx: &Context = self;
        let renamed: Vec<(Symbol, Variable)> = entries
            .into_iter()
            .filter_map(|(name, var)| {
                rename(cx, name, var.value, var.flags).map(|new_name| (new_name, var))
            })
            .collect();

        let Some(obj) = self.heap.get_mut(object) else {
            return;
        };
        let before = obj.properties.len();
        obj.properties = renamed.into_iter().collect();
        let dropped = before.saturating_sub(obj.properties.len());
        self.unuse_mem(dropped * VARIABLE_SIZE);
    }

    // ── Functions and constructors ──────────────────────────────────────

    /// Narrows an object handle to a function handle.
    pub fn as_function(&self, object: ObjectHandle) -> Option<FunctionHandle> {
        self.heap
            .get(object)
            .and_then(|o| o.function())
            .map(|_| FunctionHandle(object))
    }

    pub fn value_as_function(&self, value: &Value) -> Option<FunctionHandle> {
        value.as_object().and_then(|object| self.as_function(object))
    }

    /// Whether `name` resolves (through the chain) to a function.
    pub fn has_function(&mut self, object: ObjectHandle, name: Symbol) -> bool {
        let resolved = self.resolve_property(object, name);
        self.value_as_function(&resolved.value).is_some()
    }

    /// Attaches a native routine as a non-enumerable property.
    ///
    /// `this_class` restricts the kind of `this` the routine runs on;
    /// `native` of `None` installs a routine that does nothing.
    pub fn add_function(
        &mut self,
        object: ObjectHandle,
        name: &str,
        this_class: Option<ClassId>,
        native: Option<NativeFn>,
        min_args: usize,
    ) -> Option<FunctionHandle> {
        self.operation(|cx| {
            let function = cx.new_native_function(name, native.unwrap_or(do_nothing), min_args)?;
            cx.set_this_class(function, this_class);
            let name = cx.interner.intern(name);
            cx.set(object, name, Value::Object(function.object()));
            cx.set_variable_flags(object, name, VariableFlags::DONT_ENUM);
            Some(function)
        })
    }

    /// Links `object` to the constructor that created it: its prototype
    /// becomes the constructor's own `prototype` property, and the
    /// constructor is recorded under `constructor` for scripted functions
    /// or `__constructor__` for native ones.
    pub fn set_constructor(&mut self, object: ObjectHandle, ctor: ObjectHandle, scripted: bool) {
        let prototype = self.names.prototype;
        let proto = match self.get(ctor, prototype) {
            Some((Value::Object(proto), _)) => proto,
            _ => {
                log::warn!(
                    "constructor {} has no prototype object; using Object.prototype",
                    self.debug(ctor)
                );
                self.builtins.object_prototype
            }
        };

        let name = self.names.proto;
        self.set(object, name, Value::Object(proto));
        let name = if scripted {
            self.names.constructor
        } else {
            self.names.native_constructor
        };
        self.set(object, name, Value::Object(ctor));
    }
}

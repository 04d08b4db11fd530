use std::rc::Rc;

use crate::runtime::{
    NativeFn,
    error::RuntimeError,
    frame::{Args, CallKind, Frame, FrameState, ScriptedFrame},
    function::{ConstructInfo, FunctionBody, FunctionData, NativeFunction},
    gc::{FunctionHandle, ObjectHandle},
    object::{ClassId, FUNCTION_SIZE, OBJECT_SIZE, ObjectKind, ScopeData},
    script::{Script, ScriptFlags},
    symbol::Symbol,
    value::Value,
    variable::VariableFlags,
};

use super::{Context, PROTOTYPE_RECURSION_LIMIT, Resolved};

impl Context {
    // ── Function objects ────────────────────────────────────────────────

    pub fn new_native_function(
        &mut self,
        name: &str,
        func: NativeFn,
        min_args: usize,
    ) -> Option<FunctionHandle> {
        let name = self.interner.intern(name);
        self.operation(|cx| cx.new_function(FunctionData::native(name, func, min_args)))
    }

    /// A function running `script`, closing over `scope`. It gets a fresh
    /// `prototype` object whose `constructor` points back at it.
    pub fn new_scripted_function(
        &mut self,
        script: Rc<Script>,
        scope: Option<ObjectHandle>,
    ) -> Option<FunctionHandle> {
        self.operation(|cx| {
            let function = cx.new_function(FunctionData::scripted(script, scope))?;
            let prototype = cx.new_object()?;

            let constructor = cx.names.constructor;
            cx.set(prototype, constructor, Value::Object(function.object()));
            cx.set_variable_flags(prototype, constructor, VariableFlags::DONT_ENUM);

            let name = cx.names.prototype;
            cx.set(function.object(), name, Value::Object(prototype));
            cx.set_variable_flags(function.object(), name, VariableFlags::DONT_ENUM);
            Some(function)
        })
    }

    fn new_function(&mut self, data: FunctionData) -> Option<FunctionHandle> {
        let object = self.alloc_object(ObjectKind::Function(Box::new(data)), FUNCTION_SIZE)?;
        let proto = self.builtins.function_prototype;
        let name = self.names.proto;
        self.set(object, name, Value::Object(proto));
        Some(FunctionHandle(object))
    }

    fn native_mut(&mut self, function: FunctionHandle) -> Option<&mut NativeFunction> {
        match &mut self.heap.get_mut(function.object())?.kind {
            ObjectKind::Function(data) => match &mut data.body {
                FunctionBody::Native(native) => Some(native),
                FunctionBody::Scripted { .. } => None,
            },
            _ => None,
        }
    }

    /// Restricts a native routine to `this` objects of one kind.
    pub fn set_this_class(&mut self, function: FunctionHandle, class: Option<ClassId>) {
        if let Some(native) = self.native_mut(function) {
            native.this_class = class;
        }
    }

    /// Makes `create` allocate objects of `info.class` for this native
    /// constructor.
    pub fn set_construct_info(&mut self, function: FunctionHandle, info: ConstructInfo) {
        if let Some(native) = self.native_mut(function) {
            native.construct = Some(info);
        }
    }

    fn function_data(&self, function: FunctionHandle) -> Option<FunctionData> {
        self.heap.get(function.object())?.function().cloned()
    }

    // ── Calls ───────────────────────────────────────────────────────────

    /// Calls `function` with `this` and runs it to completion.
    pub fn call(
        &mut self,
        function: FunctionHandle,
        this: ObjectHandle,
        args: Args<'_>,
    ) -> Result<Value, RuntimeError> {
        self.operation(|cx| cx.invoke(function, this, args, CallKind::Invoke))
    }

    /// Calls `callee` if it is a function. Anything else is logged and
    /// yields `undefined`; stack arguments are consumed either way.
    pub fn call_value(
        &mut self,
        callee: &Value,
        this: ObjectHandle,
        args: Args<'_>,
    ) -> Result<Value, RuntimeError> {
        match self.value_as_function(callee) {
            Some(function) => self.call(function, this, args),
            None => {
                self.take_args(args);
                log::warn!("{} is not a function", callee.type_name());
                Ok(Value::Undefined)
            }
        }
    }

    /// Resolves `name` on `object` and calls it as a method of `object`.
    /// A missing or non-function property yields `undefined`.
    pub fn object_call(
        &mut self,
        object: ObjectHandle,
        name: Symbol,
        args: Args<'_>,
    ) -> Result<Value, RuntimeError> {
        let resolved = self.resolve_property(object, name);
        self.ensure_running()?;
        match self.value_as_function(&resolved.value) {
            Some(function) => self.call(function, object, args),
            None => {
                self.take_args(args);
                log::debug!("{} has no method {}", self.debug(object), self.string(name));
                Ok(Value::Undefined)
            }
        }
    }

    /// `new function(args)`: allocates the instance, links it to its
    /// constructor and runs the constructor on it.
    ///
    /// Returns `None` when the instance cannot be allocated. An object
    /// returned by the constructor replaces the instance.
    pub fn create(
        &mut self,
        function: FunctionHandle,
        args: Args<'_>,
    ) -> Result<Option<ObjectHandle>, RuntimeError> {
        self.operation(|cx| cx.construct(function, args))
    }

    fn construct(
        &mut self,
        function: FunctionHandle,
        args: Args<'_>,
    ) -> Result<Option<ObjectHandle>, RuntimeError> {
        self.ensure_running()?;
        let Some(data) = self.function_data(function) else {
            self.take_args(args);
            log::warn!("create through stale function {:?}", function);
            return Ok(None);
        };
        let info = data.construct_info().unwrap_or(ConstructInfo {
            class: ClassId::Object,
            size: OBJECT_SIZE,
        });
        let Some(object) = self.alloc_object(ObjectKind::for_class(info.class), info.size) else {
            self.take_args(args);
            return Ok(None);
        };
        self.set_constructor(object, function.object(), false);

        let result = self.invoke(function, object, args, CallKind::Construct)?;
        Ok(Some(match result {
            Value::Object(returned) if self.heap.contains(returned) => returned,
            _ => object,
        }))
    }

    /// Runs a top-level script with `this` as both `this` and the scope
    /// target.
    pub fn run(&mut self, this: ObjectHandle, script: Rc<Script>) -> Result<Value, RuntimeError> {
        self.ensure_running()?;
        if script.version() != self.config.version {
            log::debug!(
                "script {} targets version {}, context runs {}",
                script.name(),
                script.version(),
                self.config.version
            );
        }
        let scope = ScopeData {
            parent: None,
            target: Some(this),
        };
        self.operation(|cx| {
            cx.call_scripted(None, script, scope, Some(this), Args::none(), CallKind::Invoke)
        })
    }

    fn invoke(
        &mut self,
        function: FunctionHandle,
        this: ObjectHandle,
        args: Args<'_>,
        kind: CallKind,
    ) -> Result<Value, RuntimeError> {
        self.ensure_running()?;
        let Some(data) = self.function_data(function) else {
            self.take_args(args);
            log::warn!("call through stale function {:?}", function);
            return Ok(Value::Undefined);
        };
        match data.body {
            FunctionBody::Native(native) => {
                let args = self.take_args(args);
                self.call_native(function, native, this, args, kind)
            }
            FunctionBody::Scripted { script, scope } => {
                let scope = ScopeData {
                    parent: scope,
                    target: None,
                };
                self.call_scripted(Some(function), script, scope, Some(this), args, kind)
            }
        }
    }

    /// Materialises the argument vector, clamping a stack request to what
    /// the current frame actually pushed.
    fn take_args(&mut self, args: Args<'_>) -> Vec<Value> {
        match args {
            Args::Values(values) => values.to_vec(),
            Args::Stack(requested) => {
                let available = self.frame_stack_len();
                if requested > available {
                    log::warn!(
                        "call wants {} arguments, only {} on the stack",
                        requested,
                        available
                    );
                }
                let count = requested.min(available);
                let split = self.stack.len() - count;
                let mut taken = self.stack.split_off(split);
                taken.reverse();
                taken
            }
        }
    }

    fn native_may_run(&self, native: &NativeFunction, this: ObjectHandle, argc: usize) -> bool {
        if argc < native.min_args {
            log::debug!(
                "{} skipped: {} arguments, needs {}",
                self.string(native.name),
                argc,
                native.min_args
            );
            return false;
        }
        if let Some(required) = native.this_class {
            let actual = self.heap.get(this).map(|o| o.class_id());
            if actual != Some(required) {
                log::debug!(
                    "{} skipped: this is not {}",
                    self.string(native.name),
                    required
                );
                return false;
            }
        }
        true
    }

    fn call_native(
        &mut self,
        function: FunctionHandle,
        native: NativeFunction,
        this: ObjectHandle,
        args: Vec<Value>,
        kind: CallKind,
    ) -> Result<Value, RuntimeError> {
        let runnable = self.native_may_run(&native, this, args.len());
        let stack_base = self.stack.len();
        let frame = Frame::native(function, this, args.clone(), native.name, kind, stack_base);
        self.push_frame(frame)?;
        self.activate_frame();

        let result = if runnable {
            (native.func)(self, this, &args)
        } else {
            Ok(Value::Undefined)
        };
        self.finish_frame(result)
    }

    fn call_scripted(
        &mut self,
        function: Option<FunctionHandle>,
        script: Rc<Script>,
        scope: ScopeData,
        this: Option<ObjectHandle>,
        args: Args<'_>,
        kind: CallKind,
    ) -> Result<Value, RuntimeError> {
        // Allocate before popping stack arguments so a collection here
        // still sees them.
        let newborn_base = self.newborn.len();
        let Some(activation) = self.alloc_object(ObjectKind::Scope(scope), OBJECT_SIZE) else {
            self.take_args(args);
            log::warn!("no memory for the activation of {}", script.name());
            return Ok(Value::Undefined);
        };
        let args = self.take_args(args);
        let constants = script
            .constant_pool()
            .iter()
            .map(|s| self.interner.intern(s))
            .collect();
        let scripted = ScriptedFrame {
            script: Rc::clone(&script),
            registers: vec![Value::Undefined; script.n_registers() as usize],
            activation,
            constants,
        };
        let frame = Frame::scripted(function, this, args, scripted, kind, self.stack.len());
        self.push_frame(frame)?;
        // The frame holds its activation; it needs no newborn slot.
        if let Some(frame) = self.frame_mut() {
            frame.newborn_base = newborn_base;
        }
        self.preload();
        self.activate_frame();

        let executor = Rc::clone(&self.executor);
        let result = executor.execute(self);
        self.finish_frame(result)
    }

    fn activate_frame(&mut self) {
        if let Some(frame) = self.frame_mut() {
            frame.state = FrameState::Active;
        }
    }

    /// Pops the current frame. A failed or aborted call aborts the context
    /// and reports the error to the caller.
    fn finish_frame(&mut self, result: Result<Value, RuntimeError>) -> Result<Value, RuntimeError> {
        match result.and_then(|value| self.ensure_running().map(|()| value)) {
            Ok(value) => {
                if let Some(frame) = self.frame_mut() {
                    frame.return_value = value;
                    frame.state = FrameState::Returned;
                }
                self.pop_frame();
                // The caller has not stored the result yet.
                if let Value::Object(object) = value {
                    self.newborn.push(object);
                }
                Ok(value)
            }
            Err(err) => {
                self.abort(err.clone());
                if let Some(frame) = self.frame_mut() {
                    frame.state = FrameState::Aborted;
                }
                self.pop_frame();
                Err(err)
            }
        }
    }

    // ── Scripted frame setup ────────────────────────────────────────────

    /// Fills the current scripted frame's registers and locals.
    ///
    /// Registers are preloaded from register 1 in the order `this`,
    /// `arguments`, `super`, `_root`, `_parent`, `_global`, one register per
    /// requested value. Declared arguments go to their preload register, or
    /// become locals of the activation when they have none.
    fn preload(&mut self) {
        let Some(frame) = self.frames.last() else {
            return;
        };
        let Some(scripted) = frame.scripted_frame() else {
            return;
        };
        let script = Rc::clone(&scripted.script);
        let activation = scripted.activation;
        let n_registers = scripted.registers.len();
        let this = frame.this;
        let function = frame.function;
        let args = frame.args.clone();
        let flags = script.flags();

        let this_value = this.map(Value::Object).unwrap_or_default();
        let mut arguments = None;
        let mut registers: Vec<(usize, Value)> = Vec::new();
        let mut next = 1;

        if flags.contains(ScriptFlags::PRELOAD_THIS) {
            registers.push((next, this_value));
            next += 1;
        }
        if flags.contains(ScriptFlags::PRELOAD_ARGS) {
            let value = self.arguments_object(&args, function);
            arguments = Some(value);
            registers.push((next, value));
            next += 1;
        }
        if flags.contains(ScriptFlags::PRELOAD_SUPER) {
            let value = this
                .and_then(|this| self.prototype_of(this))
                .and_then(|proto| self.prototype_of(proto))
                .map(Value::Object)
                .unwrap_or_default();
            registers.push((next, value));
            next += 1;
        }
        if flags.contains(ScriptFlags::PRELOAD_ROOT) {
            // No movie hierarchy: `_root` stays undefined.
            next += 1;
        }
        if flags.contains(ScriptFlags::PRELOAD_PARENT) {
            next += 1;
        }
        if flags.contains(ScriptFlags::PRELOAD_GLOBAL) {
            registers.push((next, Value::Object(self.builtins.global)));
        }

        if !flags.contains(ScriptFlags::SUPPRESS_THIS) {
            let name = self.names.this;
            self.set(activation, name, this_value);
        }
        if !flags.contains(ScriptFlags::SUPPRESS_ARGS) {
            let value = match arguments {
                Some(value) => value,
                None => self.arguments_object(&args, function),
            };
            let name = self.names.arguments;
            self.set(activation, name, value);
        }

        for (index, argument) in script.arguments().iter().enumerate() {
            let value = args.get(index).copied().unwrap_or_default();
            let register = argument.preload as usize;
            if register > 0 && register < n_registers {
                registers.push((register, value));
                continue;
            }
            if register > 0 {
                log::warn!(
                    "{}: argument {} wants register {} of {}",
                    script.name(),
                    argument.name,
                    register,
                    n_registers
                );
            }
            let name = self.interner.intern(&argument.name);
            self.set(activation, name, value);
        }

        if let Some(frame) = self.frames.last_mut() {
            for (register, value) in registers {
                if !frame.set_register(register, value) {
                    log::warn!("preload register {} out of range", register);
                }
            }
        }
    }

    fn arguments_object(&mut self, args: &[Value], callee: Option<FunctionHandle>) -> Value {
        let Some(array) = self.new_array_from(args) else {
            return Value::Undefined;
        };
        if let Some(callee) = callee {
            let name = self.names.callee;
            self.set(array, name, Value::Object(callee.object()));
            self.set_variable_flags(array, name, VariableFlags::DONT_ENUM);
        }
        Value::Object(array)
    }

    // ── Name lookup ─────────────────────────────────────────────────────

    /// Resolves an unqualified name from the current frame: the activation
    /// chain (each scope's locals, then its target with prototypes), then
    /// the global object.
    pub fn find_variable(&mut self, name: Symbol) -> Resolved {
        let mut scope = self.frames.last().and_then(Frame::activation);
        let mut depth = 0;
        while let Some(current) = scope {
            if depth >= PROTOTYPE_RECURSION_LIMIT {
                self.abort(RuntimeError::PrototypeRecursion);
                return Resolved::missing();
            }
            if let Some((value, flags)) = self.get(current, name) {
                return Resolved {
                    value,
                    flags,
                    owner: Some(current),
                };
            }
            let data = self.heap.get(current).and_then(|o| o.scope()).copied();
            if let Some(target) = data.and_then(|d| d.target) {
                let resolved = self.resolve_property(target, name);
                if resolved.owner.is_some() || self.is_aborted() {
                    return resolved;
                }
            }
            scope = data.and_then(|d| d.parent);
            depth += 1;
        }
        let global = self.builtins.global;
        self.resolve_property(global, name)
    }
}

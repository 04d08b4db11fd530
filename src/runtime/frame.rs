use std::rc::Rc;

use crate::runtime::{
    gc::{FunctionHandle, ObjectHandle},
    script::Script,
    symbol::Symbol,
    value::Value,
};

/// How a function is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Invoke,
    /// `new F(...)`: an object-valued return replaces the constructed
    /// object, a primitive return does not.
    Construct,
}

/// Where a call takes its arguments from.
#[derive(Debug, Clone, Copy)]
pub enum Args<'a> {
    /// Values supplied directly by the host.
    Values(&'a [Value]),
    /// The top `n` entries of the calling frame's value stack, first
    /// argument on top. `n` is clamped to what the frame actually pushed.
    Stack(usize),
}

impl Args<'_> {
    pub fn none() -> Args<'static> {
        Args::Values(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Created,
    Active,
    Returned,
    Aborted,
}

/// Register file, scope and constants of a frame running a script.
#[derive(Debug, Clone)]
pub struct ScriptedFrame {
    pub script: Rc<Script>,
    pub registers: Vec<Value>,
    /// Head of the lexical scope chain: this frame's activation object.
    pub activation: ObjectHandle,
    /// The script's constant pool, interned.
    pub constants: Vec<Symbol>,
}

#[derive(Debug, Clone)]
pub enum FrameKind {
    /// Lightweight frame of a host routine: just name, args and `this`.
    Native,
    Scripted(ScriptedFrame),
}

/// Activation record of one call.
///
/// The caller is the frame below this one on the context's frame stack.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub call_kind: CallKind,
    pub state: FrameState,
    /// `None` for a top-level script run.
    pub function: Option<FunctionHandle>,
    pub this: Option<ObjectHandle>,
    pub args: Vec<Value>,
    pub return_value: Value,
    pub name: Option<Symbol>,
    /// Value-stack height when the frame was entered.
    pub stack_base: usize,
    /// Where this frame's share of the context's newborn set begins.
    pub(crate) newborn_base: usize,
}

impl Frame {
    pub fn native(
        function: FunctionHandle,
        this: ObjectHandle,
        args: Vec<Value>,
        name: Symbol,
        call_kind: CallKind,
        stack_base: usize,
    ) -> Self {
        Self {
            kind: FrameKind::Native,
            call_kind,
            state: FrameState::Created,
            function: Some(function),
            this: Some(this),
            args,
            return_value: Value::Undefined,
            name: Some(name),
            stack_base,
            newborn_base: 0,
        }
    }

    pub fn scripted(
        function: Option<FunctionHandle>,
        this: Option<ObjectHandle>,
        args: Vec<Value>,
        scripted: ScriptedFrame,
        call_kind: CallKind,
        stack_base: usize,
    ) -> Self {
        Self {
            kind: FrameKind::Scripted(scripted),
            call_kind,
            state: FrameState::Created,
            function,
            this,
            args,
            return_value: Value::Undefined,
            name: None,
            stack_base,
            newborn_base: 0,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, FrameKind::Native)
    }

    pub fn is_construct(&self) -> bool {
        self.call_kind == CallKind::Construct
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// Argument `index`, or `undefined` past the end.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).copied().unwrap_or_default()
    }

    pub fn scripted_frame(&self) -> Option<&ScriptedFrame> {
        match &self.kind {
            FrameKind::Scripted(scripted) => Some(scripted),
            FrameKind::Native => None,
        }
    }

    pub fn activation(&self) -> Option<ObjectHandle> {
        self.scripted_frame().map(|s| s.activation)
    }

    pub fn register(&self, index: usize) -> Value {
        self.scripted_frame()
            .and_then(|s| s.registers.get(index).copied())
            .unwrap_or_default()
    }

    /// Writes a register; out-of-range writes are ignored.
    pub fn set_register(&mut self, index: usize, value: Value) -> bool {
        match &mut self.kind {
            FrameKind::Scripted(scripted) => match scripted.registers.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            FrameKind::Native => false,
        }
    }

    /// Pushes every object this frame keeps alive.
    pub(crate) fn trace(&self, out: &mut Vec<ObjectHandle>) {
        out.extend(self.this);
        out.extend(self.function.map(FunctionHandle::object));
        out.extend(self.args.iter().filter_map(Value::as_object));
        out.extend(self.return_value.as_object());
        if let FrameKind::Scripted(scripted) = &self.kind {
            out.push(scripted.activation);
            out.extend(scripted.registers.iter().filter_map(Value::as_object));
        }
    }
}

use std::{fmt, rc::Rc};

use crate::runtime::{
    NativeFn, gc::ObjectHandle, object::ClassId, script::Script, symbol::Symbol,
};

/// What a `new` expression allocates before running a native constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructInfo {
    pub class: ClassId,
    /// Bytes charged against the quota for the new object.
    pub size: usize,
}

/// Host-implemented callable.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Symbol,
    pub func: NativeFn,
    /// The routine is skipped when fewer arguments are supplied.
    pub min_args: usize,
    /// The routine is skipped unless `this` is of this kind.
    pub this_class: Option<ClassId>,
    pub construct: Option<ConstructInfo>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("this_class", &self.this_class)
            .field("construct", &self.construct)
            .finish()
    }
}

/// Exactly one of the two callable flavours.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    Native(NativeFunction),
    Scripted {
        script: Rc<Script>,
        /// Activation object of the frame the function was defined in.
        scope: Option<ObjectHandle>,
    },
}

/// Payload of a function object.
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub body: FunctionBody,
}

impl FunctionData {
    pub fn native(name: Symbol, func: NativeFn, min_args: usize) -> Self {
        Self {
            body: FunctionBody::Native(NativeFunction {
                name,
                func,
                min_args,
                this_class: None,
                construct: None,
            }),
        }
    }

    pub fn scripted(script: Rc<Script>, scope: Option<ObjectHandle>) -> Self {
        Self {
            body: FunctionBody::Scripted { script, scope },
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::Native(_))
    }

    pub fn construct_info(&self) -> Option<ConstructInfo> {
        match &self.body {
            FunctionBody::Native(native) => native.construct,
            FunctionBody::Scripted { .. } => None,
        }
    }

    pub fn scope(&self) -> Option<ObjectHandle> {
        match &self.body {
            FunctionBody::Native(_) => None,
            FunctionBody::Scripted { scope, .. } => *scope,
        }
    }
}

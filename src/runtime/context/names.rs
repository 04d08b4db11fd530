use crate::runtime::{interner::Interner, symbol::Symbol};

/// Property names the runtime itself looks up, interned once per context.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Names {
    pub proto: Symbol,
    pub prototype: Symbol,
    pub constructor: Symbol,
    pub native_constructor: Symbol,
    pub length: Symbol,
    pub this: Symbol,
    pub arguments: Symbol,
    pub callee: Symbol,
    pub object: Symbol,
    pub function: Symbol,
    pub array: Symbol,
    pub empty: Symbol,
}

impl Names {
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            proto: interner.intern("__proto__"),
            prototype: interner.intern("prototype"),
            constructor: interner.intern("constructor"),
            native_constructor: interner.intern("__constructor__"),
            length: interner.intern("length"),
            this: interner.intern("this"),
            arguments: interner.intern("arguments"),
            callee: interner.intern("callee"),
            object: interner.intern("Object"),
            function: interner.intern("Function"),
            array: interner.intern("Array"),
            empty: interner.intern(""),
        }
    }
}

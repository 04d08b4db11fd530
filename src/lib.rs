pub mod runtime;

pub use runtime::{
    config::RuntimeConfig,
    context::Context,
    error::RuntimeError,
    frame::{Args, CallKind},
    gc::{FunctionHandle, ObjectHandle},
    symbol::Symbol,
    value::Value,
    variable::VariableFlags,
};

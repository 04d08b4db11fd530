//! Runtime core: values, the object model, the garbage-collected context and
//! the call protocol.
//!
//! # Ownership Model
//! Every object lives in the [`gc::ObjectHeap`] owned by one
//! [`context::Context`]. Objects refer to each other only through
//! [`gc::ObjectHandle`] indices, never through owning pointers, so reference
//! cycles (an object whose prototype points back at it, a function whose
//! scope holds the function) are ordinary data and are reclaimed by the
//! mark-and-sweep pass like anything else.
//!
//! The invariant is:
//! - A handle is only meaningful for the context that issued it.
//! - A handle into a swept slot is stale; lookups through it yield nothing.
//! - Objects stay alive only while reachable from the context roots (global
//!   object, built-ins, host roots, the value stack, the frame stack, and
//!   objects allocated by a frame, scope or operation that is still open).
use crate::runtime::{context::Context, error::RuntimeError, gc::ObjectHandle, value::Value};

pub mod builtins;
pub mod class;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod frame;
pub mod function;
pub mod gc;
pub mod interner;
pub mod object;
pub mod script;
pub mod symbol;
pub mod value;
pub mod variable;

/// Signature of host-implemented routines.
///
/// The routine receives the context, the `this` object of the call and the
/// (already clamped) argument vector. Returning `Err` aborts the current
/// top-level execution.
pub type NativeFn = fn(&mut Context, ObjectHandle, &[Value]) -> Result<Value, RuntimeError>;

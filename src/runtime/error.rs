use thiserror::Error;

/// Faults that abort the current top-level execution.
///
/// Allocation failures are not represented here: they fail soft and are
/// reported through `Option`/`bool` results instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("prototype recursion limit exceeded")]
    PrototypeRecursion,
    #[error("call stack depth limit of {depth} exceeded")]
    CallDepthExceeded { depth: usize },
    #[error("script ran longer than {millis} ms")]
    Timeout { millis: u64 },
    /// Raised by a native routine.
    #[error("{0}")]
    Native(String),
    /// The context was already aborted; carries the original reason.
    #[error("execution aborted: {0}")]
    Aborted(String),
}

impl RuntimeError {
    pub fn native(message: impl Into<String>) -> Self {
        RuntimeError::Native(message.into())
    }
}

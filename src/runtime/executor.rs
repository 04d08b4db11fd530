use crate::runtime::{context::Context, error::RuntimeError, value::Value};

/// The bytecode interpreter, as seen by the call protocol.
///
/// When a scripted frame has been pushed and preloaded, the context calls
/// [`ScriptExecutor::execute`]; the frame is the context's current frame for
/// the duration of the call. The executor reads registers, arguments and
/// constants from it, may re-enter the context (`call`, `create`, property
/// operations) and returns the frame's result. It should consult
/// [`Context::check_continue`] between instructions and stop when it reports
/// `false`.
pub trait ScriptExecutor {
    fn execute(&self, cx: &mut Context) -> Result<Value, RuntimeError>;
}

/// Executor used until the host installs an interpreter: scripts run to an
/// immediate `undefined` result.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullExecutor;

impl ScriptExecutor for NullExecutor {
    fn execute(&self, cx: &mut Context) -> Result<Value, RuntimeError> {
        if let Some(script) = cx
            .frame()
            .and_then(|frame| frame.scripted_frame())
            .map(|scripted| scripted.script.clone())
        {
            log::debug!(
                "no executor installed; skipping script {} [{}]",
                script.name(),
                script.short_id()
            );
        }
        Ok(Value::Undefined)
    }
}

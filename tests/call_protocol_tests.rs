use std::rc::Rc;

use asvm::{
    Args, CallKind, Context, ObjectHandle, RuntimeConfig, RuntimeError, Value,
    runtime::{
        executor::ScriptExecutor,
        script::{Script, ScriptArgument, ScriptFlags},
    },
};

fn argc(_cx: &mut Context, _this: ObjectHandle, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(args.len() as f64))
}

/// Records on `this` whether it ran as a constructor.
fn call_kind(cx: &mut Context, this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
    let construct = cx.frame().is_some_and(|f| f.call_kind == CallKind::Construct);
    let name = cx.intern("constructed");
    cx.set(this, name, Value::Boolean(construct));
    Ok(Value::Boolean(construct))
}

/// Interprets every script as "call the global `helper` with my first
/// argument, then add one".
struct CallHelper;

impl ScriptExecutor for CallHelper {
    fn execute(&self, cx: &mut Context) -> Result<Value, RuntimeError> {
        let arg = cx.frame().map(|f| f.arg(0)).unwrap_or_default();
        let helper = cx.intern("helper");
        let global = cx.global();
        cx.push_value(arg);
        let result = cx.object_call(global, helper, Args::Stack(1))?;
        Ok(Value::Number(result.as_number().unwrap_or(f64::NAN) + 1.0))
    }
}

fn double(_cx: &mut Context, _this: ObjectHandle, args: &[Value]) -> Result<Value, RuntimeError> {
    let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
    Ok(Value::Number(n * 2.0))
}

#[test]
fn requested_arguments_are_clamped_to_stack() {
    let mut cx = Context::new(RuntimeConfig::default());
    let f = cx.new_native_function("argc", argc, 0).unwrap();
    let this = cx.global();

    cx.push_value(Value::Number(1.0));
    cx.push_value(Value::Number(2.0));
    assert_eq!(cx.call(f, this, Args::Stack(5)), Ok(Value::Number(2.0)));
    assert_eq!(cx.stack_len(), 0);
}

#[test]
fn create_wires_prototype_and_constructor() {
    let mut cx = Context::new(RuntimeConfig::default());
    let script = Rc::new(Script::new("Point", 8, vec![0u8]));
    let f = cx.new_scripted_function(script, None).unwrap();
    let prototype_name = cx.intern("prototype");
    let prototype = cx
        .peek_variable(f.object(), prototype_name)
        .and_then(|v| v.as_object())
        .unwrap();

    let object = cx.create(f, Args::none()).unwrap().unwrap();
    assert_eq!(cx.prototype_of(object), Some(prototype));
    let native_ctor = cx.intern("__constructor__");
    assert_eq!(cx.peek_variable(object, native_ctor), Some(Value::Object(f.object())));
}

#[test]
fn construct_kind_reaches_native() {
    let mut cx = Context::new(RuntimeConfig::default());
    let f = cx.new_native_function("kind", call_kind, 0).unwrap();
    let this = cx.global();

    assert_eq!(cx.call(f, this, Args::none()), Ok(Value::Boolean(false)));
    let object = cx.create(f, Args::none()).unwrap().unwrap();
    assert_ne!(object, this);
    let name = cx.intern("constructed");
    assert_eq!(cx.peek_variable(object, name), Some(Value::Boolean(true)));
}

#[test]
fn scripted_frames_reenter_the_context() {
    let mut cx = Context::new(RuntimeConfig::default());
    cx.set_executor(Rc::new(CallHelper));
    let global = cx.global();
    cx.add_function(global, "helper", None, Some(double), 1);

    let script = Rc::new(
        Script::new("addOne", 8, vec![0u8])
            .with_registers(2)
            .with_arguments(vec![ScriptArgument::new("n", 1)])
            .with_flags(ScriptFlags::SUPPRESS_ARGS),
    );
    let f = cx.new_scripted_function(script, None).unwrap();

    let result = cx.call(f, global, Args::Values(&[Value::Number(20.0)]));
    assert_eq!(result, Ok(Value::Number(41.0)));
    assert_eq!(cx.frame_depth(), 0);
    assert_eq!(cx.stack_len(), 0);
}

#[test]
fn function_call_builtin_rebinds_this() {
    let mut cx = Context::new(RuntimeConfig::default());
    let f = cx.new_native_function("argc", argc, 0).unwrap();
    let call = cx.intern("call");

    let args = [Value::Null, Value::Number(1.0), Value::Number(2.0)];
    let result = cx.object_call(f.object(), call, Args::Values(&args));
    assert_eq!(result, Ok(Value::Number(2.0)));
}

#[test]
fn failed_call_leaves_no_frames_behind() {
    fn fail(_cx: &mut Context, _this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
        Err(RuntimeError::native("nope"))
    }

    let mut cx = Context::new(RuntimeConfig::default());
    cx.set_executor(Rc::new(CallHelper));
    let global = cx.global();
    cx.add_function(global, "helper", None, Some(fail), 0);
    let f = cx
        .new_scripted_function(Rc::new(Script::new("wrapper", 8, vec![0u8])), None)
        .unwrap();

    assert_eq!(
        cx.call(f, global, Args::Values(&[Value::Null])),
        Err(RuntimeError::native("nope"))
    );
    assert_eq!(cx.frame_depth(), 0);
    assert_eq!(cx.stack_len(), 0);
    assert!(cx.is_aborted());
}

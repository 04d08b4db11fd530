use std::rc::Rc;

use crate::runtime::{
    config::RuntimeConfig,
    context::Context,
    error::RuntimeError,
    executor::ScriptExecutor,
    frame::{Args, FrameState},
    function::ConstructInfo,
    gc::ObjectHandle,
    object::{ClassId, OBJECT_SIZE},
    script::{Script, ScriptArgument, ScriptFlags},
    value::Value,
};

/// Executor that runs a fixed body instead of bytecode.
struct FixedBody(fn(&mut Context) -> Result<Value, RuntimeError>);

impl ScriptExecutor for FixedBody {
    fn execute(&self, cx: &mut Context) -> Result<Value, RuntimeError> {
        (self.0)(cx)
    }
}

fn context_with(body: fn(&mut Context) -> Result<Value, RuntimeError>) -> Context {
    let mut cx = Context::new(RuntimeConfig::default());
    cx.set_executor(Rc::new(FixedBody(body)));
    cx
}

fn script(flags: ScriptFlags, registers: u32, arguments: Vec<ScriptArgument>) -> Rc<Script> {
    Rc::new(
        Script::new("body", 8, vec![0u8])
            .with_registers(registers)
            .with_flags(flags)
            .with_arguments(arguments),
    )
}

fn count_args(_cx: &mut Context, _this: ObjectHandle, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(args.len() as f64))
}

fn first_arg(_cx: &mut Context, _this: ObjectHandle, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(args.first().copied().unwrap_or_default())
}

fn return_this(_cx: &mut Context, this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Object(this))
}

fn fail(_cx: &mut Context, _this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
    Err(RuntimeError::native("boom"))
}

fn recurse(cx: &mut Context, this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
    let function = cx
        .frame()
        .and_then(|frame| frame.function)
        .ok_or_else(|| RuntimeError::native("no frame"))?;
    cx.call(function, this, Args::none())
}

fn collect_and_check_arg(
    cx: &mut Context,
    _this: ObjectHandle,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    cx.collect();
    let alive = args.first().and_then(Value::as_object).is_some_and(|o| cx.is_live(o));
    Ok(Value::Boolean(alive))
}

fn collect_and_check_newborn(
    cx: &mut Context,
    _this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let fresh = cx.new_empty_object().ok_or_else(|| RuntimeError::native("oom"))?;
    cx.collect();
    Ok(Value::Boolean(cx.is_live(fresh)))
}

fn replace_instance(
    cx: &mut Context,
    _this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(cx.new_array().map(Value::Object).unwrap_or_default())
}

#[test]
fn native_call_receives_this_and_args() {
    let mut cx = Context::default();
    let f = cx.new_native_function("first", first_arg, 0).unwrap();
    let this = cx.global();
    assert_eq!(
        cx.call(f, this, Args::Values(&[Value::Number(7.0), Value::Null])),
        Ok(Value::Number(7.0))
    );

    let g = cx.new_native_function("self", return_this, 0).unwrap();
    assert_eq!(cx.call(g, this, Args::none()), Ok(Value::Object(this)));
    assert_eq!(cx.frame_depth(), 0);
}

#[test]
fn stack_arguments_are_clamped() {
    let mut cx = Context::default();
    let f = cx.new_native_function("count", count_args, 0).unwrap();
    let g = cx.new_native_function("first", first_arg, 0).unwrap();
    let this = cx.global();

    cx.push_value(Value::Number(1.0));
    cx.push_value(Value::Number(2.0));
    assert_eq!(cx.call(f, this, Args::Stack(5)), Ok(Value::Number(2.0)));
    assert_eq!(cx.stack_len(), 0);

    cx.push_value(Value::Number(1.0));
    cx.push_value(Value::Number(2.0));
    assert_eq!(cx.call(g, this, Args::Stack(2)), Ok(Value::Number(2.0)));
}

#[test]
fn native_skipped_without_enough_arguments() {
    let mut cx = Context::default();
    let f = cx.new_native_function("self", return_this, 2).unwrap();
    let this = cx.global();
    assert_eq!(cx.call(f, this, Args::Values(&[Value::Null])), Ok(Value::Undefined));
    assert_eq!(
        cx.call(f, this, Args::Values(&[Value::Null, Value::Null])),
        Ok(Value::Object(this))
    );
}

#[test]
fn native_skipped_for_wrong_this_kind() {
    let mut cx = Context::default();
    let f = cx.new_native_function("self", return_this, 0).unwrap();
    cx.set_this_class(f, Some(ClassId::Array));
    let plain = cx.new_object().unwrap();
    let array = cx.new_array().unwrap();

    assert_eq!(cx.call(f, plain, Args::none()), Ok(Value::Undefined));
    assert_eq!(cx.call(f, array, Args::none()), Ok(Value::Object(array)));
}

#[test]
fn native_error_aborts_context() {
    let mut cx = Context::default();
    let f = cx.new_native_function("fail", fail, 0).unwrap();
    let this = cx.global();

    assert_eq!(cx.call(f, this, Args::none()), Err(RuntimeError::native("boom")));
    assert_eq!(cx.frame_depth(), 0);
    assert_eq!(
        cx.call(f, this, Args::none()),
        Err(RuntimeError::Aborted("boom".to_string()))
    );
}

#[test]
fn runaway_recursion_hits_depth_limit() {
    let config = RuntimeConfig {
        max_call_depth: 8,
        ..RuntimeConfig::default()
    };
    let mut cx = Context::new(config);
    let f = cx.new_native_function("recurse", recurse, 0).unwrap();
    let this = cx.global();

    assert_eq!(
        cx.call(f, this, Args::none()),
        Err(RuntimeError::CallDepthExceeded { depth: 8 })
    );
    assert_eq!(cx.frame_depth(), 0);
    assert!(cx.is_aborted());
}

#[test]
fn call_value_ignores_non_functions() {
    let mut cx = Context::default();
    let this = cx.global();
    cx.push_value(Value::Null);
    assert_eq!(
        cx.call_value(&Value::Number(1.0), this, Args::Stack(1)),
        Ok(Value::Undefined)
    );
    assert_eq!(cx.stack_len(), 0);
    assert!(!cx.is_aborted());
}

#[test]
fn object_call_resolves_method() {
    let mut cx = Context::default();
    let object = cx.new_object().unwrap();
    cx.add_function(object, "self", None, Some(return_this), 0);
    let name = cx.intern("self");
    let missing = cx.intern("missing");

    assert_eq!(cx.object_call(object, name, Args::none()), Ok(Value::Object(object)));
    assert_eq!(cx.object_call(object, missing, Args::none()), Ok(Value::Undefined));
}

#[test]
fn frame_arguments_survive_collection() {
    let mut cx = Context::default();
    let f = cx.new_native_function("collect_and_check_arg", collect_and_check_arg, 0).unwrap();
    cx.add_root(f.object());
    let held = cx.new_empty_object().unwrap();
    cx.push_value(Value::Object(held));
    cx.collect();
    assert!(cx.is_live(held));

    let this = cx.global();
    assert_eq!(cx.call(f, this, Args::Stack(1)), Ok(Value::Boolean(true)));
    cx.collect();
    assert!(!cx.is_live(held));
}

#[test]
fn objects_allocated_mid_call_survive_collection() {
    let mut cx = Context::default();
    let f = cx.new_native_function("collect_and_check_newborn", collect_and_check_newborn, 0).unwrap();
    let this = cx.global();
    assert_eq!(cx.call(f, this, Args::none()), Ok(Value::Boolean(true)));
}

fn make_object(cx: &mut Context, _this: ObjectHandle, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(cx.new_empty_object().map(Value::Object).unwrap_or_default())
}

/// Collects between receiving `this.make()` and storing it.
fn collect_before_storing_result(
    cx: &mut Context,
    this: ObjectHandle,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let make = cx.intern("make");
    let made = cx.object_call(this, make, Args::none())?;
    cx.collect();
    Ok(Value::Boolean(made.as_object().is_some_and(|object| cx.is_live(object))))
}

#[test]
fn returned_object_stays_protected_in_the_caller() {
    let mut cx = Context::default();
    let object = cx.new_object().unwrap();
    cx.add_root(object);
    cx.add_function(object, "make", None, Some(make_object), 0);
    cx.add_function(object, "check", None, Some(collect_before_storing_result), 0);

    let check = cx.intern("check");
    assert_eq!(cx.object_call(object, check, Args::none()), Ok(Value::Boolean(true)));
    let report = cx.collect();
    assert_eq!(report.objects, 1);
}

#[test]
fn create_links_instance_to_constructor() {
    let mut cx = context_with(|_| Ok(Value::Undefined));
    let f = cx.new_scripted_function(script(ScriptFlags::NONE, 1, vec![]), None).unwrap();
    let prototype_key = cx.intern("prototype");
    let prototype = cx.peek_variable(f.object(), prototype_key).and_then(|v| v.as_object()).unwrap();

    let object = cx.create(f, Args::none()).unwrap().unwrap();
    assert_eq!(cx.prototype_of(object), Some(prototype));
    let key = cx.intern("__constructor__");
    assert_eq!(cx.peek_variable(object, key), Some(Value::Object(f.object())));

    let ctor_key = cx.intern("constructor");
    assert_eq!(cx.resolve_property(object, ctor_key).value, Value::Object(f.object()));
}

#[test]
fn create_uses_construct_info() {
    let mut cx = Context::default();
    let f = cx.new_native_function("List", count_args, 0).unwrap();
    cx.set_construct_info(
        f,
        ConstructInfo {
            class: ClassId::Array,
            size: OBJECT_SIZE,
        },
    );
    let object = cx.create(f, Args::none()).unwrap().unwrap();
    assert_eq!(cx.class_id(object), Some(ClassId::Array));
}

#[test]
fn object_returned_by_constructor_replaces_instance() {
    let mut cx = Context::default();
    let f = cx.new_native_function("Factory", replace_instance, 0).unwrap();
    let object = cx.create(f, Args::none()).unwrap().unwrap();
    assert_eq!(cx.class_id(object), Some(ClassId::Array));
    let key = cx.intern("__constructor__");
    assert_eq!(cx.peek_variable(object, key), None);
}

#[test]
fn scripted_call_preloads_registers() {
    let mut cx = context_with(|cx| {
        let frame = cx.frame().ok_or_else(|| RuntimeError::native("no frame"))?;
        assert_eq!(frame.state, FrameState::Active);
        assert_eq!(frame.register(4), Value::Object(cx.global()));
        assert_eq!(frame.register(5), Value::Number(10.0));
        Ok(frame.register(1))
    });
    let flags = ScriptFlags::PRELOAD_THIS
        | ScriptFlags::PRELOAD_ARGS
        | ScriptFlags::PRELOAD_GLOBAL
        | ScriptFlags::PRELOAD_ROOT;
    let arguments = vec![ScriptArgument::new("a", 5), ScriptArgument::new("b", 0)];
    let f = cx.new_scripted_function(script(flags, 6, arguments), None).unwrap();
    let this = cx.new_object().unwrap();

    let result = cx.call(f, this, Args::Values(&[Value::Number(10.0)]));
    assert_eq!(result, Ok(Value::Object(this)));
}

#[test]
fn unregistered_arguments_become_locals() {
    let mut cx = context_with(|cx| {
        let b = cx.intern("b");
        let c = cx.intern("c");
        let this = cx.intern("this");
        let self_value = cx.find_variable(this).value;
        assert!(self_value.as_object().is_some());
        assert_eq!(cx.find_variable(c).value, Value::Undefined);
        Ok(cx.find_variable(b).value)
    });
    let arguments = vec![
        ScriptArgument::new("a", 1),
        ScriptArgument::new("b", 0),
        ScriptArgument::new("c", 9),
    ];
    let f = cx.new_scripted_function(script(ScriptFlags::NONE, 2, arguments), None).unwrap();
    let this = cx.global();

    let args = [Value::Number(1.0), Value::Number(2.0)];
    assert_eq!(cx.call(f, this, Args::Values(&args)), Ok(Value::Number(2.0)));
}

#[test]
fn arguments_object_lists_call_arguments() {
    let mut cx = context_with(|cx| {
        let name = cx.intern("arguments");
        let arguments = cx.find_variable(name).value.as_object().unwrap();
        let length = cx.intern("length");
        Ok(cx.peek_variable(arguments, length).unwrap_or_default())
    });
    let f = cx.new_scripted_function(script(ScriptFlags::NONE, 1, vec![]), None).unwrap();
    let this = cx.global();
    let args = [Value::Null, Value::Null, Value::Null];
    assert_eq!(cx.call(f, this, Args::Values(&args)), Ok(Value::Number(3.0)));
}

#[test]
fn suppressed_this_is_not_a_local() {
    let mut cx = context_with(|cx| {
        let activation = cx.frame().and_then(|f| f.activation()).unwrap();
        let this = cx.intern("this");
        let arguments = cx.intern("arguments");
        assert_eq!(cx.peek_variable(activation, arguments), None);
        Ok(Value::Boolean(cx.peek_variable(activation, this).is_some()))
    });
    let flags = ScriptFlags::SUPPRESS_THIS | ScriptFlags::SUPPRESS_ARGS;
    let f = cx.new_scripted_function(script(flags, 1, vec![]), None).unwrap();
    let this = cx.global();
    assert_eq!(cx.call(f, this, Args::none()), Ok(Value::Boolean(false)));
}

#[test]
fn run_resolves_through_target_then_global() {
    let mut cx = context_with(|cx| {
        let x = cx.intern("x");
        let object = cx.intern("Object");
        let found = cx.find_variable(object);
        assert_eq!(found.owner, Some(cx.global()));
        Ok(cx.find_variable(x).value)
    });
    let target = cx.new_object().unwrap();
    let x = cx.intern("x");
    cx.set(target, x, Value::Number(5.0));

    let result = cx.run(target, script(ScriptFlags::NONE, 1, vec![]));
    assert_eq!(result, Ok(Value::Number(5.0)));
    assert_eq!(cx.frame_depth(), 0);
}

#[test]
fn constant_pool_is_interned_for_the_frame() {
    let mut cx = context_with(|cx| {
        let frame = cx.frame().ok_or_else(|| RuntimeError::native("no frame"))?;
        let constants = frame.scripted_frame().map(|s| s.constants.clone()).unwrap_or_default();
        Ok(Value::String(constants[1]))
    });
    let script = Rc::new(
        Script::new("pool", 8, vec![0u8])
            .with_constant_pool(vec!["first".to_string(), "second".to_string()]),
    );
    let this = cx.global();
    let result = cx.run(this, script).unwrap();
    let second = cx.intern("second");
    assert_eq!(result, Value::String(second));
}

#[test]
fn default_executor_returns_undefined() {
    let mut cx = Context::default();
    let this = cx.global();
    let result = cx.run(this, script(ScriptFlags::NONE, 1, vec![]));
    assert_eq!(result, Ok(Value::Undefined));
    assert_eq!(cx.frame_depth(), 0);
}

use asvm::{
    Context, ObjectHandle, RuntimeConfig, RuntimeError, Value, VariableFlags,
    runtime::context::PROTOTYPE_RECURSION_LIMIT,
};

fn test_context() -> Context {
    Context::new(RuntimeConfig::default())
}

fn link(cx: &mut Context, object: ObjectHandle, proto: ObjectHandle) {
    let name = cx.intern("__proto__");
    cx.set(object, name, Value::Object(proto));
}

fn chain(cx: &mut Context, len: usize) -> Vec<ObjectHandle> {
    let objects: Vec<_> = (0..len).map(|_| cx.new_empty_object().unwrap()).collect();
    for pair in objects.windows(2) {
        link(cx, pair[0], pair[1]);
    }
    objects
}

#[test]
fn own_write_shadows_without_touching_prototype() {
    let mut cx = test_context();
    let objects = chain(&mut cx, 2);
    let (object, proto) = (objects[0], objects[1]);
    let name = cx.intern("colour");
    let red = cx.new_string("red");
    let blue = cx.new_string("blue");

    cx.set(proto, name, red);
    cx.set(object, name, blue);

    assert_eq!(cx.resolve_property(object, name).value, blue);
    assert_eq!(cx.get(proto, name).map(|(v, _)| v), Some(red));
}

#[test]
fn resolution_walks_chain_in_order_and_reports_owner() {
    let mut cx = test_context();
    let abc = chain(&mut cx, 3);
    let name = cx.intern("only_on_c");
    cx.set(abc[2], name, Value::Number(3.0));

    let resolved = cx.resolve_property(abc[0], name);
    assert_eq!(resolved.value, Value::Number(3.0));
    assert_eq!(resolved.owner, Some(abc[2]));
    assert_eq!(cx.get(abc[0], name), None);
}

#[test]
fn prototype_cycle_aborts_instead_of_looping() {
    let mut cx = test_context();
    let pair = chain(&mut cx, 2);
    link(&mut cx, pair[1], pair[0]);
    let name = cx.intern("anything");

    let resolved = cx.resolve_property(pair[0], name);
    assert_eq!(resolved.value, Value::Undefined);
    assert_eq!(resolved.owner, None);
    assert_eq!(cx.abort_reason(), Some(&RuntimeError::PrototypeRecursion));
}

#[test]
fn bound_is_exact() {
    let mut at_limit = test_context();
    let objects = chain(&mut at_limit, PROTOTYPE_RECURSION_LIMIT);
    let name = at_limit.intern("missing");
    at_limit.resolve_property(objects[0], name);
    assert!(!at_limit.is_aborted());

    let mut past_limit = test_context();
    let objects = chain(&mut past_limit, PROTOTYPE_RECURSION_LIMIT + 1);
    let name = past_limit.intern("missing");
    past_limit.resolve_property(objects[0], name);
    assert!(past_limit.is_aborted());
}

#[test]
fn legacy_lookup_ignores_case() {
    let mut cx = Context::new(RuntimeConfig::default().with_version(6));
    let object = cx.new_empty_object().unwrap();
    let stored = cx.intern("foo");
    let wanted = cx.intern("FOO");
    cx.set(object, stored, Value::Number(1.0));

    assert_eq!(cx.resolve_property(object, wanted).value, Value::Number(1.0));
}

#[test]
fn modern_lookup_respects_case() {
    let mut cx = Context::new(RuntimeConfig::default().with_version(7));
    let object = cx.new_empty_object().unwrap();
    let stored = cx.intern("foo");
    let wanted = cx.intern("FOO");
    cx.set(object, stored, Value::Number(1.0));

    let resolved = cx.resolve_property(object, wanted);
    assert_eq!(resolved.value, Value::Undefined);
    assert_eq!(resolved.owner, None);
}

#[test]
fn legacy_write_lands_on_case_insensitive_match() {
    let mut cx = Context::new(RuntimeConfig::default().with_version(6));
    let object = cx.new_empty_object().unwrap();
    let lower = cx.intern("foo");
    let upper = cx.intern("FOO");
    cx.set(object, lower, Value::Number(1.0));
    // Lands on "foo" through the fallback.
    cx.set(object, upper, Value::Number(2.0));

    assert_eq!(cx.get(object, lower).map(|(v, _)| v), Some(Value::Number(2.0)));
    assert_eq!(cx.get(object, upper).map(|(v, _)| v), Some(Value::Number(2.0)));
    let mut names = Vec::new();
    cx.foreach(object, |name, _, _| {
        names.push(name);
        true
    });
    assert_eq!(names, vec![lower]);
}

#[test]
fn exact_match_wins_over_case_insensitive_one() {
    let mut cx = Context::new(RuntimeConfig::default().with_version(6));
    let object = cx.new_empty_object().unwrap();
    let a = cx.intern("a");
    let b = cx.intern("b");
    let lower = cx.intern("foo");
    let upper = cx.intern("FOO");
    cx.set(object, a, Value::Number(1.0));
    cx.set(object, b, Value::Number(2.0));
    // Renaming is the only way both spellings end up side by side.
    cx.foreach_rename(object, |_, name, _, _| Some(if name == a { lower } else { upper }));

    assert_eq!(cx.get(object, upper).map(|(v, _)| v), Some(Value::Number(2.0)));
    assert_eq!(cx.get(object, lower).map(|(v, _)| v), Some(Value::Number(1.0)));
}

#[test]
fn flags_round_trip_through_set_and_unset() {
    let mut cx = test_context();
    let object = cx.new_empty_object().unwrap();
    let name = cx.intern("x");
    cx.set(object, name, Value::Null);

    cx.set_variable_flags(object, name, VariableFlags::DONT_ENUM | VariableFlags::PERMANENT);
    cx.unset_variable_flags(object, name, VariableFlags::DONT_ENUM);
    assert_eq!(
        cx.get(object, name).map(|(_, f)| f),
        Some(VariableFlags::PERMANENT)
    );
}

#[test]
fn dump_lists_properties_sorted() {
    let mut cx = test_context();
    let object = cx.new_object().unwrap();
    let nested = cx.new_empty_object().unwrap();
    let b = cx.intern("b");
    let a = cx.intern("a");
    let hidden = cx.intern("hidden");
    let nested_name = cx.intern("nested");
    let text = cx.new_string("text");

    cx.set(object, b, Value::Number(2.0));
    cx.set(object, a, text);
    cx.set(object, nested_name, Value::Object(nested));
    cx.set(object, hidden, Value::Boolean(true));
    cx.set_variable_flags(object, hidden, VariableFlags::DONT_ENUM);

    insta::assert_snapshot!(cx.dump_object(object), @r#"
    Object
      a = "text"
      b = 2
      constructor = <Function Object>
      hidden = true (DONT_ENUM)
      nested = <Object>
    "#);
}

use crate::runtime::{
    class::{ObjectClass, mark_properties},
    context::Context,
    function::FunctionBody,
    gc::ObjectHandle,
    object::{AsObject, ClassId},
};

pub struct FunctionClass;

impl ObjectClass for FunctionClass {
    fn id(&self) -> ClassId {
        ClassId::Function
    }

    fn mark(&self, object: &AsObject, worklist: &mut Vec<ObjectHandle>) {
        if let Some(scope) = object.function().and_then(|f| f.scope()) {
            worklist.push(scope);
        }
        mark_properties(object, worklist);
    }

    fn debug(&self, cx: &Context, object: ObjectHandle) -> String {
        let Some(function) = cx.heap.get(object).and_then(|o| o.function()) else {
            return "Function".to_string();
        };
        match &function.body {
            FunctionBody::Native(native) => {
                format!("Function {}", cx.interner.resolve(native.name))
            }
            FunctionBody::Scripted { script, .. } => {
                format!("Function {} [{}]", script.name(), script.short_id())
            }
        }
    }
}

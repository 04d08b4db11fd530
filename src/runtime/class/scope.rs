use crate::runtime::{
    class::{ObjectClass, mark_properties},
    context::Context,
    gc::ObjectHandle,
    object::{AsObject, ClassId},
};

/// Activation objects of scripted frames. They hold the frame's named
/// locals and must never leak to scripts, so they resolve to their target.
pub struct ScopeClass;

impl ObjectClass for ScopeClass {
    fn id(&self) -> ClassId {
        ClassId::Scope
    }

    fn mark(&self, object: &AsObject, worklist: &mut Vec<ObjectHandle>) {
        if let Some(scope) = object.scope() {
            worklist.extend(scope.parent);
            worklist.extend(scope.target);
        }
        mark_properties(object, worklist);
    }

    fn resolve(&self, cx: &Context, object: ObjectHandle) -> ObjectHandle {
        cx.heap
            .get(object)
            .and_then(|o| o.scope())
            .and_then(|scope| scope.target)
            .unwrap_or(object)
    }
}

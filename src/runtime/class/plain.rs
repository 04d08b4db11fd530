use crate::runtime::{class::ObjectClass, object::ClassId};

/// Ordinary objects: every capability uses the default property-map
/// behaviour.
pub struct PlainClass;

impl ObjectClass for PlainClass {
    fn id(&self) -> ClassId {
        ClassId::Object
    }
}

use crate::runtime::object::AsObject;

pub struct HeapEntry {
    pub(crate) object: AsObject,
    pub(crate) marked: bool,
}

/// One heap slot; the generation survives while the slot is free.
pub(crate) struct HeapSlot {
    pub(crate) generation: u32,
    pub(crate) entry: Option<HeapEntry>,
}

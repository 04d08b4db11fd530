use crate::runtime::{
    class,
    gc::{
        gc_handle::ObjectHandle,
        heap_entry::{HeapEntry, HeapSlot},
    },
    object::AsObject,
};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub objects: usize,
    /// Quota to credit back: object sizes plus their property slots.
    pub bytes: usize,
}

/// Registry of every live object of a context, with stop-the-world
/// mark-and-sweep collection.
///
/// The heap does not know about quotas or roots; the context charges memory
/// before inserting, supplies the root set to [`ObjectHeap::collect`] and
/// credits back the bytes reported by the sweep.
pub struct ObjectHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
    live: usize,
    total_allocations: usize,
    total_collections: usize,
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
            total_allocations: 0,
            total_collections: 0,
        }
    }

    /// Registers `object` and returns its handle.
    ///
    /// Freed slots are reused through the free-list before the slot vector
    /// grows.
    pub fn insert(&mut self, object: AsObject) -> ObjectHandle {
        self.total_allocations += 1;
        self.live += 1;

        let entry = HeapEntry {
            object,
            marked: false,
        };

        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.entry = Some(entry);
            ObjectHandle::new(idx, slot.generation)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                entry: Some(entry),
            });
            ObjectHandle::new(idx, 0)
        }
    }

    /// Returns the object behind `handle`, or `None` for a stale handle.
    pub fn get(&self, handle: ObjectHandle) -> Option<&AsObject> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref().map(|entry| &entry.object)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut AsObject> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut().map(|entry| &mut entry.object)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn total_allocations(&self) -> usize {
        self.total_allocations
    }

    pub fn total_collections(&self) -> usize {
        self.total_collections
    }

    /// Handles of every live object, in slot order.
    pub fn handles(&self) -> Vec<ObjectHandle> {
        let mut out = Vec::with_capacity(self.live);
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.entry.is_some() {
                out.push(ObjectHandle::new(idx as u32, slot.generation));
            }
        }
        out
    }

    /// Runs a full mark-and-sweep pass from `roots`.
    pub fn collect(&mut self, roots: &[ObjectHandle]) -> SweepReport {
        self.mark(roots);
        let report = self.sweep();
        self.total_collections += 1;
        report
    }

    fn mark(&mut self, roots: &[ObjectHandle]) {
        let mut worklist: Vec<ObjectHandle> = roots.to_vec();

        while let Some(handle) = worklist.pop() {
            let Some(slot) = self.slots.get_mut(handle.index as usize) else {
                continue;
            };
            if slot.generation != handle.generation {
                continue;
            }
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            // Mark first so cycles and shared nodes are visited once.
            if entry.marked {
                continue;
            }
            entry.marked = true;

            let object = &entry.object;
            class::class_of(&object.kind).mark(object, &mut worklist);
        }
    }

    fn sweep(&mut self) -> SweepReport {
        let mut report = SweepReport::default();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            if entry.marked {
                entry.marked = false;
                continue;
            }
            report.objects += 1;
            report.bytes += entry.object.charged_bytes();
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(idx as u32);
        }
        self.live -= report.objects;
        report
    }
}

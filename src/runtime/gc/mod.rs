pub mod gc_handle;
pub mod gc_heap;
pub mod heap_entry;
pub mod quota;
pub mod telemetry;

pub use gc_handle::{FunctionHandle, ObjectHandle};
pub use gc_heap::{ObjectHeap, SweepReport};
pub use quota::MemoryQuota;
pub use telemetry::{CycleMetrics, GcStats};

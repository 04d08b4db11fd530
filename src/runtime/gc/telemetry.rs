//! Collector statistics.
//!
//! Counters are always kept; the per-cycle history is only recorded when
//! the `gc-telemetry` feature is enabled.

use std::time::Duration;

use serde::Serialize;

/// Metrics captured for a single collection cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleMetrics {
    pub cycle_index: usize,
    pub duration_micros: u128,
    pub live_before: usize,
    pub objects_freed: usize,
    pub bytes_freed: usize,
}

impl CycleMetrics {
    pub fn new(
        cycle_index: usize,
        duration: Duration,
        live_before: usize,
        objects_freed: usize,
        bytes_freed: usize,
    ) -> Self {
        Self {
            cycle_index,
            duration_micros: duration.as_micros(),
            live_before,
            objects_freed,
            bytes_freed,
        }
    }
}

/// Snapshot of a context's allocation and collection counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GcStats {
    pub collections: usize,
    pub total_allocations: usize,
    pub objects_reclaimed: usize,
    pub bytes_reclaimed: usize,
    pub live_objects: usize,
    pub memory_in_use: usize,
    pub memory_limit: usize,
    pub gc_threshold: usize,
}

impl GcStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_every_counter() {
        let stats = GcStats {
            collections: 2,
            live_objects: 5,
            ..GcStats::default()
        };
        let json: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(json["collections"], 2);
        assert_eq!(json["live_objects"], 5);
        assert_eq!(json["bytes_reclaimed"], 0);
    }
}

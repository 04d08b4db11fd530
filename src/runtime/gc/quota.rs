const MIN_GC_THRESHOLD: usize = 16 * 1024;

/// Memory accounting of a context.
///
/// `limit` is the hard quota allocations may never exceed; `threshold` is
/// the softer level above which a collection becomes due at the next safe
/// point. The threshold adapts after each collection: it doubles when little
/// was reclaimed and halves when most of the heap was garbage.
#[derive(Debug, Clone)]
pub struct MemoryQuota {
    in_use: usize,
    limit: usize,
    threshold: usize,
}

impl MemoryQuota {
    pub fn new(limit: usize, threshold: usize) -> Self {
        Self {
            in_use: 0,
            limit,
            threshold: threshold.min(limit),
        }
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.in_use)
    }

    /// Whether `size` more bytes would fit under the limit.
    pub fn fits(&self, size: usize) -> bool {
        size <= self.available()
    }

    /// Charges `size` bytes; returns `false` without side effects when the
    /// limit would be exceeded.
    pub fn charge(&mut self, size: usize) -> bool {
        if !self.fits(size) {
            return false;
        }
        self.in_use += size;
        true
    }

    /// Charges `size` bytes even past the limit. Only the built-in objects
    /// created with the context are accounted this way.
    pub(crate) fn force_charge(&mut self, size: usize) {
        self.in_use += size;
    }

    /// Moves the hard limit; memory already in use is not affected.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.threshold = self.threshold.min(limit);
    }

    pub fn credit(&mut self, size: usize) {
        debug_assert!(size <= self.in_use, "credited more memory than charged");
        self.in_use = self.in_use.saturating_sub(size);
    }

    pub fn over_threshold(&self) -> bool {
        self.in_use >= self.threshold
    }

    pub(crate) fn adapt_threshold(&mut self, freed: usize, used_before: usize) {
        if used_before == 0 {
            return;
        }

        let ratio = freed as f64 / used_before as f64;
        if ratio < 0.25 {
            self.threshold = (self.threshold.saturating_mul(2)).min(self.limit);
        } else if ratio > 0.75 {
            self.threshold = (self.threshold / 2).max(MIN_GC_THRESHOLD.min(self.limit));
        }
    }
}

//! Bounded FIFO of conditioned samples
//!
//! Capacity is fixed at construction (`lta + sta` samples) and the backing
//! storage is allocated once. After that `push` never reallocates: when full,
//! the oldest sample is dropped before the new one is appended.
//!
//! ```text
//! capacity = 6, after 8 pushes:
//!
//!   oldest                      newest
//!   ┌────┬────┬────┬────┬────┬────┐
//!   │ s2 │ s3 │ s4 │ s5 │ s6 │ s7 │      s0, s1 evicted
//!   └────┴────┴────┴────┴────┴────┘
//! ```

use alloc::collections::VecDeque;

use crate::event::AccelSample;

/// Fixed-capacity sliding window, oldest first
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<AccelSample>,
    capacity: usize,
}

impl RollingWindow {
    /// Allocate a window holding at most `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: AccelSample) -> Option<AccelSample> {
        if self.capacity == 0 {
            return Some(sample);
        }
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are buffered
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the next push will evict
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&AccelSample> {
        self.samples.back()
    }

    /// Samples in arrival order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AccelSample> + ExactSizeIterator + '_ {
        self.samples.iter()
    }

    /// Samples in `[start, end)`, arrival order; clamped to what is buffered
    pub fn range(&self, start: usize, end: usize) -> impl Iterator<Item = &AccelSample> + '_ {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        self.samples.range(start..end)
    }

    /// The most recent `count` samples (fewer if not buffered)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &AccelSample> + '_ {
        let len = self.samples.len();
        self.range(len.saturating_sub(count), len)
    }

    /// Drop every sample, keep the allocation
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

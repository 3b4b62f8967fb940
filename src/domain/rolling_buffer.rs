// Rolling sample buffer feeding the sparklines
use serde::Serialize;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of recent samples. Index 0 is the oldest sample.
///
/// Buffers start empty; a sparkline needs two samples before it draws anything.
/// No validation happens here, callers drop non-finite values before pushing.
#[derive(Debug, Clone, Serialize)]
pub struct RollingBuffer {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Samples oldest-first
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

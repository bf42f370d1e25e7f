//! Rolling history of pressure and flow samples per zone.
//!
//! Every buffer is created full (pre-seeded) and keeps exactly `capacity`
//! samples for its whole life: each push evicts the oldest sample.

use std::collections::VecDeque;

use crate::types::{Signal, ZoneId};

/// Fixed-capacity circular buffer of scalar samples, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Buffer of `capacity` copies of `seed`.
    pub fn seeded(capacity: usize, seed: f64) -> Self {
        debug_assert!(capacity > 0, "history capacity must be positive");
        Self {
            samples: std::iter::repeat(seed).take(capacity).collect(),
            capacity,
        }
    }

    /// O(1) append; evicts the oldest sample once full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Ordered copy, oldest to newest.
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Per-zone, per-signal rolling buffers.
#[derive(Debug, Clone)]
pub struct RollingHistoryStore {
    pressure: Vec<HistoryBuffer>,
    flow: Vec<HistoryBuffer>,
}

impl RollingHistoryStore {
    /// One `(pressure_seed, flow_seed)` pair per zone.
    pub fn new(capacity: usize, seeds: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (pressure, flow) = seeds
            .into_iter()
            .map(|(p, f)| (HistoryBuffer::seeded(capacity, p), HistoryBuffer::seeded(capacity, f)))
            .unzip();
        Self { pressure, flow }
    }

    pub fn zone_count(&self) -> usize {
        self.pressure.len()
    }

    pub fn buffer(&self, zone: ZoneId, signal: Signal) -> Option<&HistoryBuffer> {
        match signal {
            Signal::Pressure => self.pressure.get(zone.index()),
            Signal::Flow => self.flow.get(zone.index()),
        }
    }

    /// Append a sample. Returns `false` (and stores nothing) for an unknown zone.
    pub fn push(&mut self, zone: ZoneId, signal: Signal, value: f64) -> bool {
        let buffers = match signal {
            Signal::Pressure => &mut self.pressure,
            Signal::Flow => &mut self.flow,
        };
        match buffers.get_mut(zone.index()) {
            Some(buffer) => {
                buffer.push(value);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, zone: ZoneId, signal: Signal) -> Option<Vec<f64>> {
        self.buffer(zone, signal).map(HistoryBuffer::to_vec)
    }

    pub fn latest(&self, zone: ZoneId, signal: Signal) -> Option<f64> {
        self.buffer(zone, signal).and_then(HistoryBuffer::latest)
    }
}

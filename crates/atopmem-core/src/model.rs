//! Parsed memory/swap observation.

use chrono::NaiveDateTime;

/// One fully assembled observation from an atop log.
///
/// All sizes are in gibibytes. The timestamp is taken verbatim from the
/// log header line and carries no timezone.
///
/// Samples are only built by the assembler once a timestamp, a memory line
/// and a swap line have all been seen for the same block.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySample {
    timestamp: NaiveDateTime,
    memory_total: f64,
    memory_free: f64,
    swap_total: f64,
    swap_free: f64,
}

impl MemorySample {
    pub(crate) fn new(
        timestamp: NaiveDateTime,
        memory: (f64, f64),
        swap: (f64, f64),
    ) -> Self {
        Self {
            timestamp,
            memory_total: memory.0,
            memory_free: memory.1,
            swap_total: swap.0,
            swap_free: swap.1,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn memory_total(&self) -> f64 {
        self.memory_total
    }

    pub fn memory_free(&self) -> f64 {
        self.memory_free
    }

    pub fn swap_total(&self) -> f64 {
        self.swap_total
    }

    pub fn swap_free(&self) -> f64 {
        self.swap_free
    }

    /// Memory in use (GiB), never negative.
    pub fn memory_used(&self) -> f64 {
        (self.memory_total - self.memory_free).max(0.0)
    }

    /// Swap in use (GiB), never negative.
    pub fn swap_used(&self) -> f64 {
        (self.swap_total - self.swap_free).max(0.0)
    }
}

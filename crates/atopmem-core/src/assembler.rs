//! Pairs timestamp, memory and swap lines into [`MemorySample`]s.
//!
//! atop prints one header line per interval followed by the system-level
//! lines. A sample is emitted once a MEM line and then a SWP line have been
//! seen after a header:
//!
//! ```text
//! AwaitingTimestamp ──ts──▶ AwaitingMemory ──mem──▶ AwaitingSwap ──swp──▶ emit
//!                               ▲   ▲                  │  │                 │
//!                               │   └──────── ts ──────┘  └─mem (replace)   │
//!                               └───────────────────────────────────────────┘
//! ```
//!
//! A new header always abandons whatever was pending. Partial records are
//! dropped without error.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::model::MemorySample;
use crate::parser::{LineKind, classify_line};

/// Assembly state for one source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParseState {
    /// No header seen yet; MEM/SWP lines are ignored.
    #[default]
    AwaitingTimestamp,
    /// Header seen, waiting for a MEM line.
    AwaitingMemory { timestamp: NaiveDateTime },
    /// MEM line seen (GiB), waiting for the SWP line that completes it.
    AwaitingSwap {
        timestamp: NaiveDateTime,
        memory: (f64, f64),
    },
}

/// Counters describing one assembly run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub lines: u64,
    pub timestamps: u64,
    pub samples: u64,
    /// Memory readings discarded before a swap line paired them.
    pub abandoned: u64,
}

/// State machine that turns classified lines into samples.
#[derive(Debug, Default)]
pub struct Assembler {
    state: ParseState,
    samples: Vec<MemorySample>,
    stats: AssemblerStats,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Classifies `line` and feeds it to the state machine.
    pub fn feed_line(&mut self, line: &str) -> Option<&MemorySample> {
        self.stats.lines += 1;
        if self.feed(classify_line(line)) {
            self.samples.last()
        } else {
            None
        }
    }

    /// Applies one classified line. Returns `true` when a sample was emitted.
    pub fn feed(&mut self, kind: LineKind) -> bool {
        let (next, emitted) = match (self.state, kind) {
            (state, LineKind::Timestamp(timestamp)) => {
                if matches!(state, ParseState::AwaitingSwap { .. }) {
                    self.stats.abandoned += 1;
                }
                self.stats.timestamps += 1;
                (ParseState::AwaitingMemory { timestamp }, None)
            }

            (ParseState::AwaitingMemory { timestamp }, LineKind::Memory(reading)) => (
                ParseState::AwaitingSwap {
                    timestamp,
                    memory: reading.to_gib(),
                },
                None,
            ),

            // A second MEM line replaces the unpaired one.
            (ParseState::AwaitingSwap { timestamp, .. }, LineKind::Memory(reading)) => {
                self.stats.abandoned += 1;
                (
                    ParseState::AwaitingSwap {
                        timestamp,
                        memory: reading.to_gib(),
                    },
                    None,
                )
            }

            (ParseState::AwaitingSwap { timestamp, memory }, LineKind::Swap(reading)) => (
                // Timestamp survives so a later MEM/SWP pair in the same block still has it.
                ParseState::AwaitingMemory { timestamp },
                Some(MemorySample::new(timestamp, memory, reading.to_gib())),
            ),

            (state, _) => (state, None),
        };

        self.state = next;
        match emitted {
            Some(sample) => {
                self.stats.samples += 1;
                self.samples.push(sample);
                true
            }
            None => false,
        }
    }

    /// Samples emitted so far, in input order.
    pub fn samples(&self) -> &[MemorySample] {
        &self.samples
    }

    /// Ends the input. A pending partial record is dropped.
    pub fn finish(mut self) -> Vec<MemorySample> {
        if matches!(self.state, ParseState::AwaitingSwap { .. }) {
            self.stats.abandoned += 1;
        }
        debug!(
            lines = self.stats.lines,
            timestamps = self.stats.timestamps,
            samples = self.stats.samples,
            abandoned = self.stats.abandoned,
            "assembly finished"
        );
        self.samples
    }
}

/// Assembles all samples found in the text of one source.
pub fn assemble(text: &str) -> Vec<MemorySample> {
    let mut assembler = Assembler::new();
    for line in text.lines() {
        assembler.feed_line(line);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Magnitude, SizeUnit, UsageReading};
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn reading(total: f64, free: f64) -> UsageReading {
        UsageReading {
            total: Magnitude {
                value: total,
                unit: SizeUnit::Gibibytes,
            },
            free: Magnitude {
                value: free,
                unit: SizeUnit::Gibibytes,
            },
        }
    }

    #[test]
    fn test_full_block_emits_one_sample() {
        let text = "\
ATOP - host  2024/01/15  10:00:00  ----  10s elapsed
PRC | sys    0.10s | user   0.20s |
CPU | sys       2% | user     10% |
MEM | tot    16.0G | free  512.0M | cache   8.0G |
SWP | tot     2.0G | free    1.5G |
";
        let samples = assemble(text);
        assert_eq!(samples.len(), 1);
        let s = &samples[0];
        assert_eq!(s.timestamp(), ts(10, 0, 0));
        assert_eq!(s.memory_total(), 16.0);
        assert_eq!(s.memory_free(), 0.5);
        assert_eq!(s.swap_total(), 2.0);
        assert_eq!(s.swap_free(), 1.5);
    }

    #[test]
    fn test_multiple_blocks_in_order() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 16.0G | free 4.0G |
SWP | tot 2.0G | free 2.0G |
ATOP - host  2024/01/15  10:00:10
MEM | tot 16.0G | free 3.0G |
SWP | tot 2.0G | free 1.0G |
";
        let samples = assemble(text);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp(), ts(10, 0, 0));
        assert_eq!(samples[1].timestamp(), ts(10, 0, 10));
        assert_eq!(samples[1].memory_free(), 3.0);
    }

    #[test]
    fn test_swap_without_memory_ignored() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
SWP | tot 2.0G | free 2.0G |
";
        assert!(assemble(text).is_empty());
    }

    #[test]
    fn test_swap_after_emit_needs_new_memory() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 16.0G | free 4.0G |
SWP | tot 2.0G | free 2.0G |
SWP | tot 2.0G | free 1.0G |
";
        let samples = assemble(text);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].swap_free(), 2.0);
    }

    #[test]
    fn test_new_timestamp_abandons_pending_memory() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 16.0G | free 4.0G |
ATOP - host  2024/01/15  10:00:10
SWP | tot 2.0G | free 2.0G |
";
        assert!(assemble(text).is_empty());
    }

    #[test]
    fn test_lines_before_first_timestamp_ignored() {
        let text = "\
MEM | tot 16.0G | free 4.0G |
SWP | tot 2.0G | free 2.0G |
ATOP - host  2024/01/15  10:00:00
SWP | tot 2.0G | free 2.0G |
";
        assert!(assemble(text).is_empty());
    }

    #[test]
    fn test_second_memory_replaces_first() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 16.0G | free 4.0G |
MEM | tot 16.0G | free 6.0G |
SWP | tot 2.0G | free 2.0G |
";
        let samples = assemble(text);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].memory_free(), 6.0);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 1.2.3G | free 4.0G |
SWP | tot 2.0G | free 2.0G |
MEM | tot 16.0G | free 4.0G |
SWP | tot 2.0X | free 2.0G |
SWP | tot 2.0G | free 1.0G |
";
        let samples = assemble(text);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].memory_free(), 4.0);
        assert_eq!(samples[0].swap_free(), 1.0);
    }

    #[test]
    fn test_end_of_input_drops_partial() {
        let text = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 16.0G | free 4.0G |
SWP | tot 2.0G | free 2.0G |
ATOP - host  2024/01/15  10:00:10
MEM | tot 16.0G | free 3.0G |
";
        let samples = assemble(text);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp(), ts(10, 0, 0));
    }

    #[test]
    fn test_state_transitions() {
        let mut a = Assembler::new();
        assert_eq!(a.state(), ParseState::AwaitingTimestamp);

        assert!(!a.feed(LineKind::Memory(reading(1.0, 1.0))));
        assert_eq!(a.state(), ParseState::AwaitingTimestamp);

        assert!(!a.feed(LineKind::Timestamp(ts(1, 0, 0))));
        assert_eq!(
            a.state(),
            ParseState::AwaitingMemory {
                timestamp: ts(1, 0, 0)
            }
        );

        assert!(!a.feed(LineKind::Unrecognized));
        assert!(!a.feed(LineKind::Swap(reading(2.0, 2.0))));
        assert!(matches!(a.state(), ParseState::AwaitingMemory { .. }));

        assert!(!a.feed(LineKind::Memory(reading(4.0, 3.0))));
        assert_eq!(
            a.state(),
            ParseState::AwaitingSwap {
                timestamp: ts(1, 0, 0),
                memory: (4.0, 3.0),
            }
        );

        assert!(a.feed(LineKind::Swap(reading(2.0, 1.0))));
        assert_eq!(
            a.state(),
            ParseState::AwaitingMemory {
                timestamp: ts(1, 0, 0)
            }
        );
        assert_eq!(a.samples().len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut a = Assembler::new();
        for line in [
            "ATOP - host  2024/01/15  10:00:00",
            "MEM | tot 16.0G | free 4.0G |",
            "ATOP - host  2024/01/15  10:00:10",
            "MEM | tot 16.0G | free 4.0G |",
            "SWP | tot 2.0G | free 2.0G |",
            "garbage",
        ] {
            a.feed_line(line);
        }
        let stats = a.stats();
        assert_eq!(stats.lines, 6);
        assert_eq!(stats.timestamps, 2);
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.abandoned, 1);
    }

    #[test]
    fn test_feed_line_returns_emitted_sample() {
        let mut a = Assembler::new();
        assert!(a.feed_line("ATOP - host  2024/01/15  10:00:00").is_none());
        assert!(a.feed_line("MEM | tot 8.0G | free 2.0G |").is_none());
        let sample = a.feed_line("SWP | tot 1.0G | free 1.0G |").unwrap();
        assert_eq!(sample.memory_total(), 8.0);
    }
}

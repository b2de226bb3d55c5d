//! atopmem-core — memory/swap extraction from atop text logs.
//!
//! Provides:
//! - `parser` — line classifier and unit normalizer
//! - `assembler` — state machine that pairs timestamp/memory/swap lines
//! - `aggregator` — runs the assembler over one file or a whole directory
//! - `fs` — filesystem abstraction (real and in-memory)
//! - `model` — the `MemorySample` record
//! - `report` — CSV, PNG chart and HTML report emitters
//! - `fmt` — shared formatting helpers

pub mod aggregator;
pub mod assembler;
pub mod fmt;
pub mod fs;
pub mod model;
pub mod parser;
pub mod report;

pub use aggregator::{AggregateError, Aggregation, Aggregator, Source};
pub use model::MemorySample;
pub use report::{ReportError, ReportFiles, ReportOptions, write_reports};

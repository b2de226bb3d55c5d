//! Runs the assembler over one file or every file in a directory.
//!
//! Each file gets its own [`Assembler`](crate::assembler::Assembler); nothing
//! carries over between files. Results are concatenated and stable-sorted by
//! timestamp. Samples with equal timestamps (e.g. from overlapping files)
//! are all kept.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::assembler::assemble;
use crate::fmt::format_gib;
use crate::fs::FileSystem;
use crate::model::MemorySample;

/// Where to read atop text logs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A single log file.
    File(PathBuf),
    /// Every regular file directly inside a directory.
    Directory(PathBuf),
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    /// Parsed, with this many samples.
    Parsed(usize),
    /// Read fine but contained no complete sample.
    Empty,
    /// Could not be read.
    Failed(String),
}

/// Per-file result of an aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub path: PathBuf,
    pub status: SourceStatus,
}

/// Error type for aggregation failures.
#[derive(Debug)]
pub enum AggregateError {
    /// The single input file could not be read.
    SourceUnreadable { path: PathBuf, source: io::Error },
    /// The input directory could not be listed.
    DirectoryUnreadable { path: PathBuf, source: io::Error },
    /// No source produced a single sample.
    NoData,
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateError::SourceUnreadable { path, source } => {
                write!(f, "cannot read log file {}: {}", path.display(), source)
            }
            AggregateError::DirectoryUnreadable { path, source } => {
                write!(f, "cannot read directory {}: {}", path.display(), source)
            }
            AggregateError::NoData => write!(f, "no valid memory data found"),
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregateError::SourceUnreadable { source, .. }
            | AggregateError::DirectoryUnreadable { source, .. } => Some(source),
            AggregateError::NoData => None,
        }
    }
}

/// Samples from all sources, sorted by timestamp, plus per-file outcomes.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    samples: Vec<MemorySample>,
    outcomes: Vec<SourceOutcome>,
}

impl Aggregation {
    pub fn samples(&self) -> &[MemorySample] {
        &self.samples
    }

    pub fn outcomes(&self) -> &[SourceOutcome] {
        &self.outcomes
    }

    /// Number of files that contributed at least one sample.
    pub fn parsed_sources(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Parsed(_)))
    }

    pub fn empty_sources(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Empty))
    }

    pub fn failed_sources(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Failed(_)))
    }

    /// Highest used memory and highest used swap over all samples, in GiB.
    pub fn peak_usage(&self) -> (f64, f64) {
        self.samples.iter().fold((0.0_f64, 0.0_f64), |(mem, swap), s| {
            (mem.max(s.memory_used()), swap.max(s.swap_used()))
        })
    }

    pub fn into_samples(self) -> Vec<MemorySample> {
        self.samples
    }

    fn count(&self, pred: impl Fn(&SourceStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Reads sources through a [`FileSystem`] and merges their samples.
pub struct Aggregator<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> Aggregator<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Processes `source` and returns the merged, sorted samples.
    ///
    /// Unreadable files inside a directory are logged and skipped. A
    /// single-file source that cannot be read is an error, as is ending up
    /// with no samples at all.
    pub fn run(&self, source: &Source) -> Result<Aggregation, AggregateError> {
        let mut aggregation = Aggregation::default();

        match source {
            Source::File(path) => {
                info!(path = %path.display(), "parsing log file");
                let bytes = self.fs.read(path).map_err(|e| {
                    AggregateError::SourceUnreadable {
                        path: path.clone(),
                        source: e,
                    }
                })?;
                self.absorb(&mut aggregation, path, &bytes);
            }
            Source::Directory(dir) => {
                info!(path = %dir.display(), "parsing all log files in directory");
                for path in self.list_files(dir)? {
                    match self.fs.read(&path) {
                        Ok(bytes) => self.absorb(&mut aggregation, &path, &bytes),
                        Err(e) => {
                            warn!(file = %file_name(&path), error = %e, "failed to parse file");
                            aggregation.outcomes.push(SourceOutcome {
                                path,
                                status: SourceStatus::Failed(e.to_string()),
                            });
                        }
                    }
                }
            }
        }

        if aggregation.samples.is_empty() {
            return Err(AggregateError::NoData);
        }

        // sort_by is stable: equal timestamps keep file/line order
        aggregation
            .samples
            .sort_by(|a, b| a.timestamp().cmp(&b.timestamp()));

        let (peak_mem_used, peak_swap_used) = aggregation.peak_usage();
        info!(
            records = aggregation.samples.len(),
            files = aggregation.parsed_sources(),
            peak_mem_used_gib = %format_gib(peak_mem_used),
            peak_swap_used_gib = %format_gib(peak_swap_used),
            "parsed all sources"
        );
        Ok(aggregation)
    }

    /// Regular files directly under `dir`, in path order.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, AggregateError> {
        if !self.fs.is_dir(dir) {
            return Err(AggregateError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut entries =
            self.fs
                .read_dir(dir)
                .map_err(|e| AggregateError::DirectoryUnreadable {
                    path: dir.to_path_buf(),
                    source: e,
                })?;

        if entries.is_empty() {
            warn!(path = %dir.display(), "no files found in directory");
        }

        entries.retain(|p| !self.fs.is_dir(p));
        entries.sort();
        Ok(entries)
    }

    /// Assembles one file's contents. Invalid UTF-8 sequences are replaced,
    /// so the affected line is merely unrecognized.
    fn absorb(&self, aggregation: &mut Aggregation, path: &Path, bytes: &[u8]) {
        let samples = assemble(&String::from_utf8_lossy(bytes));
        let status = if samples.is_empty() {
            warn!(file = %file_name(path), "no valid data found in file");
            SourceStatus::Empty
        } else {
            info!(
                file = %file_name(path),
                records = samples.len(),
                "parsed file"
            );
            SourceStatus::Parsed(samples.len())
        };

        aggregation.samples.extend(samples);
        aggregation.outcomes.push(SourceOutcome {
            path: path.to_path_buf(),
            status,
        });
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

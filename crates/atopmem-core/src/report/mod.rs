//! Report emitters: CSV table, PNG chart and interactive HTML page.
//!
//! All emitters read the final sorted sample slice and never modify it.
//! They run in order CSV → PNG → HTML; the first failure stops the rest.

pub mod chart;
pub mod csv;
pub mod html;

use std::io;
use std::path::PathBuf;

use tracing::info;

use crate::model::MemorySample;

/// Default output file prefix.
pub const DEFAULT_PREFIX: &str = "memory_report";

/// Legend labels shared by the chart and the HTML report, in series order.
pub(crate) const SERIES_LABELS: [&str; 4] = [
    "MEM Total (GB)",
    "MEM Free (GB)",
    "SWAP Total (GB)",
    "SWAP Free (GB)",
];

pub(crate) const REPORT_TITLE: &str = "Memory/Swap Usage Over Time";

/// Which reports to write and where.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Output prefix; files are `<prefix>.csv`, `<prefix>_memory_swap.png`, ...
    pub prefix: String,
    /// Also write the interactive HTML report.
    pub html: bool,
    /// TrueType/OpenType font for chart text. Falls back to system fonts.
    ///
    /// Fonts are registered process-wide; a later report with a different
    /// font replaces the one used before.
    pub chart_font: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            html: false,
            chart_font: None,
        }
    }
}

impl ReportOptions {
    pub fn csv_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.csv", self.prefix))
    }

    pub fn chart_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_memory_swap.png", self.prefix))
    }

    pub fn html_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_memory_swap.html", self.prefix))
    }
}

/// Paths of the files that were written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFiles {
    pub csv: PathBuf,
    pub chart: PathBuf,
    pub html: Option<PathBuf>,
}

/// Error type for report generation failures.
#[derive(Debug)]
pub enum ReportError {
    /// There were no samples to report.
    Empty,
    /// Creating or writing an output file failed.
    Io { path: PathBuf, source: io::Error },
    /// The chart backend failed to draw or encode the image.
    Chart { path: PathBuf, message: String },
    /// Serializing the HTML data series failed.
    Serialize(serde_json::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Empty => write!(f, "no samples to report"),
            ReportError::Io { path, source } => {
                write!(f, "cannot write {}: {}", path.display(), source)
            }
            ReportError::Chart { path, message } => {
                write!(f, "cannot render chart {}: {}", path.display(), message)
            }
            ReportError::Serialize(e) => write!(f, "cannot serialize report data: {}", e),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io { source, .. } => Some(source),
            ReportError::Serialize(e) => Some(e),
            ReportError::Empty | ReportError::Chart { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Serialize(e)
    }
}

/// Writes every requested report for `samples`.
pub fn write_reports(
    samples: &[MemorySample],
    options: &ReportOptions,
) -> Result<ReportFiles, ReportError> {
    if samples.is_empty() {
        return Err(ReportError::Empty);
    }

    let csv_path = options.csv_path();
    csv::write_csv_file(samples, &csv_path)?;
    info!(path = %csv_path.display(), "saved CSV file");

    let chart_path = options.chart_path();
    chart::render_chart(samples, &chart_path, options.chart_font.as_deref())?;
    info!(path = %chart_path.display(), "saved memory usage chart");

    let html = if options.html {
        let html_path = options.html_path();
        html::write_html_file(samples, &html_path)?;
        info!(path = %html_path.display(), "saved interactive HTML report");
        Some(html_path)
    } else {
        None
    };

    Ok(ReportFiles {
        csv: csv_path,
        chart: chart_path,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    fn options(dir: &std::path::Path, html: bool) -> ReportOptions {
        ReportOptions {
            prefix: dir.join("report").to_string_lossy().into_owned(),
            html,
            chart_font: None,
        }
    }

    fn samples() -> Vec<MemorySample> {
        assemble(
            "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 2.00G | free 1.00G |
SWP | tot 1.00G | free 1.00G |
ATOP - host  2024/01/15  11:00:00
MEM | tot 2.00G | free 768.0M |
SWP | tot 1.00G | free 512.0M |
",
        )
    }

    #[test]
    fn test_paths_from_prefix() {
        let opts = ReportOptions::default();
        assert_eq!(opts.csv_path(), PathBuf::from("memory_report.csv"));
        assert_eq!(
            opts.chart_path(),
            PathBuf::from("memory_report_memory_swap.png")
        );
        assert_eq!(
            opts.html_path(),
            PathBuf::from("memory_report_memory_swap.html")
        );
    }

    #[test]
    fn test_write_reports_without_html() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), false);
        let files = write_reports(&samples(), &opts).unwrap();

        assert!(files.csv.exists());
        assert!(files.chart.exists());
        assert!(files.html.is_none());
        assert!(!opts.html_path().exists());
    }

    #[test]
    fn test_write_reports_with_html() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_reports(&samples(), &options(dir.path(), true)).unwrap();
        assert!(files.html.unwrap().exists());
    }

    #[test]
    fn test_write_reports_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_reports(&[], &options(dir.path(), false)).unwrap_err();
        assert!(matches!(err, ReportError::Empty));
    }

    #[test]
    fn test_write_failure_stops_later_emitters() {
        let dir = tempfile::tempdir().unwrap();
        let opts = ReportOptions {
            prefix: dir
                .path()
                .join("missing")
                .join("report")
                .to_string_lossy()
                .into_owned(),
            html: true,
            chart_font: None,
        };
        let err = write_reports(&samples(), &opts).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert!(!opts.chart_path().exists());
        assert!(!opts.html_path().exists());
    }
}

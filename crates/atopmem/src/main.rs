//! atopmem - memory/swap report generator for atop text logs.
//!
//! Reads one atop text log (the output of `atop -r <rawfile>`) or every file
//! in a directory, and writes a CSV table and a PNG chart, plus an
//! interactive HTML page on request.
//!
//! Usage:
//!   atopmem -f atop_20240115.txt            # single file
//!   atopmem -d /var/log/atop-text -o week1  # all files in a directory
//!   atopmem -f atop.txt --html              # also write the HTML report

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use atopmem_core::fs::RealFs;
use atopmem_core::report::DEFAULT_PREFIX;
use atopmem_core::{
    AggregateError, Aggregator, ReportError, ReportFiles, ReportOptions, Source, write_reports,
};

/// Memory/swap report generator for atop text logs.
#[derive(Parser, Debug)]
#[command(name = "atopmem", about = "Generate memory/swap reports from atop logs", version)]
#[command(group(ArgGroup::new("input").required(true).multiple(false).args(["log_file", "dir"])))]
struct Args {
    /// Path to a single atop text log file.
    #[arg(short = 'f', long = "log_file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Directory containing atop text log files (subdirectories are skipped).
    #[arg(short = 'd', long = "dir", value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Output file prefix.
    #[arg(short, long, value_name = "PREFIX", default_value = DEFAULT_PREFIX)]
    output: String,

    /// Also generate an interactive HTML report.
    #[arg(long)]
    html: bool,

    /// TrueType/OpenType font used for chart text.
    /// Defaults to the first common system font found.
    #[arg(long, value_name = "PATH")]
    chart_font: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn source(&self) -> Result<Source, RunError> {
        match (&self.log_file, &self.dir) {
            (Some(path), None) => Ok(Source::File(path.clone())),
            (None, Some(dir)) => Ok(Source::Directory(dir.clone())),
            (Some(_), Some(_)) => Err(RunError::Usage(
                "--log_file and --dir are mutually exclusive",
            )),
            (None, None) => Err(RunError::Usage("one of --log_file or --dir is required")),
        }
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            prefix: self.output.clone(),
            html: self.html,
            chart_font: self.chart_font.clone(),
        }
    }
}

/// Top-level failure of a run.
#[derive(Debug)]
enum RunError {
    /// Input selection the argument parser should already have rejected.
    Usage(&'static str),
    Aggregate(AggregateError),
    Report(ReportError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Usage(msg) => write!(f, "{}", msg),
            RunError::Aggregate(e) => write!(f, "{}", e),
            RunError::Report(e) => write!(f, "report generation failed: {}", e),
        }
    }
}

impl std::error::Error for RunError {}

impl From<AggregateError> for RunError {
    fn from(e: AggregateError) -> Self {
        RunError::Aggregate(e)
    }
}

impl From<ReportError> for RunError {
    fn from(e: ReportError) -> Self {
        RunError::Report(e)
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["atopmem", "atopmem_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<ReportFiles, RunError> {
    let aggregation = Aggregator::new(RealFs::new()).run(&args.source()?)?;
    if aggregation.failed_sources() > 0 || aggregation.empty_sources() > 0 {
        info!(
            unreadable = aggregation.failed_sources(),
            empty = aggregation.empty_sources(),
            "skipped files"
        );
    }

    let samples = aggregation.into_samples();
    let files = write_reports(&samples, &args.report_options())?;
    Ok(files)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(_) => info!("Report generation complete"),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

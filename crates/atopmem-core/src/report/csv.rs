//! CSV table of samples.
//!
//! ```text
//! timestamp,mem_tot,mem_free,swp_tot,swp_free
//! 2024-01-15 10:00:00,15.50,1.20,2.00,1.90
//! ```
//!
//! No field ever needs quoting: timestamps and fixed-point numbers contain
//! neither commas nor quotes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::ReportError;
use crate::fmt::{format_gib, format_timestamp};
use crate::model::MemorySample;

pub const CSV_HEADER: &str = "timestamp,mem_tot,mem_free,swp_tot,swp_free";

/// Writes header and one row per sample to `out`.
pub fn write_csv<W: Write>(samples: &[MemorySample], out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for s in samples {
        writeln!(
            out,
            "{},{},{},{},{}",
            format_timestamp(s.timestamp()),
            format_gib(s.memory_total()),
            format_gib(s.memory_free()),
            format_gib(s.swap_total()),
            format_gib(s.swap_free()),
        )?;
    }
    Ok(())
}

/// Creates `path` and writes the CSV table into it.
pub fn write_csv_file(samples: &[MemorySample], path: &Path) -> Result<(), ReportError> {
    let io_err = |e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    write_csv(samples, &mut out).map_err(io_err)?;
    out.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    fn render(samples: &[MemorySample]) -> String {
        let mut buf = Vec::new();
        write_csv(samples, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_single_block_single_row() {
        let samples = assemble(
            "\
ATOP - host  2024/01/15  10:00:00  ----  10s elapsed
MEM | tot 2.00G | free 1.00G | cache 0.50G |
SWP | tot 1.00G | free 1.00G |
",
        );
        assert_eq!(
            render(&samples),
            "timestamp,mem_tot,mem_free,swp_tot,swp_free\n\
             2024-01-15 10:00:00,2.00,1.00,1.00,1.00\n"
        );
    }

    #[test]
    fn test_values_normalized_and_rounded() {
        let samples = assemble(
            "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 15.456G | free 768.0M |
SWP | tot 0.0M | free 0.0M |
",
        );
        let out = render(&samples);
        assert_eq!(out.lines().nth(1), Some("2024-01-15 10:00:00,15.46,0.75,0.00,0.00"));
    }

    #[test]
    fn test_header_only_for_no_samples() {
        assert_eq!(render(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let samples = assemble(
            "ATOP - h 2024/01/15 10:00:00\nMEM | tot 1.0G | free 1.0G |\nSWP | tot 1.0G | free 1.0G |\n",
        );
        write_csv_file(&samples, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_write_csv_file_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("out.csv");
        let err = write_csv_file(&[], &path).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}

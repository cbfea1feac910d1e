//! Output writing
//!
//! Formatted records go either to the console or to a file opened in append
//! mode. An optional header line is written once, right before the first
//! record.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered sink for formatted records
pub struct RecordWriter {
    sink: BufWriter<Box<dyn Write>>,
    header: Option<String>,
    records_written: usize,
}

impl RecordWriter {
    /// Write records to standard output
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Append records to a file, creating it if needed
    pub fn append_to(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open output file: {:?}", path))?;
        log::info!("Writing records to {:?}", path);
        Ok(Self::new(Box::new(file)))
    }

    fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink: BufWriter::new(sink),
            header: None,
            records_written: 0,
        }
    }

    /// Header written once before the first record
    pub fn with_header(mut self, header: Option<String>) -> Self {
        self.header = header;
        self
    }

    /// Write one formatted record (already carrying its terminator)
    pub fn write_record(&mut self, line: &str) -> Result<()> {
        if let Some(header) = self.header.take() {
            writeln!(self.sink, "{}", header).context("Failed to write header")?;
        }
        self.sink
            .write_all(line.as_bytes())
            .context("Failed to write record")?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush buffered output and return the number of records written
    pub fn finish(mut self) -> Result<usize> {
        self.sink.flush().context("Failed to flush output")?;
        Ok(self.records_written)
    }
}

/// Pick an output path that does not exist yet
///
/// `out.txt` becomes `out_1.txt`, `out_2.txt`, ... until a free name is found.
pub fn unused_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|counter| path.with_file_name(format!("{}_{}{}", stem, counter, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

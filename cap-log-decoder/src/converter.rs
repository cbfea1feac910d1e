//! Main converter API
//!
//! This module provides the primary interface for the decoder library.
//! A [`Converter`] ties the record reader, the parser and the formatter
//! together and turns capture text into formatted lines, one record at a time.

use crate::config::FormatterConfig;
use crate::formatter::TemplateFormatter;
use crate::parser::RecordParser;
use crate::reader::RecordReader;
use crate::types::{RawRecord, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The main converter struct - entry point for all conversion operations
#[derive(Debug, Clone)]
pub struct Converter {
    formatter: TemplateFormatter,
}

impl Converter {
    /// Create a converter for the given formatter configuration
    ///
    /// # Example
    /// ```
    /// use cap_log_decoder::{Converter, FormatterConfig, RawRecord};
    ///
    /// let converter = Converter::new(FormatterConfig::new().with_template("{src} {dest}")).unwrap();
    /// let record = RawRecord::new("12:00:00.1 10.0.0.1 -> 10.0.0.2", "UDP ttl:64 DF", "Len: 10");
    /// assert_eq!(converter.convert_record(&record).unwrap(), "10.0.0.1 10.0.0.2\n");
    /// ```
    pub fn new(config: FormatterConfig) -> Result<Self> {
        Ok(Self {
            formatter: TemplateFormatter::new(config)?,
        })
    }

    /// The formatter used for every record
    pub fn formatter(&self) -> &TemplateFormatter {
        &self.formatter
    }

    /// Header line for the configured template (without terminator)
    pub fn header(&self) -> String {
        self.formatter.header()
    }

    /// Parse and format a single record
    pub fn convert_record(&self, record: &RawRecord) -> Result<String> {
        let fields = RecordParser::parse(record)?;
        Ok(self.formatter.format(&fields))
    }

    /// Convert a capture text file and return an iterator of formatted lines
    ///
    /// The file is read lazily; each item is one formatted line or the error
    /// that stopped the conversion.
    ///
    /// # Example
    /// ```no_run
    /// use cap_log_decoder::{Converter, FormatterConfig};
    /// use std::path::Path;
    ///
    /// let converter = Converter::new(FormatterConfig::new()).unwrap();
    /// for line in converter.convert_file(Path::new("capture.txt")).unwrap() {
    ///     print!("{}", line.unwrap());
    /// }
    /// ```
    pub fn convert_file(&self, path: &Path) -> Result<ConvertingIterator<'_, BufReader<File>>> {
        log::info!("Converting capture file: {:?}", path);
        Ok(ConvertingIterator::new(RecordReader::open(path)?, self))
    }

    /// Convert records from any buffered reader
    pub fn convert_reader<R: BufRead>(&self, reader: R) -> ConvertingIterator<'_, R> {
        ConvertingIterator::new(RecordReader::new(reader), self)
    }
}

/// Iterator that converts raw records into formatted lines
///
/// Stops after the first error: a record with an unexpected shape ends the
/// conversion rather than being skipped.
pub struct ConvertingIterator<'a, R> {
    records: RecordReader<R>,
    converter: &'a Converter,
    record_number: usize,
    line_number: usize,
    failed: bool,
}

impl<'a, R: BufRead> ConvertingIterator<'a, R> {
    fn new(records: RecordReader<R>, converter: &'a Converter) -> Self {
        Self {
            records,
            converter,
            record_number: 0,
            line_number: 0,
            failed: false,
        }
    }

    /// 1-based number of the last record read
    pub fn record_number(&self) -> usize {
        self.record_number
    }

    /// Input line number where the last record read starts
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<'a, R: BufRead> Iterator for ConvertingIterator<'a, R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self.records.next()?.and_then(|record| {
            self.record_number += 1;
            self.line_number = record.line_number;
            log::debug!(
                "Converting record {} (line {})",
                self.record_number,
                record.line_number
            );
            self.converter.convert_record(&record)
        });

        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

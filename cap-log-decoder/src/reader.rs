//! Capture text reader
//!
//! Splits a textual capture dump into blank-line separated blocks and turns
//! each block into a three-line record.
//!
//! ## Input layout
//! - Line 1: summary (`<date> <src> -> <dest>`)
//! - Line 2: network header (`TCP TTL:64 TOS:0x0 ID:1 IpLen:20 DgmLen:40 DF`)
//! - Line 3: transport header (`***AP*** Seq: 0x1  Ack: 0x2  Win: 0x3  TcpLen: 20`)
//!
//! Lines after the third one in a block (snort `TCP Options` lines and the
//! like) are ignored. A block with fewer than three lines is treated as end
//! of input, not as an error.

use crate::types::{DecoderError, RawRecord, Result, RECORD_LINES};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Iterator over raw records from a line-oriented source
pub struct RecordReader<R> {
    lines: Lines<R>,
    line_number: usize,
    finished: bool,
}

impl RecordReader<BufReader<File>> {
    /// Open a capture text file and return an iterator over its records
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Opening capture file: {:?}", path);

        if !path.exists() {
            return Err(DecoderError::InputNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap any buffered reader (stdin, in-memory buffers, ...)
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            finished: false,
        }
    }

    /// Next block of trimmed, non-blank lines and the line number it starts at
    ///
    /// Blank lines before the block are skipped; the block ends at the next
    /// blank line or at end of input.
    fn next_block(&mut self) -> Option<Result<(usize, Vec<String>)>> {
        let mut block = Vec::with_capacity(RECORD_LINES);
        let mut first_line = 0;

        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                if block.is_empty() {
                    continue;
                }
                break;
            }

            if block.is_empty() {
                first_line = self.line_number;
            }
            block.push(trimmed.to_string());
        }

        if block.is_empty() {
            None
        } else {
            Some(Ok((first_line, block)))
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let (first_line, mut block) = match self.next_block()? {
            Ok(block) => block,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        if block.len() > RECORD_LINES {
            log::debug!(
                "Ignoring {} extra line(s) in record at line {}",
                block.len() - RECORD_LINES,
                first_line
            );
            block.truncate(RECORD_LINES);
        }

        let [summary, network, transport]: [String; RECORD_LINES] = match block.try_into() {
            Ok(lines) => lines,
            Err(short) => {
                self.finished = true;
                log::warn!(
                    "Incomplete record at line {} ({} of {} lines), stopping",
                    first_line,
                    short.len(),
                    RECORD_LINES
                );
                return None;
            }
        };

        log::trace!("Read record at line {}", first_line);
        Some(Ok(RawRecord::new(summary, network, transport).at_line(first_line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_RECORDS: &str = "\
12:00:00.1 10.0.0.1 -> 10.0.0.2
TCP ttl:64 tos:0x0 id:1 iplen:40 dgmlen:40 DF
Seq: 0  Ack: 0  Win: 100  Len: 0

12:00:00.2 10.0.0.2:53 -> 10.0.0.1:4000
UDP ttl:64 tos:0x0 id:2 iplen:20 dgmlen:38 DF
Len: 10
";

    #[test]
    fn test_reader_splits_blocks() {
        let records: Vec<RawRecord> = RecordReader::new(Cursor::new(TWO_RECORDS))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].summary, "12:00:00.1 10.0.0.1 -> 10.0.0.2");
        assert_eq!(records[0].line_number, 1);
        assert_eq!(records[1].transport, "Len: 10");
        assert_eq!(records[1].line_number, 5);
    }

    #[test]
    fn test_trailing_partial_record_is_dropped() {
        let input = format!("{}\n12:00:00.3 10.0.0.3 -> 10.0.0.4\nTCP ttl:1 DF\n", TWO_RECORDS);
        let records: Vec<RawRecord> = RecordReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_extra_lines_in_block_are_ignored() {
        let input = "\
t1 a -> b
TCP ttl:1 DF
***AP*** Seq: 1  Len: 0
TCP Options (3) => NOP NOP TS: 1 2

t2 c -> d
TCP ttl:2 DF
Len: 0
";
        let records: Vec<RawRecord> = RecordReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].transport, "***AP*** Seq: 1  Len: 0");
        assert_eq!(records[1].summary, "t2 c -> d");
        assert_eq!(records[1].line_number, 6);
    }

    #[test]
    fn test_short_block_ends_input() {
        let input = "\
t1 a -> b
TCP ttl:1 DF
Len: 0

t2 c -> d
TCP ttl:2 DF

t3 e -> f
TCP ttl:3 DF
Len: 0
";
        let mut reader = RecordReader::new(Cursor::new(input));

        assert_eq!(reader.next().unwrap().unwrap().summary, "t1 a -> b");
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_lines_are_trimmed() {
        let input = "  a b -> c  \r\n\tTCP DF\nLen: 1   \n";
        let record = RecordReader::new(Cursor::new(input)).next().unwrap().unwrap();

        assert_eq!(record.summary, "a b -> c");
        assert_eq!(record.network, "TCP DF");
        assert_eq!(record.transport, "Len: 1");
    }

    #[test]
    fn test_empty_input() {
        assert!(RecordReader::new(Cursor::new("")).next().is_none());
        assert!(RecordReader::new(Cursor::new("\n\n  \n")).next().is_none());
    }

    #[test]
    fn test_file_not_found() {
        let result = RecordReader::open(Path::new("nonexistent.txt"));
        assert!(matches!(result, Err(DecoderError::InputNotFound(_))));
    }
}

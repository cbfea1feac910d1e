//! Core types for the capture log decoder library
//!
//! This module defines the raw record handed over by the reader, the field map
//! produced by the parser, and the error type shared by every stage. Nothing
//! here keeps state between records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Number of text lines that make up one capture record
pub const RECORD_LINES: usize = 3;

/// One raw capture record as read from the input stream
///
/// A record is always three non-empty lines: the summary line
/// (`date src -> dest`), the network (IP) header line and the transport
/// header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Summary line: timestamp and addresses
    pub summary: String,
    /// Network layer line: protocol, IP header fields and IP flags
    pub network: String,
    /// Transport layer line: optional TCP flags and `Key: value` segments
    pub transport: String,
    /// 1-based input line number of the summary line (0 if unknown)
    pub line_number: usize,
}

impl RawRecord {
    /// Build a record from its three lines
    pub fn new(
        summary: impl Into<String>,
        network: impl Into<String>,
        transport: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            network: network.into(),
            transport: transport.into(),
            line_number: 0,
        }
    }

    /// Attach the input line number of the first line
    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }
}

/// Which line of a record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Summary,
    Network,
    Transport,
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::Summary => write!(f, "summary"),
            LineKind::Network => write!(f, "network"),
            LineKind::Transport => write!(f, "transport"),
        }
    }
}

/// A single field value extracted from a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain scalar value, stored verbatim
    Text(String),
    /// Multi-valued field such as `ip_flags`
    List(Vec<String>),
}

impl FieldValue {
    /// Borrow the scalar value, if this is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// Borrow the list items, if this is a list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::List(items) => Some(items),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Fields of one record, keyed by lower-case field name
///
/// The key set is not fixed: TCP and UDP records, or records with and
/// without TCP flags, produce different keys.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Errors that can occur while reading, parsing or formatting records
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed {line} line: {reason}")]
    MalformedRecord { line: LineKind, reason: String },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Input file not found: {0:?}")]
    InputNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecoderError {
    /// Shorthand for a malformed record error
    pub(crate) fn malformed(line: LineKind, reason: impl Into<String>) -> Self {
        DecoderError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

//! Capture Log Decoder Library
//!
//! A stateless, reusable library for turning multi-line textual packet dumps
//! (tcpdump/snort style) into single-line records shaped by a user template.
//!
//! # Architecture
//!
//! Each record flows through the same stages, one record at a time:
//! - [`RecordReader`] turns each blank-line separated block into a [`RawRecord`]
//! - [`RecordParser`] splits a record into a [`FieldMap`], layer by layer
//! - [`TemplateFormatter`] renders the field map through a compiled [`Template`]
//!
//! [`Converter`] wires the stages together. Output files, headers and the
//! command line live in the application layer (cap-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use cap_log_decoder::{Converter, FormatterConfig};
//! use std::path::Path;
//!
//! let config = FormatterConfig::new()
//!     .with_template("{date} {src} {dest} {id:D}")
//!     .with_default_value("-");
//! let converter = Converter::new(config).unwrap();
//!
//! println!("{}", converter.header());
//! for line in converter.convert_file(Path::new("capture.txt")).unwrap() {
//!     match line {
//!         Ok(line) => print!("{}", line),
//!         Err(e) => {
//!             eprintln!("Conversion error: {}", e);
//!             break;
//!         }
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod converter;
pub mod formatter;
pub mod parser;
pub mod reader;
pub mod template;
pub mod types;

// Re-export main types for convenience
pub use config::{FormatterConfig, DEFAULT_TEMPLATE};
pub use converter::{Converter, ConvertingIterator};
pub use formatter::{lookup, normalize_decimal, TemplateFormatter};
pub use parser::RecordParser;
pub use reader::RecordReader;
pub use template::{Placeholder, Segment, Template};
pub use types::{DecoderError, FieldMap, FieldValue, LineKind, RawRecord, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

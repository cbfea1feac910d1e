//! Record Parsing Engine
//!
//! Splits one raw three-line record into named fields, one layer at a time:
//! the summary line gives `date`, `src` and `dest`, the network line gives
//! `protocol`, the IP header fields and `ip_flags`, and the transport line
//! gives `tcp_flags` (TCP only) and the transport header fields.
//!
//! The parser keeps no schema: any `key:value` pair found on the network or
//! transport line ends up in the field map under its lower-cased key.

use crate::types::{DecoderError, FieldMap, FieldValue, LineKind, RawRecord, Result};

/// Maximum number of whitespace-delimited tokens on the network line
const NETWORK_TOKENS: usize = 7;

/// Separator between the source and destination address
const ADDRESS_SEPARATOR: &str = " -> ";

/// Separator between transport segments
const SEGMENT_SEPARATOR: &str = "  ";

/// Separator between key and value inside a transport segment
const TRANSPORT_PAIR_SEPARATOR: &str = ": ";

/// Record parser - turns raw records into field maps
pub struct RecordParser;

impl RecordParser {
    /// Parse a raw record into a field map
    ///
    /// # Returns
    /// * `Ok(FieldMap)` with at least `date`, `src`, `dest`, `protocol` and `ip_flags`
    /// * `Err(DecoderError::MalformedRecord)` if any line violates its layout;
    ///   no partial map is returned
    pub fn parse(record: &RawRecord) -> Result<FieldMap> {
        let mut fields = FieldMap::new();

        Self::parse_summary(&record.summary, &mut fields)?;
        Self::parse_network(&record.network, &mut fields)?;
        Self::parse_transport(&record.transport, &mut fields)?;

        log::trace!("Parsed record at line {}: {:?}", record.line_number, fields);
        Ok(fields)
    }

    /// `<date> <src> -> <dest>`
    fn parse_summary(line: &str, fields: &mut FieldMap) -> Result<()> {
        let (date, addresses) = line
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| {
                DecoderError::malformed(LineKind::Summary, format!("no addresses in {:?}", line))
            })?;

        let (src, dest) = addresses
            .trim_start()
            .split_once(ADDRESS_SEPARATOR)
            .ok_or_else(|| {
                DecoderError::malformed(
                    LineKind::Summary,
                    format!("missing {:?} in {:?}", ADDRESS_SEPARATOR, line),
                )
            })?;

        fields.insert("date".to_string(), FieldValue::from(date));
        fields.insert("src".to_string(), FieldValue::from(src));
        fields.insert("dest".to_string(), FieldValue::from(dest));
        Ok(())
    }

    /// `<protocol> key:value ... <flags...>`
    ///
    /// The last of at most seven tokens holds the rest of the line and is
    /// split again into the `ip_flags` list.
    fn parse_network(line: &str, fields: &mut FieldMap) -> Result<()> {
        let tokens = split_whitespace_n(line, NETWORK_TOKENS);

        let (protocol, rest) = tokens.split_first().ok_or_else(|| {
            DecoderError::malformed(LineKind::Network, "empty line")
        })?;

        let (flags, pairs): (Vec<String>, &[&str]) = match rest.split_last() {
            Some((last, interior)) => (
                last.split_whitespace().map(str::to_string).collect(),
                interior,
            ),
            None => (Vec::new(), &[]),
        };

        for token in pairs {
            let (key, value) = token.split_once(':').ok_or_else(|| {
                DecoderError::malformed(
                    LineKind::Network,
                    format!("expected key:value, found {:?} in {:?}", token, line),
                )
            })?;
            fields.insert(key.to_lowercase(), FieldValue::from(value));
        }

        fields.insert("protocol".to_string(), FieldValue::from(*protocol));
        fields.insert("ip_flags".to_string(), FieldValue::List(flags));
        Ok(())
    }

    /// `[<tcp flags>] Key: value  Key: value ...`
    fn parse_transport(line: &str, fields: &mut FieldMap) -> Result<()> {
        let mut segments = line
            .split(SEGMENT_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty());

        if let Some(first) = segments.next() {
            let first = match split_tcp_flags(first) {
                Some((flags, rest)) => {
                    fields.insert("tcp_flags".to_string(), FieldValue::from(flags));
                    rest
                }
                None => first,
            };
            Self::insert_transport_pair(first, line, fields)?;
        }

        for segment in segments {
            Self::insert_transport_pair(segment, line, fields)?;
        }

        Ok(())
    }

    fn insert_transport_pair(segment: &str, line: &str, fields: &mut FieldMap) -> Result<()> {
        let (key, value) = segment.split_once(TRANSPORT_PAIR_SEPARATOR).ok_or_else(|| {
            DecoderError::malformed(
                LineKind::Transport,
                format!("expected 'Key: value', found {:?} in {:?}", segment, line),
            )
        })?;
        fields.insert(key.trim().to_lowercase(), FieldValue::from(value.trim()));
        Ok(())
    }
}

/// Detect a leading TCP flags token (`***AP*** Seq: 1`)
///
/// The segment starts with flags when its first space comes before its first
/// colon, or when it has a space but no colon at all. Segments such as
/// `Len: 10` (colon before any space) or `Len:10` (no space) are left alone.
fn split_tcp_flags(segment: &str) -> Option<(&str, &str)> {
    let space = segment.find(char::is_whitespace)?;
    match segment.find(':') {
        Some(colon) if colon < space => None,
        _ => Some((&segment[..space], segment[space..].trim_start())),
    }
}

/// Split on whitespace runs into at most `n` tokens; the last token keeps the
/// unsplit remainder of the line.
fn split_whitespace_n(line: &str, n: usize) -> Vec<&str> {
    let mut tokens = Vec::with_capacity(n);
    let mut rest = line.trim();

    while !rest.is_empty() {
        if tokens.len() + 1 == n {
            tokens.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                tokens.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                tokens.push(rest);
                break;
            }
        }
    }

    tokens
}

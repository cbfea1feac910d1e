//! Template Formatter
//!
//! Renders field maps through a compiled [`Template`]. Missing fields are
//! replaced by the configured default value, and placeholders carrying the
//! decimal marker have their value converted to base 10 first. Formatting
//! never fails: field sets differ per protocol, so absent fields are normal.

use crate::config::FormatterConfig;
use crate::template::{Placeholder, Segment, Template};
use crate::types::{FieldMap, FieldValue, Result};
use std::borrow::Cow;

/// Record terminator appended to every formatted line
pub const RECORD_TERMINATOR: char = '\n';

/// Formats field maps into single output lines
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    template: Template,
    default_value: String,
}

impl TemplateFormatter {
    /// Compile the configured template and create a formatter
    ///
    /// # Returns
    /// * `Err(DecoderError::InvalidTemplate)` if the template does not compile
    pub fn new(config: FormatterConfig) -> Result<Self> {
        let template = Template::compile(&config.template)?;
        Ok(Self {
            template,
            default_value: config.default_value,
        })
    }

    /// The compiled template
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Header line listing the template's field names
    ///
    /// Names appear in template order, repeats included, with the first
    /// letter upper-cased: `{src} {dest}` gives `Src Dest`, and
    /// `{ip_flags[0]}` gives `Ip_flags[0]`.
    pub fn header(&self) -> String {
        self.template
            .placeholders()
            .map(|placeholder| capitalize(&placeholder.reference()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render one record, including the trailing record terminator
    pub fn format(&self, fields: &FieldMap) -> String {
        let mut line = String::with_capacity(self.template.source().len() * 2);

        for segment in self.template.segments() {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(placeholder) => {
                    let value = lookup(fields, placeholder, &self.default_value);
                    placeholder.spec.apply(&value, &mut line);
                }
            }
        }

        line.push(RECORD_TERMINATOR);
        line
    }
}

/// Resolve a placeholder against a field map
///
/// Absent fields resolve to `default` untouched, and so does an index past
/// the end of a list. Present fields render through their `Display` form
/// and, when the placeholder asks for it, are normalized to decimal.
pub fn lookup<'a>(fields: &'a FieldMap, placeholder: &Placeholder, default: &'a str) -> Cow<'a, str> {
    let value = match fields.get(&placeholder.name) {
        Some(value) => value,
        None => {
            log::trace!("Field {:?} missing, using default", placeholder.name);
            return Cow::Borrowed(default);
        }
    };

    let rendered = match (value, placeholder.index) {
        (FieldValue::Text(text), None) => Cow::Borrowed(text.as_str()),
        (list, None) => Cow::Owned(list.to_string()),
        (FieldValue::List(items), Some(index)) => match items.get(index) {
            Some(item) => Cow::Borrowed(item.as_str()),
            None => return Cow::Borrowed(default),
        },
        (FieldValue::Text(text), Some(index)) => match text.chars().nth(index) {
            Some(c) => Cow::Owned(c.to_string()),
            None => return Cow::Borrowed(default),
        },
    };

    if placeholder.decimal {
        Cow::Owned(normalize_decimal(&rendered))
    } else {
        rendered
    }
}

/// Convert a binary, octal, hex or mixed numeric string to base 10
///
/// - `0b…`, `0o…`, `0x…` (prefix in either case): parsed in base 2, 8 or 16
/// - anything else: the first run of decimal digits, leading zeros dropped
///
/// Values that cannot be read as a number become an empty string. There is
/// no upper bound on the magnitude of a value.
pub fn normalize_decimal(value: &str) -> String {
    if let Some((radix, digits)) = split_radix_prefix(value) {
        return to_decimal(digits, radix).unwrap_or_default();
    }

    let Some(start) = value.find(|c: char| c.is_ascii_digit()) else {
        return String::new();
    };
    let run = &value[start..];
    let end = run.find(|c: char| !c.is_ascii_digit()).unwrap_or(run.len());
    let digits = run[..end].trim_start_matches('0');

    if digits.is_empty() {
        "0".to_string()
    } else {
        digits.to_string()
    }
}

/// Base conversion over base-10^9 limbs, least significant first
fn to_decimal(digits: &str, radix: u32) -> Option<String> {
    const LIMB: u64 = 1_000_000_000;

    if digits.is_empty() {
        return None;
    }

    let mut limbs: Vec<u32> = vec![0];
    for c in digits.chars() {
        let mut carry = u64::from(c.to_digit(radix)?);
        for limb in limbs.iter_mut() {
            let value = u64::from(*limb) * u64::from(radix) + carry;
            *limb = (value % LIMB) as u32;
            carry = value / LIMB;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
    }

    let mut limbs = limbs.iter().rev();
    let mut out = limbs.next().map(u32::to_string).unwrap_or_default();
    for limb in limbs {
        out.push_str(&format!("{:09}", limb));
    }
    Some(out)
}

fn split_radix_prefix(value: &str) -> Option<(u32, &str)> {
    let prefix = value.get(..2)?;
    let radix = match prefix {
        "0b" | "0B" => 2,
        "0o" | "0O" => 8,
        "0x" | "0X" => 16,
        _ => return None,
    };
    Some((radix, &value[2..]))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TEMPLATE;

    fn formatter(template: &str) -> TemplateFormatter {
        TemplateFormatter::new(FormatterConfig::new().with_template(template)).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_header() {
        assert_eq!(formatter("{src} {dest}").header(), "Src Dest");
        assert_eq!(formatter("{src},{src}|{ip_flags}").header(), "Src Src Ip_flags");
        assert_eq!(formatter("no fields").header(), "");
    }

    #[test]
    fn test_default_template_header() {
        let header = TemplateFormatter::new(FormatterConfig::new()).unwrap().header();
        assert_eq!(
            header,
            "Date Src Dest Protocol Ttl Tos Id Iplen Dgmlen Ip_flags Tcp_flags Seq Ack Win Tcplen Len"
        );
        assert_eq!(header.split(' ').count(), DEFAULT_TEMPLATE.matches('{').count());
    }

    #[test]
    fn test_format_with_literals() {
        let line = formatter("{src} -> {dest} [{protocol}]")
            .format(&fields(&[("src", "a"), ("dest", "b"), ("protocol", "UDP")]));
        assert_eq!(line, "a -> b [UDP]\n");
    }

    #[test]
    fn test_missing_field_uses_default() {
        let config = FormatterConfig::new()
            .with_template("{src}|{tcp_flags}|{seq:D}")
            .with_default_value("N/A");
        let formatter = TemplateFormatter::new(config).unwrap();

        let line = formatter.format(&fields(&[("src", "10.0.0.1")]));
        assert_eq!(line, "10.0.0.1|N/A|N/A\n");

        let line = formatter.format(&FieldMap::new());
        assert_eq!(line, "N/A|N/A|N/A\n");
    }

    #[test]
    fn test_empty_default() {
        let line = formatter("{a},{b},{c}").format(&fields(&[("b", "x")]));
        assert_eq!(line, ",x,\n");
    }

    #[test]
    fn test_list_field_rendering() {
        let mut map = FieldMap::new();
        map.insert(
            "ip_flags".to_string(),
            FieldValue::List(vec!["DF".to_string(), "MF".to_string()]),
        );
        assert_eq!(formatter("{ip_flags}").format(&map), "[DF, MF]\n");
    }

    #[test]
    fn test_indexed_list_field() {
        let mut map = fields(&[("id", "0x1F")]);
        map.insert(
            "ip_flags".to_string(),
            FieldValue::List(vec!["DF".to_string(), "MF".to_string()]),
        );
        let config = FormatterConfig::new()
            .with_template("{ip_flags[0]}|{ip_flags[1]:>3}|{ip_flags[2]}|{tcp_flags[0]}|{id[2]:D}")
            .with_default_value("-");
        let formatter = TemplateFormatter::new(config).unwrap();

        assert_eq!(formatter.format(&map), "DF| MF|-|-|1\n");
        assert_eq!(
            formatter.header(),
            "Ip_flags[0] Ip_flags[1] Ip_flags[2] Tcp_flags[0] Id[2]"
        );
    }

    #[test]
    fn test_decimal_round_trip() {
        let formatter = formatter("{n:D}");
        for n in [
            0u128,
            1,
            7,
            8,
            255,
            4096,
            65535,
            1_000_000,
            1_000_000_000,
            u32::MAX as u128,
            u64::MAX as u128,
            u128::MAX,
        ] {
            let expected = format!("{}\n", n);
            for raw in [
                format!("0b{:b}", n),
                format!("0o{:o}", n),
                format!("0x{:x}", n),
                n.to_string(),
            ] {
                let line = formatter.format(&fields(&[("n", raw.as_str())]));
                assert_eq!(line, expected, "converting {}", raw);
            }
        }

        // 2^132, wider than any native integer
        let wide = "5444517870735015415413993718908291383296\n";
        for raw in [
            "0x1000000000000000000000000000000000".to_string(),
            format!("0o1{}", "0".repeat(44)),
            format!("0b1{}", "0".repeat(132)),
            wide.trim_end().to_string(),
        ] {
            let line = formatter.format(&fields(&[("n", raw.as_str())]));
            assert_eq!(line, wide, "converting {}", raw);
        }
    }

    #[test]
    fn test_normalize_decimal() {
        assert_eq!(normalize_decimal("0x1F"), "31");
        assert_eq!(normalize_decimal("0XFF"), "255");
        assert_eq!(normalize_decimal("0b101"), "5");
        assert_eq!(normalize_decimal("0o17"), "15");
        assert_eq!(normalize_decimal("IpLen20"), "20");
        assert_eq!(normalize_decimal("port 80 and 443"), "80");
        assert_eq!(normalize_decimal("007"), "7");
        assert_eq!(normalize_decimal("000"), "0");
        assert_eq!(normalize_decimal("0x0"), "0");
        assert_eq!(normalize_decimal("0x3B9ACA00"), "1000000000");
        assert_eq!(normalize_decimal("0x3B9ACA01"), "1000000001");
    }

    #[test]
    fn test_unrepresentable_values_are_empty() {
        assert_eq!(normalize_decimal("***AP***"), "");
        assert_eq!(normalize_decimal(""), "");
        assert_eq!(normalize_decimal("0x"), "");
        assert_eq!(normalize_decimal("0xZZ"), "");
        assert_eq!(normalize_decimal("0b102"), "");
        assert_eq!(normalize_decimal("0x+5"), "");

        let line = formatter("<{flags:D}>").format(&fields(&[("flags", "***AP***")]));
        assert_eq!(line, "<>\n");
    }

    #[test]
    fn test_decimal_then_width() {
        let line = formatter("{id:>6D}|{id:06D}|{win:<8}|")
            .format(&fields(&[("id", "0x10"), ("win", "0xFF")]));
        assert_eq!(line, "    16|000016|0xFF    |\n");
    }

    #[test]
    fn test_format_is_idempotent() {
        let formatter = TemplateFormatter::new(FormatterConfig::new()).unwrap();
        let map = fields(&[("src", "10.0.0.1"), ("ttl", "64"), ("id", "0x1")]);

        assert_eq!(formatter.format(&map), formatter.format(&map));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let result = TemplateFormatter::new(FormatterConfig::new().with_template("{src"));
        assert!(result.is_err());
    }
}

//! Output template compiler
//!
//! A template such as `{date} {src:>21} {id:08D}` is compiled once into a list
//! of literal and placeholder segments, so rendering a record only walks the
//! compiled list.
//!
//! ## Placeholder syntax
//! `{name}`, `{name[index]}` or either of them followed by `:spec`. An index
//! selects one item of a list field (or one character of a text field).
//! `spec` is
//! `[[fill]align]['0'][width]['.' precision][type]`:
//! - `align`: `<` left (default), `>` right, `^` center
//! - `0`: pad with zeros, right aligned unless an alignment is given
//! - `precision`: keep at most that many characters of the value
//! - `type`: `s` (plain string) or `D` (decimal normalization, see
//!   [`crate::formatter::normalize_decimal`])
//!
//! `{{` and `}}` produce literal braces.

use crate::types::{DecoderError, Result};

/// Type character requesting decimal normalization of a field
pub const DECIMAL_MARKER: char = 'D';

/// Horizontal alignment inside the field width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        }
    }
}

/// Width, alignment and padding directives of one placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Align,
    pub width: Option<usize>,
    pub precision: Option<usize>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: Align::Left,
            width: None,
            precision: None,
        }
    }
}

impl FormatSpec {
    /// Parse a format spec, returning it together with the decimal flag
    pub fn parse(spec: &str) -> Result<(Self, bool)> {
        let invalid = || DecoderError::InvalidTemplate(format!("bad format spec {:?}", spec));

        let mut chars: Vec<char> = spec.chars().collect();
        let mut decimal = false;
        match chars.last() {
            Some(&DECIMAL_MARKER) => {
                decimal = true;
                chars.pop();
            }
            Some(&'s') => {
                chars.pop();
            }
            _ => {}
        }

        let mut result = FormatSpec::default();
        let mut explicit_fill = false;
        let mut explicit_align = false;
        let mut i = 0;

        if let Some(align) = chars.get(1).and_then(|&c| Align::from_char(c)) {
            result.fill = chars[0];
            result.align = align;
            explicit_fill = true;
            explicit_align = true;
            i = 2;
        } else if let Some(align) = chars.first().and_then(|&c| Align::from_char(c)) {
            result.align = align;
            explicit_align = true;
            i = 1;
        }

        if chars.get(i) == Some(&'0') {
            if !explicit_fill {
                result.fill = '0';
            }
            if !explicit_align {
                result.align = Align::Right;
            }
            i += 1;
        }

        let (width, next) = take_number(&chars, i);
        result.width = width;
        i = next;

        if chars.get(i) == Some(&'.') {
            let (precision, next) = take_number(&chars, i + 1);
            result.precision = Some(precision.ok_or_else(invalid)?);
            i = next;
        }

        if i != chars.len() {
            return Err(invalid());
        }

        Ok((result, decimal))
    }

    /// Apply precision, fill and alignment to a rendered value
    pub fn apply(&self, value: &str, out: &mut String) {
        let value: String = match self.precision {
            Some(precision) => value.chars().take(precision).collect(),
            None => value.to_string(),
        };

        let len = value.chars().count();
        let pad = self.width.map_or(0, |width| width.saturating_sub(len));
        let (left, right) = match self.align {
            Align::Left => (0, pad),
            Align::Right => (pad, 0),
            Align::Center => (pad / 2, pad - pad / 2),
        };

        out.extend(std::iter::repeat(self.fill).take(left));
        out.push_str(&value);
        out.extend(std::iter::repeat(self.fill).take(right));
    }
}

/// Parse a run of ASCII digits starting at `start`
fn take_number(chars: &[char], start: usize) -> (Option<usize>, usize) {
    let mut end = start;
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.get(end).and_then(|c| c.to_digit(10)) {
        value = Some(
            value
                .unwrap_or(0)
                .saturating_mul(10)
                .saturating_add(digit as usize),
        );
        end += 1;
    }
    (value, end)
}

/// A field reference inside a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Field name as written in the template
    pub name: String,
    /// Item selected by a trailing `[n]`
    pub index: Option<usize>,
    /// Width and alignment directives
    pub spec: FormatSpec,
    /// Whether the value is normalized to base 10 before formatting
    pub decimal: bool,
}

impl Placeholder {
    fn parse(body: &str) -> Result<Self> {
        let (name, spec) = match body.split_once(':') {
            Some((name, spec)) => (name, Some(spec)),
            None => (body, None),
        };

        if name.is_empty() {
            return Err(DecoderError::InvalidTemplate(format!(
                "empty field name in {{{}}}",
                body
            )));
        }

        let (name, index) = split_index(name).ok_or_else(|| {
            DecoderError::InvalidTemplate(format!(
                "unsupported field reference {:?}, expected name or name[index]",
                name
            ))
        })?;

        let (spec, decimal) = match spec {
            Some(spec) => FormatSpec::parse(spec)?,
            None => (FormatSpec::default(), false),
        };

        Ok(Self {
            name: name.to_string(),
            index,
            spec,
            decimal,
        })
    }

    /// Field reference as written in the template, without the format spec
    pub fn reference(&self) -> String {
        match self.index {
            Some(index) => format!("{}[{}]", self.name, index),
            None => self.name.clone(),
        }
    }
}

/// Split `name[n]` into the name and index; `None` for anything else with
/// brackets or attribute access
fn split_index(reference: &str) -> Option<(&str, Option<usize>)> {
    let (name, index) = match reference.split_once('[') {
        Some((name, rest)) => {
            let digits = rest.strip_suffix(']')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (name, Some(digits.parse().ok()?))
        }
        None => (reference, None),
    };

    if name.is_empty() || name.contains(|c: char| matches!(c, '[' | ']' | '.')) {
        return None;
    }
    Some((name, index))
}

/// One piece of a compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output verbatim
    Literal(String),
    /// A field reference
    Field(Placeholder),
}

/// A compiled output template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile a template string
    ///
    /// Fails with `InvalidTemplate` on an unclosed `{`, a stray `}`, an empty
    /// field name or a format spec that cannot be parsed.
    pub fn compile(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(DecoderError::InvalidTemplate(format!(
                                    "nested '{{' in placeholder starting at offset {}",
                                    pos
                                )))
                            }
                            _ => body.push(c),
                        }
                    }
                    if !closed {
                        return Err(DecoderError::InvalidTemplate(format!(
                            "unclosed '{{' at offset {}",
                            pos
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(Placeholder::parse(&body)?));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(DecoderError::InvalidTemplate(format!(
                        "single '}}' at offset {}",
                        pos
                    )))
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        log::debug!("Compiled template {:?} into {} segments", source, segments.len());
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template string this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled segments in template order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholders in template order, repeats included
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(placeholder) => Some(placeholder),
            Segment::Literal(_) => None,
        })
    }
}

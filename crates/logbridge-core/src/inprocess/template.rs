//! Template language of the in-process engine.
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `$NAME`, `${NAME}` | value of the name-value pair `NAME` (empty when unset) |
//! | `$$` | a literal `$` |
//! | `$SEQNUM` | sequence number passed to `format` |
//! | `$ISODATE` | send timestamp, ISO 8601 |
//! | `$DATE` | send timestamp, BSD syslog style (`Mar  1 10:30:00`) |
//! | `$UNIXTIME` | send timestamp, seconds since the epoch |
//!
//! Names consist of ASCII letters, digits, `_` and `.`.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local, Timelike};

use super::TemplateOptions;
use crate::native::TimeZone;

const MAX_FRAC_DIGITS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Macro {
    SeqNum,
    IsoDate,
    Date,
    UnixTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    Literal(String),
    Value(String),
    Macro(Macro),
}

impl Element {
    fn reference(name: String) -> Self {
        match name.as_str() {
            "SEQNUM" => Self::Macro(Macro::SeqNum),
            "ISODATE" => Self::Macro(Macro::IsoDate),
            "DATE" => Self::Macro(Macro::Date),
            "UNIXTIME" => Self::Macro(Macro::UnixTime),
            _ => Self::Value(name),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Everything a compiled template reads while rendering.
pub(crate) struct RenderInput<'a> {
    pub values: &'a BTreeMap<String, String>,
    pub stamp: DateTime<FixedOffset>,
    pub options: &'a TemplateOptions,
    pub time_zone: TimeZone,
    pub seqnum: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledTemplate {
    elements: Vec<Element>,
}

impl CompiledTemplate {
    pub(crate) fn compile(text: &str) -> Result<Self, String> {
        let mut elements = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }

            let mut trailing = 0;
            let name = match chars.peek().copied() {
                Some((_, '$')) => {
                    chars.next();
                    literal.push('$');
                    continue;
                }
                Some((_, '{')) => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(format!("unterminated ${{...}} reference at offset {pos}"));
                    }
                    if name.is_empty() {
                        return Err(format!("empty ${{}} reference at offset {pos}"));
                    }
                    name
                }
                Some((_, c)) if is_name_char(c) => {
                    let mut name = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if !is_name_char(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    // An unbraced name never ends with '.': `$MSG.` keeps the period.
                    let kept = name.trim_end_matches('.').len();
                    trailing = name.len() - kept;
                    name.truncate(kept);
                    if name.is_empty() {
                        return Err(format!("expected a name after '$' at offset {pos}"));
                    }
                    name
                }
                _ => return Err(format!("expected a name after '$' at offset {pos}")),
            };

            if !literal.is_empty() {
                elements.push(Element::Literal(std::mem::take(&mut literal)));
            }
            elements.push(Element::reference(name));
            literal.extend(std::iter::repeat_n('.', trailing));
        }

        if !literal.is_empty() {
            elements.push(Element::Literal(literal));
        }
        Ok(Self { elements })
    }

    pub(crate) fn render(&self, input: &RenderInput<'_>) -> String {
        let stamp = match input.time_zone {
            TimeZone::Send => input.stamp,
            TimeZone::Local => match input.options.local_time_zone {
                Some(offset) => input.stamp.with_timezone(&offset),
                None => input.stamp.with_timezone(&Local).fixed_offset(),
            },
        };
        let frac_digits = input.options.frac_digits.min(MAX_FRAC_DIGITS);

        let mut out = String::new();
        for element in &self.elements {
            match element {
                Element::Literal(text) => out.push_str(text),
                Element::Value(name) => {
                    if let Some(value) = input.values.get(name) {
                        out.push_str(value);
                    }
                }
                Element::Macro(Macro::SeqNum) => out.push_str(&input.seqnum.to_string()),
                Element::Macro(Macro::IsoDate) => {
                    out.push_str(&stamp.format("%Y-%m-%dT%H:%M:%S").to_string());
                    out.push_str(&fraction(&stamp, frac_digits));
                    out.push_str(&stamp.format("%:z").to_string());
                }
                Element::Macro(Macro::Date) => {
                    out.push_str(&stamp.format("%b %e %H:%M:%S").to_string());
                }
                Element::Macro(Macro::UnixTime) => {
                    out.push_str(&stamp.timestamp().to_string());
                    out.push_str(&fraction(&stamp, frac_digits));
                }
            }
        }
        out
    }
}

fn fraction(stamp: &DateTime<FixedOffset>, digits: u8) -> String {
    if digits == 0 {
        return String::new();
    }
    let divisor = 10u32.pow(9 - u32::from(digits));
    let value = stamp.nanosecond() % 1_000_000_000 / divisor;
    format!(".{:0width$}", value, width = usize::from(digits))
}

//! The `format(...)` placeholder mini-language.
//!
//! Placeholders are `{index?[:spec]?}` with spec
//! `[[fill]align][sign][#][0][width][.precision][L]type`. Doubles honor
//! width/precision/type; every other tag falls back to its inspection
//! string, post-processed by the alignment rule.

use crate::errors::ErrorObj;
use crate::object::{inspect, ObjectKind, ObjectRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    None,
    Plus,
    Minus,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum FormatType {
    None,
    Question,
    b,
    B,
    c,
    d,
    o,
    x,
    X,
    a,
    A,
    e,
    E,
    f,
    F,
    g,
    G,
    p,
    P,
}

#[derive(Debug, Clone)]
pub struct Formatting {
    pub fill: Option<char>,
    pub alignment: Align,
    pub sign: Sign,
    pub alternative_form: bool,
    pub zero_padding: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub locale_specific: bool,
    pub format_type: FormatType,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            fill: None,
            alignment: Align::None,
            sign: Sign::None,
            alternative_form: false,
            zero_padding: false,
            width: None,
            precision: None,
            locale_specific: false,
            format_type: FormatType::None,
        }
    }
}

/// Parses a format spec; a malformed spec is reported with the offending
/// character so the caller can build the `Format string malformed` error.
pub fn parse_formatting(spec: &str) -> Result<Formatting, String> {
    let chars: Vec<char> = spec.chars().collect();
    let mut formatting = Formatting::default();
    let mut position = 0;

    if chars.len() > 1 && matches!(chars[1], '<' | '>' | '^') {
        formatting.fill = Some(chars[0]);
        formatting.alignment = match chars[1] {
            '<' => Align::Left,
            '>' => Align::Right,
            _ => Align::Center,
        };
        position += 2;
    } else if !chars.is_empty() && matches!(chars[0], '<' | '>' | '^') {
        formatting.alignment = match chars[0] {
            '<' => Align::Left,
            '>' => Align::Right,
            _ => Align::Center,
        };
        position += 1;
    }

    if position < chars.len() && matches!(chars[position], '+' | '-' | ' ') {
        formatting.sign = match chars[position] {
            '+' => Sign::Plus,
            '-' => Sign::Minus,
            _ => Sign::Space,
        };
        position += 1;
    }

    if position < chars.len() && chars[position] == '#' {
        formatting.alternative_form = true;
        position += 1;
    }

    if position < chars.len() && chars[position] == '0' {
        formatting.zero_padding = true;
        position += 1;
    }

    let width_start = position;
    while position < chars.len() && chars[position].is_ascii_digit() {
        position += 1;
    }
    if position > width_start {
        let digits: String = chars[width_start..position].iter().collect();
        formatting.width = digits.parse().ok();
    }

    if position < chars.len() && chars[position] == '.' {
        position += 1;
        let precision_start = position;
        while position < chars.len() && chars[position].is_ascii_digit() {
            position += 1;
        }
        if position > precision_start {
            let digits: String = chars[precision_start..position].iter().collect();
            formatting.precision = digits.parse().ok();
        }
    }

    if position < chars.len() && chars[position] == 'L' {
        formatting.locale_specific = true;
        position += 1;
    }

    if position < chars.len() {
        formatting.format_type = match chars[position] {
            '?' => FormatType::Question,
            'b' => FormatType::b,
            'B' => FormatType::B,
            'c' => FormatType::c,
            'd' => FormatType::d,
            'o' => FormatType::o,
            'x' => FormatType::x,
            'X' => FormatType::X,
            'a' => FormatType::a,
            'A' => FormatType::A,
            'e' => FormatType::e,
            'E' => FormatType::E,
            'f' => FormatType::f,
            'F' => FormatType::F,
            'g' => FormatType::g,
            'G' => FormatType::G,
            'p' => FormatType::p,
            'P' => FormatType::P,
            other => return Err(format!("Unknown type specifier {other}")),
        };
        position += 1;
        if position < chars.len() {
            return Err(format!("Unexpected trailing specifier {}", chars[position]));
        }
    }

    Ok(formatting)
}

/// `%[0][width][.precision]{f|F|e|E|g|G}` semantics for doubles, with the
/// alignment applied as a post-process over the padded result.
fn format_double(value: f64, formatting: &Formatting) -> String {
    let precision = formatting.precision.unwrap_or(6);
    let body = match formatting.format_type {
        FormatType::None | FormatType::f => format!("{value:.precision$}"),
        FormatType::F => {
            let rendered = format!("{value:.precision$}");
            rendered.to_uppercase()
        }
        FormatType::e => format!("{value:.precision$e}"),
        FormatType::E => format!("{value:.precision$E}"),
        FormatType::g | FormatType::G => {
            // shortest of fixed and scientific, as %g does
            let fixed = format!("{value:.precision$}");
            let scientific = format!("{value:.precision$e}");
            let chosen = if fixed.len() <= scientific.len() {
                fixed
            } else {
                scientific
            };
            if formatting.format_type == FormatType::G {
                chosen.to_uppercase()
            } else {
                chosen
            }
        }
        _ => return String::new(),
    };

    let padded = match formatting.width {
        Some(width) if body.len() < width => {
            if formatting.zero_padding {
                let negative = body.starts_with('-');
                let digits = if negative { &body[1..] } else { &body[..] };
                let zeros = "0".repeat(width - body.len());
                if negative {
                    format!("-{zeros}{digits}")
                } else {
                    format!("{zeros}{digits}")
                }
            } else {
                format!("{body:>width$}")
            }
        }
        _ => body,
    };

    let fill = formatting.fill.unwrap_or(' ');
    match formatting.alignment {
        Align::Left => {
            let trimmed = padded.trim_start().to_string();
            let pad = padded.len() - trimmed.len();
            format!("{trimmed}{}", fill.to_string().repeat(pad))
        }
        Align::Right => {
            let trimmed = padded.trim_start().to_string();
            let pad = padded.len() - trimmed.len();
            format!("{}{trimmed}", fill.to_string().repeat(pad))
        }
        Align::Center | Align::None => padded,
    }
}

/// Formats a single value with a parsed spec. Non-double tags render as
/// their inspection string (strings unquoted), aligned when requested.
#[must_use]
pub fn format_value(object: &ObjectRef, formatting: &Formatting) -> String {
    let rendered = match &object.borrow().kind {
        ObjectKind::Double(value) => return format_double(*value, formatting),
        ObjectKind::Str(value) => value.clone(),
        _ => inspect(object),
    };
    match (formatting.width, formatting.alignment) {
        (Some(width), Align::Left) if rendered.len() < width => {
            let fill = formatting.fill.unwrap_or(' ');
            format!("{rendered}{}", fill.to_string().repeat(width - rendered.len()))
        }
        (Some(width), Align::Right) if rendered.len() < width => {
            let fill = formatting.fill.unwrap_or(' ');
            format!("{}{rendered}", fill.to_string().repeat(width - rendered.len()))
        }
        (Some(width), Align::Center) if rendered.len() < width => {
            let fill = formatting.fill.unwrap_or(' ').to_string();
            let total = width - rendered.len();
            let left = total / 2;
            format!("{}{rendered}{}", fill.repeat(left), fill.repeat(total - left))
        }
        _ => rendered,
    }
}

/// Substitutes `{index?[:spec]?}` placeholders into `template`.
/// Placeholders without an index consume arguments positionally.
pub fn format_template(template: &str, values: &[ObjectRef]) -> Result<String, ErrorObj> {
    let mut result = String::new();
    let chars: Vec<char> = template.chars().collect();
    let mut position = 0;
    let mut next_value = 0;

    while position < chars.len() {
        if chars[position] != '{' {
            result.push(chars[position]);
            position += 1;
            continue;
        }

        let Some(end) = chars[position..].iter().position(|&c| c == '}') else {
            return Err(ErrorObj::value_err("Missing closing brace"));
        };
        let end = position + end;
        let placeholder: String = chars[position + 1..end].iter().collect();

        let (reference, spec) = match placeholder.split_once(':') {
            Some((reference, spec)) => (reference, spec),
            None => (placeholder.as_str(), ""),
        };

        let index = if reference.is_empty() {
            next_value
        } else if reference.chars().all(|c| c.is_ascii_digit()) {
            reference.parse::<usize>().unwrap_or(usize::MAX)
        } else {
            return Err(ErrorObj::value_err("Referenced value is not an integer"));
        };

        if index >= values.len() {
            return Err(ErrorObj::index_err("Referenced value out of range"));
        }

        let formatting = parse_formatting(spec)
            .map_err(|detail| ErrorObj::value_err(format!("Format string malformed: {detail}")))?;
        result.push_str(&format_value(&values[index], &formatting));

        position = end + 1;
        next_value += 1;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{double_obj, integer_obj, string_obj};

    #[test]
    fn positional_consumption() {
        let values = [integer_obj(1), integer_obj(2)];
        assert_eq!(format_template("{} {}", &values).unwrap(), "1 2");
        assert_eq!(format_template("{1} {0}", &values).unwrap(), "2 1");
    }

    #[test]
    fn double_precision_and_width() {
        let values = [double_obj(3.14159)];
        assert_eq!(format_template("{0:.2f}", &values).unwrap(), "3.14");
        assert_eq!(format_template("{0:8.2f}", &values).unwrap(), "    3.14");
        assert_eq!(format_template("{0:08.2f}", &values).unwrap(), "00003.14");
    }

    #[test]
    fn alignment_with_fill() {
        let values = [double_obj(1.5)];
        assert_eq!(format_template("{0:*>8.1f}", &values).unwrap(), "*****1.5");
        assert_eq!(format_template("{0:*<8.1f}", &values).unwrap(), "1.5*****");
    }

    #[test]
    fn strings_render_unquoted() {
        let values = [string_obj("hi")];
        assert_eq!(format_template("[{0}]", &values).unwrap(), "[hi]");
    }

    #[test]
    fn malformed_spec_is_a_value_error() {
        let values = [double_obj(1.0)];
        let error = format_template("{0:Z}", &values).unwrap_err();
        assert!(error.message.starts_with("Format string malformed"));
    }

    #[test]
    fn out_of_range_reference() {
        let values = [integer_obj(1)];
        assert!(format_template("{3}", &values).is_err());
    }

    #[test]
    fn missing_closing_brace() {
        let values = [integer_obj(1)];
        let error = format_template("{0", &values).unwrap_err();
        assert_eq!(error.message, "Missing closing brace");
    }
}

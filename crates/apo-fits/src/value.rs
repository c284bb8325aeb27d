//! Header value parsing and formatting for the 70-byte value field of a card.

use core::str;

/// A parsed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string with trailing pad blanks removed.
    String(String),
}

impl Value {
    /// Numeric view of the value; integers are promoted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Integer view of the value. Floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// String view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Logical(_) => "logical",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }
}

/// Find the ` /` comment separator and return the trimmed comment after it.
///
/// The standard asks for ` / ` but IDL and other writers omit the trailing
/// space, so one optional space is skipped.
fn comment_after(field: &[u8]) -> Option<(usize, &str)> {
    let pos = field.windows(2).position(|w| w == b" /")?;
    let mut start = pos + 2;
    if field.get(start) == Some(&b' ') {
        start += 1;
    }
    let comment = str::from_utf8(&field[start..]).ok()?.trim_end();
    if comment.is_empty() {
        None
    } else {
        Some((pos, comment))
    }
}

/// Parse a quoted string value. Doubled quotes are a literal `'`; an
/// unterminated string is accepted as-is.
fn parse_string(field: &[u8]) -> (Value, Option<&str>) {
    let mut value = String::new();
    let mut i = 1;

    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                value.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            break;
        }
        value.push(field[i] as char);
        i += 1;
    }

    let trimmed = value.trim_end().to_string();
    let comment = comment_after(&field[i.min(field.len())..]).map(|(_, c)| c);
    (Value::String(trimmed), comment)
}

/// Parse a float string, handling FITS `D` exponent notation.
fn parse_float_str(s: &str) -> Option<f64> {
    s.replace(['D', 'd'], "E").parse::<f64>().ok()
}

/// Parse a FITS header value from the 70-byte value portion of an 80-byte
/// card (bytes 10..80).
///
/// Returns the parsed [`Value`] and an optional comment. Value types this
/// crate does not model (complex numbers) yield `None`.
pub fn parse_value(value_bytes: &[u8]) -> Option<(Value, Option<&str>)> {
    let lead = value_bytes.iter().position(|&b| b != b' ')?;
    let field = &value_bytes[lead..];

    if field[0] == b'\'' {
        return Some(parse_string(field));
    }

    let (val_part, comment) = match comment_after(field) {
        Some((pos, c)) => (&field[..pos], Some(c)),
        None => match field.iter().position(|&b| b == b'/') {
            Some(0) => return None,
            Some(pos) => (&field[..pos], None),
            None => (field, None),
        },
    };

    let val_text = str::from_utf8(val_part).ok()?.trim();
    if val_text.is_empty() {
        return None;
    }

    match val_text {
        "T" => return Some((Value::Logical(true), comment)),
        "F" => return Some((Value::Logical(false), comment)),
        _ => {}
    }

    if !val_text.contains(['.', 'E', 'e', 'D', 'd']) {
        if let Ok(n) = val_text.parse::<i64>() {
            return Some((Value::Integer(n), comment));
        }
    }

    parse_float_str(val_text).map(|f| (Value::Float(f), comment))
}

/// Serialize a [`Value`] into a 70-byte field suitable for bytes 10..80 of a
/// card.
///
/// Numeric and logical values are right-justified in the first 20 bytes
/// (fixed format); strings start at byte 0 with a quote.
pub fn format_value(value: &Value) -> [u8; 70] {
    let mut buf = [b' '; 70];

    match value {
        Value::Logical(b) => {
            buf[19] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => right_justify(n.to_string().as_bytes(), &mut buf[..20]),
        Value::Float(f) => right_justify(format_float(*f).as_bytes(), &mut buf[..20]),
        Value::String(s) => write_string(s, &mut buf),
    }

    buf
}

fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..].copy_from_slice(&src[..len]);
}

/// Shortest `E` notation, starting at 15 digits, that fits in 20 columns.
fn format_float(f: f64) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    let mut precision = 15usize;
    loop {
        let s = format!("{:.prec$E}", f, prec = precision);
        if s.len() <= 20 || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

fn write_string(s: &str, buf: &mut [u8; 70]) {
    buf[0] = b'\'';
    let mut pos = 1;

    for ch in s.bytes() {
        let width = if ch == b'\'' { 2 } else { 1 };
        if pos + width >= 69 {
            break;
        }
        buf[pos] = ch;
        if ch == b'\'' {
            buf[pos + 1] = b'\'';
        }
        pos += width;
    }

    // Strings are padded to at least 8 characters between the quotes.
    pos = pos.max(9);
    buf[pos] = b'\'';
}

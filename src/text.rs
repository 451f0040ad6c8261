//! Escaping, quoting and tokenizing shared by the text dialects.
//!
//! Escaped and quoted strings use the same backslash sequences (`\b \f \n \r \t \0 \\ \'`, plus
//! `\"` and `\xHH` on read). An escaped string ends at an unescaped tab or newline, which is left
//! unread; a quoted string is wrapped in single quotes. CSV strings are wrapped in double quotes
//! with embedded quotes doubled. JSON strings are escaped with `serde_json` and unescaped byte by
//! byte.

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::TypeError;

fn escape_byte(b: u8) -> Option<&'static [u8]> {
    match b {
        b'\x08' => Some(b"\\b"),
        b'\x0c' => Some(b"\\f"),
        b'\n' => Some(b"\\n"),
        b'\r' => Some(b"\\r"),
        b'\t' => Some(b"\\t"),
        b'\0' => Some(b"\\0"),
        b'\\' => Some(b"\\\\"),
        b'\'' => Some(b"\\'"),
        _ => None,
    }
}

pub(crate) fn write_escaped_bytes(bytes: &[u8], out: &mut WriteBuffer) {
    let mut start = 0;
    for (index, b) in bytes.iter().enumerate() {
        if let Some(escaped) = escape_byte(*b) {
            out.write(&bytes[start..index]);
            out.write(escaped);
            start = index + 1;
        }
    }
    out.write(&bytes[start..]);
}

pub(crate) fn write_quoted_bytes(bytes: &[u8], out: &mut WriteBuffer) {
    out.write_byte(b'\'');
    write_escaped_bytes(bytes, out);
    out.write_byte(b'\'');
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode the escape sequence following a backslash that has already been consumed.
fn read_escape(input: &mut ReadBuffer<'_>, type_name: &str) -> Result<u8, TypeError> {
    let b = input
        .read_byte()
        .map_err(|_| TypeError::cannot_parse(type_name, "unterminated escape sequence"))?;
    match b {
        b'b' => Ok(b'\x08'),
        b'f' => Ok(b'\x0c'),
        b'n' => Ok(b'\n'),
        b'r' => Ok(b'\r'),
        b't' => Ok(b'\t'),
        b'0' => Ok(b'\0'),
        b'\\' | b'\'' | b'"' | b'/' => Ok(b),
        b'x' => {
            let digits = input
                .read_array::<2>()
                .map_err(|_| TypeError::cannot_parse(type_name, "truncated \\x escape"))?;
            match (hex_digit(digits[0]), hex_digit(digits[1])) {
                (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
                _ => Err(TypeError::cannot_parse(type_name, "invalid \\x escape")),
            }
        }
        other => Err(TypeError::cannot_parse(
            type_name,
            format!("invalid escape sequence \\{}", other as char),
        )),
    }
}

pub(crate) fn read_escaped_bytes(
    input: &mut ReadBuffer<'_>,
    type_name: &str,
) -> Result<Vec<u8>, TypeError> {
    let mut out = Vec::new();
    while let Some(b) = input.peek() {
        match b {
            b'\t' | b'\n' => break,
            b'\\' => {
                input.advance(1);
                out.push(read_escape(input, type_name)?);
            }
            _ => {
                out.push(b);
                input.advance(1);
            }
        }
    }
    Ok(out)
}

pub(crate) fn read_quoted_bytes(
    input: &mut ReadBuffer<'_>,
    type_name: &str,
) -> Result<Vec<u8>, TypeError> {
    expect_byte(input, b'\'', type_name)?;
    let mut out = Vec::new();
    loop {
        match input.read_byte() {
            Ok(b'\'') => return Ok(out),
            Ok(b'\\') => out.push(read_escape(input, type_name)?),
            Ok(b) => out.push(b),
            Err(_) => return Err(TypeError::cannot_parse(type_name, "unterminated quoted string")),
        }
    }
}

pub(crate) fn write_csv_bytes(bytes: &[u8], out: &mut WriteBuffer) {
    out.write_byte(b'"');
    let mut start = 0;
    for (index, b) in bytes.iter().enumerate() {
        if *b == b'"' {
            out.write(&bytes[start..=index]);
            out.write_byte(b'"');
            start = index + 1;
        }
    }
    out.write(&bytes[start..]);
    out.write_byte(b'"');
}

/// Read a CSV field: either a double quoted string, or everything up to (but excluding) the
/// delimiter or a line break.
pub(crate) fn read_csv_bytes(
    input: &mut ReadBuffer<'_>,
    delimiter: u8,
    type_name: &str,
) -> Result<Vec<u8>, TypeError> {
    let mut out = Vec::new();
    if input.check_byte(b'"') {
        loop {
            match input.read_byte() {
                Ok(b'"') => {
                    if input.check_byte(b'"') {
                        out.push(b'"');
                    } else {
                        return Ok(out);
                    }
                }
                Ok(b) => out.push(b),
                Err(_) => {
                    return Err(TypeError::cannot_parse(type_name, "unterminated CSV string"))
                }
            }
        }
    }
    while let Some(b) = input.peek() {
        if b == delimiter || b == b'\n' || b == b'\r' {
            break;
        }
        out.push(b);
        input.advance(1);
    }
    Ok(out)
}

/// Valid UTF-8 runs are escaped the way `serde_json` escapes strings. Bytes which are not part
/// of any UTF-8 sequence are written through as they are, and [`read_json_bytes`] keeps them.
pub(crate) fn write_json_bytes(bytes: &[u8], out: &mut WriteBuffer) -> Result<(), TypeError> {
    out.write_byte(b'"');
    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        if !valid.is_empty() {
            let quoted = serde_json::to_string(valid)?;
            out.write(&quoted.as_bytes()[1..quoted.len() - 1]);
        }
        // always >= 0x80, never a quote or a backslash
        out.write(chunk.invalid());
    }
    out.write_byte(b'"');
    Ok(())
}

fn read_utf16_unit(input: &mut ReadBuffer<'_>, type_name: &str) -> Result<u16, TypeError> {
    let digits = input
        .read_array::<4>()
        .map_err(|_| TypeError::cannot_parse(type_name, "truncated \\u escape"))?;
    digits
        .iter()
        .try_fold(0u16, |unit, d| hex_digit(*d).map(|v| unit << 4 | v as u16))
        .ok_or_else(|| TypeError::cannot_parse(type_name, "invalid \\u escape"))
}

/// Decode the code point of a `\u` escape whose `\u` has already been consumed, joining a
/// surrogate pair when one follows.
fn read_json_char(input: &mut ReadBuffer<'_>, type_name: &str) -> Result<char, TypeError> {
    let first = read_utf16_unit(input, type_name)?;
    let mut units = vec![first];
    if (0xD800..0xDC00).contains(&first) && input.check_prefix(b"\\u") {
        units.push(read_utf16_unit(input, type_name)?);
    }
    let mut decoded = char::decode_utf16(units);
    match (decoded.next(), decoded.next()) {
        (Some(Ok(c)), None) => Ok(c),
        _ => Err(TypeError::cannot_parse(type_name, "unpaired surrogate in \\u escape")),
    }
}

fn read_json_escape(
    input: &mut ReadBuffer<'_>,
    type_name: &str,
    out: &mut Vec<u8>,
) -> Result<(), TypeError> {
    let b = input
        .read_byte()
        .map_err(|_| TypeError::cannot_parse(type_name, "unterminated escape sequence"))?;
    let byte = match b {
        b'"' | b'\\' | b'/' => b,
        b'b' => b'\x08',
        b'f' => b'\x0c',
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'u' => {
            let c = read_json_char(input, type_name)?;
            out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
            return Ok(());
        }
        other => {
            return Err(TypeError::cannot_parse(
                type_name,
                format!("invalid escape sequence \\{}", other.escape_ascii()),
            ))
        }
    };
    out.push(byte);
    Ok(())
}

/// Read a JSON string, unescaping it byte by byte. Raw bytes outside escapes are kept as they
/// are, whether or not they form valid UTF-8.
pub(crate) fn read_json_bytes(
    input: &mut ReadBuffer<'_>,
    type_name: &str,
) -> Result<Vec<u8>, TypeError> {
    if !input.check_byte(b'"') {
        return Err(TypeError::cannot_parse(type_name, "expected a JSON string"));
    }
    let mut out = Vec::new();
    loop {
        match input.read_byte() {
            Ok(b'"') => return Ok(out),
            Ok(b'\\') => read_json_escape(input, type_name, &mut out)?,
            Ok(b) => out.push(b),
            Err(_) => return Err(TypeError::cannot_parse(type_name, "unterminated JSON string")),
        }
    }
}

pub(crate) fn write_xml_bytes(bytes: &[u8], out: &mut WriteBuffer) {
    let mut start = 0;
    for (index, b) in bytes.iter().enumerate() {
        let escaped: &[u8] = match b {
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'&' => b"&amp;",
            _ => continue,
        };
        out.write(&bytes[start..index]);
        out.write(escaped);
        start = index + 1;
    }
    out.write(&bytes[start..]);
}

pub(crate) fn expect_byte(
    input: &mut ReadBuffer<'_>,
    expected: u8,
    type_name: &str,
) -> Result<(), TypeError> {
    if input.check_byte(expected) {
        Ok(())
    } else {
        let found = match input.peek() {
            Some(b) => format!("'{}'", b.escape_ascii()),
            None => "end of stream".to_string(),
        };
        Err(TypeError::cannot_parse(
            type_name,
            format!("expected '{}' but found {}", expected as char, found),
        ))
    }
}

/// Consume the longest run of bytes which can be part of a number literal (digits, sign,
/// decimal point, exponent, and the letters of `inf`/`nan`).
pub(crate) fn read_number_token<'a>(input: &'a mut ReadBuffer<'_>) -> &'a str {
    let len = input
        .peek_slice()
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        .count();
    // the token is pure ASCII
    input
        .read_bytes(len)
        .map(|bytes| std::str::from_utf8(bytes).unwrap_or_default())
        .unwrap_or_default()
}

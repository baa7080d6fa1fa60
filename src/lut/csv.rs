//! Minimal comma-separated reader for the lookup tables
//!
//! Handles double-quoted fields (with `""` escapes and embedded newlines) and
//! CRLF line endings. Blank lines are skipped.

use std::path::Path;

use crate::error::{Error, Result};

/// One row and the line it started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn field(&self, index: usize) -> Result<&str> {
        self.fields.get(index).map(String::as_str).ok_or_else(|| Error::MalformedRow {
            line: self.line,
            reason: format!("expected at least {} columns, found {}", index + 1, self.fields.len()),
        })
    }

    /// Hexadecimal id column
    pub fn hex_id(&self, index: usize) -> Result<u64> {
        let raw = self.field(index)?;
        parse_hex_id(raw).ok_or_else(|| Error::MalformedRow {
            line: self.line,
            reason: format!("invalid hex id {raw:?}"),
        })
    }

    pub fn int(&self, index: usize) -> Result<i32> {
        let raw = self.field(index)?;
        raw.trim().parse().map_err(|_| Error::MalformedRow {
            line: self.line,
            reason: format!("invalid integer {raw:?}"),
        })
    }
}

/// Parse a hex id, with or without a `0x` prefix
pub fn parse_hex_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut finish = |fields: &mut Vec<String>, field: &mut String, record_line: usize| {
        fields.push(std::mem::take(field));
        if fields.len() == 1 && fields[0].is_empty() {
            fields.clear();
        } else {
            records.push(Record { line: record_line, fields: std::mem::take(fields) });
        }
    };

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            // Quotes only open a quoted field at its start
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish(&mut fields, &mut field, record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::MalformedRow {
            line: record_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !fields.is_empty() || !field.is_empty() {
        finish(&mut fields, &mut field, record_line);
    }

    Ok(records)
}

/// Read and split a whole table. Errors carry the path.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let read = || -> Result<Vec<Record>> {
        let bytes = std::fs::read(path)?;
        parse_records(decode_text(&bytes)?)
    };
    read().map_err(|e| e.in_file(path))
}

/// Invalid UTF-8 is a content error, reported on the line holding the first bad byte
fn decode_text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let line = 1 + bytes[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count();
        Error::MalformedRow { line, reason: "not valid UTF-8".into() }
    })
}

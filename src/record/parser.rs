//! Record Parser
//!
//! Turns one delimited line into a typed row. Bad rows are rejected
//! (`None`), never fatal.

use crate::error::{Result, StoreError};

use super::Record;

/// Field separator for every table file
pub const FIELD_DELIMITER: char = ',';

/// Split a line into raw (untrimmed) fields.
///
/// A single trailing delimiter does not open an empty field, so
/// `"1,bob,"` yields two fields, not three.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() > 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    fields
}

/// Strict integer parse: empty input or trailing garbage rejects
pub fn parse_int(field: &str) -> Option<i32> {
    if field.is_empty() {
        return None;
    }
    field.parse().ok()
}

/// Parse one data line into `R`.
///
/// Returns `None` when the field count differs from the table's arity or a
/// numeric field fails to parse. Fields are trimmed before use.
pub fn parse_line<R: Record>(line: &str) -> Option<R> {
    let fields = split_fields(line);
    if fields.len() != R::TABLE.arity() {
        return None;
    }
    let trimmed: Vec<&str> = fields.iter().map(|f| f.trim()).collect();
    R::from_fields(&trimmed)
}

/// Rebuild `line` with field `index` replaced by `value`.
///
/// Other fields are copied byte for byte, including their whitespace.
pub fn replace_field(line: &str, index: usize, value: &str) -> String {
    let mut fields = split_fields(line);
    if let Some(slot) = fields.get_mut(index) {
        *slot = value;
    }
    fields.join(&FIELD_DELIMITER.to_string())
}

/// Reject values that would not read back unchanged
pub fn validate_field(field: &'static str, value: &str) -> Result<()> {
    let reason = if value.contains(FIELD_DELIMITER) {
        "contains the field delimiter"
    } else if value.contains(&['\n', '\r'][..]) {
        "contains a line break"
    } else if value.trim() != value {
        "has leading or trailing whitespace"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidField {
        field,
        value: value.to_string(),
        reason,
    })
}

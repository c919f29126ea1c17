//! Line codec for the tab-separated record format.

use std::num::ParseIntError;
use std::str::Utf8Error;

use crate::{Candidate, Count, Record};

pub const FIELD_SEPARATOR: char = '\t';

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 2 tab-separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid count {value:?}: {source}")]
    InvalidCount {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] Utf8Error),
}

/// Parse one `<entity-name>\t<count>` line.
///
/// A trailing `\r` is tolerated so CRLF files read the same as LF files. The
/// name is taken verbatim; the count must be a base-10 `i64` with no padding.
pub fn parse_line(line: &str) -> Result<Record, RecordError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = line.split(FIELD_SEPARATOR);
    let (Some(name), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(RecordError::FieldCount(line.split(FIELD_SEPARATOR).count()));
    };
    let count: Count = count.parse().map_err(|source| RecordError::InvalidCount {
        value: count.to_string(),
        source,
    })?;
    Ok(Record::new(name, count))
}

/// Parse one raw line as read from disk, without its `\n` terminator.
pub fn parse_line_bytes(bytes: &[u8]) -> Result<Record, RecordError> {
    let line = std::str::from_utf8(bytes).map_err(RecordError::InvalidUtf8)?;
    parse_line(line)
}

/// Parse one final output line, `<count>\t<entity-name>`.
pub fn parse_ranked_line(line: &str) -> Result<Candidate, RecordError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some((count, name)) = line.split_once(FIELD_SEPARATOR) else {
        return Err(RecordError::FieldCount(1));
    };
    let count: Count = count.parse().map_err(|source| RecordError::InvalidCount {
        value: count.to_string(),
        source,
    })?;
    Ok(Candidate::new(count, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_count() {
        assert_eq!(parse_line("The Matrix\t42").unwrap(), Record::new("The Matrix", 42));
        assert_eq!(parse_line("Up\t-3\r").unwrap(), Record::new("Up", -3));
        assert_eq!(parse_line("\t0").unwrap(), Record::new("", 0));
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(parse_line(""), Err(RecordError::FieldCount(1)));
        assert_eq!(parse_line("Alien 7"), Err(RecordError::FieldCount(1)));
        assert_eq!(parse_line("Alien\t7\textra"), Err(RecordError::FieldCount(3)));
    }

    #[test]
    fn rejects_non_numeric_count() {
        for bad in ["Alien\tseven", "Alien\t", "Alien\t 7", "Alien\t99999999999999999999"] {
            match parse_line(bad) {
                Err(RecordError::InvalidCount { .. }) => {}
                other => panic!("{bad:?} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn raw_bytes_must_be_utf8() {
        assert_eq!(parse_line_bytes(b"Amelie\t5\r").unwrap(), Record::new("Amelie", 5));
        assert!(matches!(
            parse_line_bytes(b"\xff\xfe\t2"),
            Err(RecordError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn ranked_lines_read_back() {
        let candidate = parse_ranked_line("7\tThe Third Man").unwrap();
        assert_eq!(candidate, Candidate::new(7, "The Third Man"));
        assert_eq!(parse_ranked_line(&candidate.to_string()).unwrap(), candidate);
        assert_eq!(parse_ranked_line("7"), Err(RecordError::FieldCount(1)));
    }

    #[test]
    fn display_forms_match_wire_formats() {
        let record = Record::new("Heat", 12);
        assert_eq!(record.to_string(), "Heat\t12");
        assert_eq!(Candidate::from(record).to_string(), "12\tHeat");
    }
}

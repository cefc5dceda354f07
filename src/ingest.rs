//! Purpose: Turn textual row exports into JSON objects ready for `DatabaseBuilder::append_values`.
//! Exports: `read_json_rows`.
//! Role: Thin boundary to external tabular sources; accepts JSON lines or one top-level array.
//! Invariants: Every error names the 1-based input line it came from.
//! Invariants: Rows are returned in input order; blank lines are skipped.
use std::io::{BufReader, Read};

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

/// Reads one JSON object per non-blank line, or a single JSON array of objects.
pub fn read_json_rows<R: Read>(reader: R) -> Result<Vec<Value>, Error> {
    let mut text = String::new();
    BufReader::new(reader)
        .read_to_string(&mut text)
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read rows")
                .with_source(err)
        })?;

    if text.trim_start().starts_with('[') {
        read_array(&text)
    } else {
        read_lines(&text)
    }
}

fn read_array(text: &str) -> Result<Vec<Value>, Error> {
    let rows: Vec<Value> = serde_json::from_str(text).map_err(|err| {
        let line = err.line();
        parse_error(line, err)
    })?;
    for (index, row) in rows.iter().enumerate() {
        if !row.is_object() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("array element {index} is not an object")));
        }
    }
    Ok(rows)
}

fn read_lines(text: &str) -> Result<Vec<Value>, Error> {
    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let row: Value = serde_json::from_str(trimmed).map_err(|err| parse_error(line_no, err))?;
        if !row.is_object() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("line {line_no}: row is not a JSON object"))
                .with_hint("Emit one JSON object per line."));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn parse_error(line: usize, err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Codec)
        .with_message(format!("line {line}: invalid JSON"))
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::read_json_rows;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn json_lines_skip_blanks() {
        let input = "{\"id\": 1}\n\n  {\"id\": 2, \"name\": \"b\"}\n";
        let rows = read_json_rows(input.as_bytes()).expect("rows");
        assert_eq!(rows, vec![json!({"id": 1}), json!({"id": 2, "name": "b"})]);
    }

    #[test]
    fn top_level_array_is_accepted() {
        let input = "\n [ {\"id\": 1},\n {\"id\": 2} ]";
        let rows = read_json_rows(input.as_bytes()).expect("rows");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn errors_name_the_line() {
        let input = "{\"id\": 1}\n{\"id\": \n";
        let err = read_json_rows(input.as_bytes()).expect_err("bad json");
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(err.message(), Some("line 2: invalid JSON"));

        let err = read_json_rows("{\"id\": 1}\n42\n".as_bytes()).expect_err("scalar row");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.message(), Some("line 2: row is not a JSON object"));

        let err = read_json_rows("[{\"id\": 1},\n oops]".as_bytes()).expect_err("bad array");
        assert_eq!(err.message(), Some("line 2: invalid JSON"));
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(read_json_rows("".as_bytes()).expect("empty").is_empty());
        assert!(read_json_rows("\n\n".as_bytes()).expect("blank").is_empty());
    }
}

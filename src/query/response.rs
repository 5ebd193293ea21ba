//! Response formatting
//!
//! Serializes a `ResultSet` as CSV, JSON or a Python list literal and
//! optionally frames it with the fixed16 header:
//!
//! ```text
//! 200          42\n      status (3 wide), space, payload bytes (11 wide)
//! name;state\n           header row (rules differ per format)
//! web01;0\n
//! ```

use super::ast::{HeaderMode, OutputFormat, Query, ResponseHeader, Separators};
use super::error::QueryError;
use super::executor::ResultSet;
use crate::model::Value;

/// Format rows according to the query's output options (without framing)
pub fn format_result(result: &ResultSet, query: &Query) -> String {
    match query.output_format {
        OutputFormat::Csv => format_csv(result, query.column_headers, &query.separators),
        OutputFormat::Json => format_json(result, query.column_headers),
        OutputFormat::Python => format_python(result, query.column_headers),
    }
}

/// Prefix `body` with the 16-byte status/length header when requested
pub fn frame(status: u16, body: String, header: ResponseHeader) -> String {
    match header {
        ResponseHeader::Off => body,
        ResponseHeader::Fixed16 => format!("{:3} {:11}\n{}", status, body.len(), body),
    }
}

/// Error payload, framed like any other response
pub fn format_error(error: &QueryError, header: ResponseHeader) -> String {
    frame(error.status_code(), format!("{}\n", error), header)
}

fn csv_header_wanted(result: &ResultSet, mode: HeaderMode) -> bool {
    if result.rows.is_empty() {
        mode == HeaderMode::On || !result.columns_requested
    } else {
        mode == HeaderMode::On
    }
}

fn csv_cell(value: &Value, separators: &Separators) -> String {
    match value {
        Value::Bool(b) => i64::from(*b).to_string(),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::List(parts) => parts
                    .iter()
                    .map(|p| csv_cell(p, separators))
                    .collect::<Vec<_>>()
                    .join(&separators.pipe),
                other => csv_cell(other, separators),
            })
            .collect::<Vec<_>>()
            .join(&separators.list),
        other => other.to_string(),
    }
}

fn format_csv(result: &ResultSet, mode: HeaderMode, separators: &Separators) -> String {
    let mut out = String::new();
    if csv_header_wanted(result, mode) {
        out.push_str(&result.headers.join(&separators.field));
        out.push_str(&separators.line);
    }
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| csv_cell(v, separators)).collect();
        out.push_str(&cells.join(&separators.field));
        out.push_str(&separators.line);
    }
    out
}

fn json_cell(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(b) => serde_json::Value::from(i64::from(*b)),
        Value::Str(s) => serde_json::Value::from(s.as_str()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(json_cell).collect()),
    }
}

/// `[row,\nrow]\n` layout shared by JSON and Python output
fn list_literal(rows: Vec<String>) -> String {
    format!("[{}]\n", rows.join(",\n"))
}

fn format_json(result: &ResultSet, mode: HeaderMode) -> String {
    let mut rows = Vec::with_capacity(result.rows.len() + 1);
    if mode == HeaderMode::On {
        rows.push(serde_json::Value::from(result.headers.clone()).to_string());
    }
    for row in &result.rows {
        rows.push(serde_json::Value::Array(row.iter().map(json_cell).collect()).to_string());
    }
    list_literal(rows)
}

fn python_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn python_cell(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => format!("{:?}", f),
        Value::Float(_) => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Str(s) => python_str(s),
        Value::List(items) => format!(
            "[{}]",
            items.iter().map(python_cell).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn format_python(result: &ResultSet, mode: HeaderMode) -> String {
    let mut rows = Vec::with_capacity(result.rows.len() + 1);
    if mode == HeaderMode::On {
        let headers: Vec<String> = result.headers.iter().map(|h| python_str(h)).collect();
        rows.push(format!("[{}]", headers.join(", ")));
    }
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(python_cell).collect();
        rows.push(format!("[{}]", cells.join(", ")));
    }
    list_literal(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rows: Vec<Vec<Value>>, columns_requested: bool) -> ResultSet {
        ResultSet {
            headers: vec!["name".into(), "up".into(), "groups".into()],
            rows,
            columns_requested,
        }
    }

    fn row() -> Vec<Value> {
        vec![
            Value::from("web01"),
            Value::Bool(true),
            Value::List(vec![Value::from("a"), Value::from("b")]),
        ]
    }

    #[test]
    fn test_csv_rows_and_lists() {
        let out = format_csv(&result(vec![row()], true), HeaderMode::Off, &Separators::default());
        assert_eq!(out, "web01;1;a,b\n");

        let on = format_csv(&result(vec![row()], true), HeaderMode::On, &Separators::default());
        assert_eq!(on, "name;up;groups\nweb01;1;a,b\n");
    }

    #[test]
    fn test_csv_nested_lists_use_pipe() {
        let nested = Value::List(vec![
            Value::List(vec![Value::from("http"), Value::Int(0), Value::Bool(true)]),
            Value::List(vec![Value::from("ssh"), Value::Int(2), Value::Bool(false)]),
        ]);
        assert_eq!(csv_cell(&nested, &Separators::default()), "http|0|1,ssh|2|0");
    }

    #[test]
    fn test_csv_empty_header_rules() {
        let seps = Separators::default();
        assert_eq!(format_csv(&result(vec![], true), HeaderMode::Off, &seps), "");
        assert_eq!(format_csv(&result(vec![], false), HeaderMode::Off, &seps), "name;up;groups\n");
        assert_eq!(format_csv(&result(vec![], true), HeaderMode::On, &seps), "name;up;groups\n");
    }

    #[test]
    fn test_custom_separators() {
        let seps = Separators::from_codes("10 9 124 43").unwrap();
        let out = format_csv(&result(vec![row()], true), HeaderMode::Off, &seps);
        assert_eq!(out, "web01\t1\ta|b\n");
    }

    #[test]
    fn test_json() {
        let out = format_json(&result(vec![row(), row()], true), HeaderMode::Off);
        assert_eq!(out, "[[\"web01\",1,[\"a\",\"b\"]],\n[\"web01\",1,[\"a\",\"b\"]]]\n");

        let headers = format_json(&result(vec![], false), HeaderMode::On);
        assert_eq!(headers, "[[\"name\",\"up\",\"groups\"]]\n");

        let empty = format_json(&result(vec![], false), HeaderMode::Off);
        assert_eq!(empty, "[]\n");
    }

    #[test]
    fn test_python() {
        let mut r = row();
        r.push(Value::Float(2.0));
        r.push(Value::from("it's"));
        let out = format_python(&result(vec![r], true), HeaderMode::Off);
        assert_eq!(out, "[['web01', True, ['a', 'b'], 2.0, 'it\\'s']]\n");
    }

    #[test]
    fn test_fixed16_frame() {
        let framed = frame(200, "abc\n".to_string(), ResponseHeader::Fixed16);
        assert_eq!(framed, "200           4\nabc\n");
        assert_eq!(framed.find('\n'), Some(15));

        let error = format_error(&QueryError::UnknownTable("x".into()), ResponseHeader::Fixed16);
        assert!(error.starts_with("404 "));
        assert_eq!(frame(200, "x".into(), ResponseHeader::Off), "x");
    }
}

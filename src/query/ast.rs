//! Parsed LQL query
//!
//! A `Query` is built fresh for every request by the parser and dropped
//! after one response cycle.
//!
//! ```text
//! GET services                 -> table
//! Columns: host_name state     -> columns + aliases, headers off
//! Filter: state = 2            -> filter stack
//! Stats: state = 2             -> stats stack, is_stats_query
//! OutputFormat: json           -> output_format
//! ResponseHeader: fixed16      -> response_header
//! ```

use super::filter::{FilterNode, FilterStack, Leaf, StatsEntry};
use crate::logstore::LogFilter;
use crate::model::Item;
use crate::schema::{Column, Registry, Table};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payload encoding of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    /// Python list literal
    Python,
}

impl OutputFormat {
    /// Parse an `OutputFormat:` value; `python3` is accepted as `python`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "python" | "python3" => Some(OutputFormat::Python),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Python => write!(f, "python"),
        }
    }
}

/// Framing of the response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseHeader {
    #[default]
    Off,
    /// `"%3d %11d\n"` status and payload length
    Fixed16,
}

/// Column header row mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    #[default]
    On,
    Off,
}

/// Line, field, list-element and pipe separators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separators {
    pub line: String,
    pub field: String,
    pub list: String,
    pub pipe: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            line: "\n".to_string(),
            field: ";".to_string(),
            list: ",".to_string(),
            pipe: "|".to_string(),
        }
    }
}

impl Separators {
    /// Parse `Separators:` arguments given as ASCII codes, e.g. `10 59 44 124`.
    /// Missing trailing codes keep their defaults.
    pub fn from_codes(args: &str) -> Option<Self> {
        let mut separators = Separators::default();
        let slots = [
            &mut separators.line,
            &mut separators.field,
            &mut separators.list,
            &mut separators.pipe,
        ];
        let codes: Vec<&str> = args.split_whitespace().collect();
        if codes.len() > slots.len() {
            return None;
        }
        for (slot, code) in slots.into_iter().zip(codes) {
            let byte: u8 = code.parse().ok()?;
            *slot = char::from(byte).to_string();
        }
        Some(separators)
    }
}

/// A compiled LQL query
#[derive(Debug, Clone)]
pub struct Query {
    pub table: Table,
    /// Requested columns in request order; duplicates allowed
    pub columns: Vec<Arc<Column>>,
    /// Names as sent by the client, parallel to `columns`
    pub aliases: Vec<String>,
    pub filter: FilterStack<FilterNode>,
    pub stats: FilterStack<StatsEntry>,
    pub is_stats_query: bool,
    pub limit: Option<usize>,
    pub output_format: OutputFormat,
    pub response_header: ResponseHeader,
    pub column_headers: HeaderMode,
    pub separators: Separators,
    /// Contact whose view the result is restricted to
    pub auth_user: Option<String>,
    /// `contacts >= <auth_user>`, kept off the stack so later reductions
    /// cannot combine or negate it
    pub auth_filter: Option<Leaf>,
    /// Client local time (Unix seconds)
    pub localtime: i64,
    pub keep_alive: bool,
    /// Push-down filter for the log store, maintained for `GET log`
    pub log_filter: LogFilter,
}

impl Query {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            aliases: Vec::new(),
            filter: FilterStack::new(),
            stats: FilterStack::new(),
            is_stats_query: false,
            limit: None,
            output_format: OutputFormat::default(),
            response_header: ResponseHeader::default(),
            column_headers: HeaderMode::default(),
            separators: Separators::default(),
            auth_user: None,
            auth_filter: None,
            localtime: chrono::Utc::now().timestamp(),
            keep_alive: false,
            log_filter: LogFilter::new(),
        }
    }

    /// Authorization and primary filter together
    pub fn matches(&self, item: &Item) -> bool {
        self.auth_filter.as_ref().map_or(true, |leaf| leaf.matches(item)) && self.filter.matches(item)
    }

    /// Whether a `Columns:` line selected columns explicitly
    pub fn has_requested_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Columns to output: the requested ones, or every schema column in
    /// declaration order
    pub fn output_columns(&self) -> Vec<Arc<Column>> {
        if self.has_requested_columns() {
            self.columns.clone()
        } else {
            Registry::global().schema(self.table).columns().to_vec()
        }
    }

    /// Header names matching `output_columns`
    pub fn header_names(&self) -> Vec<String> {
        if self.is_stats_query {
            return (1..=self.stats.len()).map(|i| format!("stats_{}", i)).collect();
        }
        if self.has_requested_columns() {
            self.aliases.clone()
        } else {
            self.output_columns().iter().map(|c| c.name.clone()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("python3"), Some(OutputFormat::Python));
        assert_eq!(OutputFormat::parse("CSV"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn test_separators_from_codes() {
        let seps = Separators::from_codes("10 9 44 124").unwrap();
        assert_eq!(seps.field, "\t");
        assert_eq!(seps.line, "\n");

        let partial = Separators::from_codes("13").unwrap();
        assert_eq!(partial.line, "\r");
        assert_eq!(partial.field, ";");

        assert!(Separators::from_codes("10 x").is_none());
        assert!(Separators::from_codes("1 2 3 4 5").is_none());
    }

    #[test]
    fn test_default_output_columns_cover_schema() {
        let query = Query::new(Table::Contacts);
        let names = query.header_names();
        assert_eq!(names.first().map(String::as_str), Some("name"));
        assert_eq!(names.len(), Registry::global().schema(Table::Contacts).len());
    }
}

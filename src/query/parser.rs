//! LQL request parser
//!
//! Turns the query lines of a request into a `Query`. Each line starts with
//! a keyword followed by a colon or a space:
//!
//! ```text
//! GET hosts
//! Columns: name state
//! Filter: state >= 1
//! Filter: groups >= linux
//! And: 2
//! Stats: sum latency
//! OutputFormat: json
//! ```
//!
//! `Filter:`/`Stats:` lines that fail to parse abort the whole request;
//! unrecognized keywords are logged and skipped.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{multispace0, multispace1},
    combinator::{eof, map_opt, peek, rest},
    sequence::terminated,
    IResult,
};

use super::ast::*;
use super::error::{QueryError, QueryResult};
use super::filter::{AggregateFunc, FilterNode, Leaf, Operator, StatsEntry};
use crate::schema::{Column, Registry, Table};
use std::sync::Arc;

/// Parse query lines with default settings
pub fn parse_query(input: &str) -> QueryResult<Query> {
    QueryParser::new().parse(input)
}

/// Configurable request parser
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    default_format: OutputFormat,
    debug: bool,
}

impl QueryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: format used when `OutputFormat:` is absent or invalid
    pub fn default_format(mut self, format: OutputFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Builder method: log every parsed line
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parse a whole request into a `Query`
    pub fn parse(&self, input: &str) -> QueryResult<Query> {
        let lines: Vec<&str> = input
            .lines()
            .map(str::trim)
            .take_while(|l| !l.is_empty())
            .collect();

        let table = lines
            .iter()
            .map(|l| split_keyword(l))
            .find(|(keyword, _)| *keyword == "GET")
            .map(|(_, args)| args)
            .ok_or_else(|| QueryError::BadRequest("request has no GET line".to_string()))?;
        let table = Table::from_name(table.trim())
            .ok_or_else(|| QueryError::UnknownTable(table.trim().to_string()))?;

        let mut query = Query::new(table);
        query.output_format = self.default_format;
        let mut seen_get = false;
        // An explicit ColumnHeaders line wins wherever it appears
        let mut explicit_headers = false;

        for line in lines {
            if self.debug {
                tracing::debug!(line, "LQL line");
            }
            let (keyword, args) = split_keyword(line);
            match keyword {
                "GET" => {
                    if seen_get {
                        tracing::warn!(line, "Ignoring additional GET line");
                    }
                    seen_get = true;
                }
                "Columns" => {
                    self.columns(&mut query, args)?;
                    if !explicit_headers {
                        query.column_headers = HeaderMode::Off;
                    }
                }
                "Filter" => {
                    let leaf = parse_leaf(table, args)?;
                    if table == Table::Log {
                        query.log_filter.add_filter(&leaf);
                    }
                    query.filter.push(FilterNode::Leaf(leaf));
                }
                "And" => {
                    let n = parse_count(keyword, args)?;
                    query.filter.and(n)?;
                    query.log_filter.add_and(n);
                }
                "Or" => {
                    let n = parse_count(keyword, args)?;
                    query.filter.or(n)?;
                    query.log_filter.add_or(n);
                }
                "Negate" => {
                    let n = parse_optional_count(keyword, args)?;
                    query.filter.negate(n)?;
                    query.log_filter.add_not(n);
                }
                "Stats" => {
                    query.is_stats_query = true;
                    if !explicit_headers {
                        query.column_headers = HeaderMode::Off;
                    }
                    query.stats.push(parse_stats(table, args)?);
                }
                "StatsAnd" => query.stats.and(parse_count(keyword, args)?)?,
                "StatsOr" => query.stats.or(parse_count(keyword, args)?)?,
                "StatsNegate" => query.stats.negate(parse_optional_count(keyword, args)?)?,
                "ResponseHeader" => match args {
                    "fixed16" => query.response_header = ResponseHeader::Fixed16,
                    "off" => query.response_header = ResponseHeader::Off,
                    other => tracing::warn!(value = other, "Unsupported ResponseHeader"),
                },
                "OutputFormat" => match OutputFormat::parse(args) {
                    Some(format) => query.output_format = format,
                    None => {
                        tracing::warn!(value = args, default = %self.default_format, "Unknown OutputFormat, using default");
                        query.output_format = self.default_format;
                    }
                },
                "KeepAlive" => query.keep_alive = args == "on",
                "ColumnHeaders" => match args {
                    "on" | "off" => {
                        explicit_headers = true;
                        query.column_headers = if args == "on" {
                            HeaderMode::On
                        } else {
                            HeaderMode::Off
                        };
                    }
                    other => tracing::warn!(value = other, "Unsupported ColumnHeaders"),
                },
                "Limit" => match args.parse::<usize>() {
                    Ok(limit) => query.limit = Some(limit),
                    Err(_) => tracing::warn!(value = args, "Ignoring invalid Limit"),
                },
                "Localtime" => match args.parse::<i64>() {
                    Ok(time) => query.localtime = time,
                    Err(_) => tracing::warn!(value = args, "Ignoring invalid Localtime"),
                },
                "Separators" => match Separators::from_codes(args) {
                    Some(separators) => query.separators = separators,
                    None => tracing::warn!(value = args, "Ignoring invalid Separators"),
                },
                "AuthUser" => self.auth_user(&mut query, args)?,
                _ => tracing::warn!(line, "Unrecognized LQL keyword, ignoring line"),
            }
        }

        Ok(query)
    }

    fn columns(&self, query: &mut Query, args: &str) -> QueryResult<()> {
        for name in args.split_whitespace() {
            query.columns.push(resolve(query.table, name)?);
            query.aliases.push(name.to_string());
        }
        Ok(())
    }

    fn auth_user(&self, query: &mut Query, user: &str) -> QueryResult<()> {
        if !query.table.is_host_or_service_shaped() {
            tracing::debug!(table = %query.table, "AuthUser ignored for this table");
            return Ok(());
        }
        let contacts = resolve(query.table, "contacts")?;
        query.auth_filter = Some(Leaf::new(contacts, Operator::Ge, user)?);
        query.auth_user = Some(user.to_string());
        Ok(())
    }
}

/// Split `Keyword: args` (also `Keyword:args` and `Keyword args`)
pub fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(|c: char| c == ':' || c == ' ') {
        Some(at) => {
            let args = &line[at..];
            let args = args.strip_prefix(':').unwrap_or(args);
            (&line[..at], args.trim())
        }
        None => (line, ""),
    }
}

fn resolve(table: Table, name: &str) -> QueryResult<Arc<Column>> {
    Registry::global()
        .column(table, name)
        .cloned()
        .ok_or_else(|| QueryError::unknown_column(table, name))
}

fn parse_count(keyword: &str, args: &str) -> QueryResult<usize> {
    args.trim().parse().map_err(|_| {
        QueryError::MalformedFilter(format!("{}: expected a count, got '{}'", keyword, args))
    })
}

fn parse_optional_count(keyword: &str, args: &str) -> QueryResult<Option<usize>> {
    if args.trim().is_empty() {
        Ok(None)
    } else {
        parse_count(keyword, args).map(Some)
    }
}

/// Recognize an operator token; longer tokens are tried first
fn operator(input: &str) -> IResult<&str, Operator> {
    map_opt(
        terminated(
            alt((
                tag("!=~"),
                tag("!~~"),
                tag("!>="),
                tag("!<="),
                tag("!="),
                tag("!~"),
                tag("!>"),
                tag("!<"),
                tag("=~"),
                tag("~~"),
                tag(">="),
                tag("<="),
                tag("="),
                tag("~"),
                tag(">"),
                tag("<"),
            )),
            peek(alt((multispace1, eof))),
        ),
        Operator::parse,
    )(input)
}

/// `attribute operator [reference]`
fn filter_expression(input: &str) -> IResult<&str, (&str, Operator, &str)> {
    let (input, _) = multispace0(input)?;
    let (input, attribute) = take_while1(|c: char| !c.is_whitespace())(input)?;
    let (input, _) = multispace1(input)?;
    let (input, op) = operator(input)?;
    let (input, _) = multispace0(input)?;
    let (input, reference) = rest(input)?;
    Ok((input, (attribute, op, reference.trim_end())))
}

/// Parse the arguments of a `Filter:` line into a leaf
pub fn parse_leaf(table: Table, args: &str) -> QueryResult<Leaf> {
    let (_, (attribute, op, reference)) = filter_expression(args)
        .map_err(|_| QueryError::MalformedFilter(format!("cannot parse filter '{}'", args)))?;
    Leaf::new(resolve(table, attribute)?, op, reference)
}

/// Parse the arguments of a `Stats:` line
fn parse_stats(table: Table, args: &str) -> QueryResult<StatsEntry> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if let [func, column] = tokens.as_slice() {
        if let Some(func) = AggregateFunc::parse(func) {
            let column = resolve(table, column)?;
            if !matches!(
                column.datatype,
                crate::schema::Datatype::Int | crate::schema::Datatype::Float | crate::schema::Datatype::Bool
            ) {
                return Err(QueryError::MalformedFilter(format!(
                    "cannot aggregate non-numeric column '{}'",
                    column.name
                )));
            }
            return Ok(StatsEntry::Aggregate { func, column });
        }
    }
    Ok(StatsEntry::Predicate(FilterNode::Leaf(parse_leaf(table, args)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Host, Item};

    #[test]
    fn test_split_keyword_variants() {
        assert_eq!(split_keyword("GET hosts"), ("GET", "hosts"));
        assert_eq!(split_keyword("Filter: name = x"), ("Filter", "name = x"));
        assert_eq!(split_keyword("And:2"), ("And", "2"));
        assert_eq!(split_keyword("Negate:"), ("Negate", ""));
        assert_eq!(split_keyword("Filter: output ~ a:b"), ("Filter", "output ~ a:b"));
    }

    #[test]
    fn test_basic_query() {
        let query = parse_query("GET hosts\nColumns: name alias\nFilter: name = test_host_001\n").unwrap();
        assert_eq!(query.table, Table::Hosts);
        assert_eq!(query.aliases, vec!["name", "alias"]);
        assert_eq!(query.column_headers, HeaderMode::Off);
        assert_eq!(query.filter.len(), 1);
    }

    #[test]
    fn test_table_prefix_is_stripped() {
        let query = parse_query("GET services\nColumns: service_state host_name\n").unwrap();
        assert_eq!(query.columns[0].name, "state");
        assert_eq!(query.columns[1].name, "host_name");
        assert_eq!(query.aliases[0], "service_state");
    }

    #[test]
    fn test_errors_carry_status_codes() {
        let code = |q: &str| parse_query(q).unwrap_err().status_code();
        assert_eq!(code("GET nosuch\n"), 404);
        assert_eq!(code("GET hosts\nColumns: name bogus\n"), 450);
        assert_eq!(code("GET hosts\nFilter: name\n"), 452);
        assert_eq!(code("GET hosts\nFilter: name == x\n"), 452);
        assert_eq!(code("GET hosts\nFilter: state = up\n"), 452);
        assert_eq!(code("GET hosts\nAnd: 2\n"), 452);
        assert_eq!(code("GET hosts\nAnd: x\n"), 452);
        assert_eq!(code("Columns: name\n"), 400);
    }

    #[test]
    fn test_empty_reference_allowed() {
        let query = parse_query("GET hosts\nFilter: parents =\n").unwrap();
        let item = Item::Host(Arc::new(Host::new("root")));
        assert!(query.matches(&item));
    }

    #[test]
    fn test_options() {
        let query = parse_query(
            "GET hosts\nOutputFormat: python3\nResponseHeader: fixed16\nKeepAlive: on\nLimit: 5\nLocaltime: 1234\nSeparators: 10 9 44 124\nColumnHeaders: on\n",
        )
        .unwrap();
        assert_eq!(query.output_format, OutputFormat::Python);
        assert_eq!(query.response_header, ResponseHeader::Fixed16);
        assert!(query.keep_alive);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.localtime, 1234);
        assert_eq!(query.separators.field, "\t");
        assert_eq!(query.column_headers, HeaderMode::On);
    }

    #[test]
    fn test_explicit_column_headers_win_in_any_position() {
        let before = parse_query("GET hosts\nColumnHeaders: on\nStats: state = 0\nColumns: name\n").unwrap();
        assert_eq!(before.column_headers, HeaderMode::On);
        let after = parse_query("GET hosts\nStats: state = 0\nColumnHeaders: on\n").unwrap();
        assert_eq!(after.column_headers, HeaderMode::On);
        let implicit = parse_query("GET hosts\nStats: state = 0\n").unwrap();
        assert_eq!(implicit.column_headers, HeaderMode::Off);
    }

    #[test]
    fn test_unknown_format_falls_back() {
        let query = QueryParser::new()
            .default_format(OutputFormat::Json)
            .parse("GET hosts\nOutputFormat: xml\n")
            .unwrap();
        assert_eq!(query.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_unrecognized_keyword_is_skipped() {
        let query = parse_query("GET hosts\nStatsGroupBy: state\nFilter: state = 0\n").unwrap();
        assert_eq!(query.filter.len(), 1);
    }

    #[test]
    fn test_stats_lines() {
        let query = parse_query(
            "GET services\nStats: state = 1\nStats: state = 2\nStatsOr: 2\nStats: avg latency\n",
        )
        .unwrap();
        assert!(query.is_stats_query);
        assert_eq!(query.stats.len(), 2);
        assert!(matches!(query.stats.entries()[1], StatsEntry::Aggregate { func: AggregateFunc::Avg, .. }));

        let err = parse_query("GET services\nStats: avg latency\nStatsNegate: 1\n").unwrap_err();
        assert_eq!(err.status_code(), 452);
    }

    #[test]
    fn test_auth_user() {
        let query = parse_query("GET hosts\nAuthUser: alice\n").unwrap();
        assert_eq!(query.auth_user.as_deref(), Some("alice"));
        assert!(query.auth_filter.is_some());
        assert_eq!(query.filter.len(), 0);

        let groups = parse_query("GET hostgroups\nAuthUser: alice\n").unwrap();
        assert!(groups.auth_user.is_none());
    }

    #[test]
    fn test_log_filter_follows_primary_stack() {
        let query = parse_query("GET log\nFilter: time >= 100\nFilter: class = 1\nOr: 2\n").unwrap();
        let (sql, params) = query.log_filter.where_clause().unwrap();
        assert_eq!(sql, "((\"time\" >= ?) OR (\"class\" = ?))");
        assert_eq!(params.len(), 2);
    }
}

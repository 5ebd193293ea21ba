//! Wait queries
//!
//! A request may carry `Wait*` lines next to its query. They describe an
//! object and a condition; the caller re-checks `condition_fulfilled`
//! until it holds or the timeout expires, then answers the query.
//!
//! ```text
//! WaitObject: web01;http        -> host_name = web01 AND description = http
//! WaitCondition: state = 0      -> condition stack
//! WaitTrigger: check            -> informational
//! WaitTimeout: 10000            -> milliseconds
//! ```

use super::ast::Query;
use super::error::{QueryError, QueryResult};
use super::executor::Executor;
use super::filter::{FilterNode, FilterStack, Leaf, Operator};
use super::parser::{parse_leaf, split_keyword};
use crate::schema::{Registry, Table};
use std::time::Duration;

/// Object-targeted condition check
#[derive(Debug, Clone)]
pub struct WaitQuery {
    pub table: Table,
    /// Leaves selecting the `WaitObject`
    pub target: FilterStack<FilterNode>,
    pub condition: FilterStack<FilterNode>,
    pub trigger: Option<String>,
    pub timeout: Duration,
}

impl WaitQuery {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            target: FilterStack::new(),
            condition: FilterStack::new(),
            trigger: None,
            timeout: Duration::ZERO,
        }
    }

    /// Parse `Wait*` lines for the table of the accompanying query
    pub fn parse(table: Table, lines: &[String]) -> QueryResult<Self> {
        let mut wait = WaitQuery::new(table);
        for line in lines {
            let (keyword, args) = split_keyword(line.trim());
            match keyword {
                "WaitObject" => wait.set_object(args)?,
                "WaitCondition" => wait.condition.push(FilterNode::Leaf(parse_leaf(table, args)?)),
                "WaitConditionAnd" => wait.condition.and(count(args)?)?,
                "WaitConditionOr" => wait.condition.or(count(args)?)?,
                "WaitConditionNegate" => {
                    let n = if args.is_empty() { None } else { Some(count(args)?) };
                    wait.condition.negate(n)?
                }
                "WaitTrigger" => wait.trigger = Some(args.to_string()),
                "WaitTimeout" => match args.parse::<u64>() {
                    Ok(ms) => wait.timeout = Duration::from_millis(ms),
                    Err(_) => tracing::warn!(value = args, "Ignoring invalid WaitTimeout"),
                },
                _ => tracing::warn!(line = line.as_str(), "Unrecognized wait keyword, ignoring line"),
            }
        }
        Ok(wait)
    }

    fn set_object(&mut self, id: &str) -> QueryResult<()> {
        let targets: Vec<(&str, &str)> = if self.table.is_service_shaped() {
            let (host, service) = id
                .split_once(';')
                .or_else(|| id.split_once(' '))
                .ok_or_else(|| {
                    QueryError::MalformedFilter(format!("WaitObject '{}' is not host;service", id))
                })?;
            vec![("host_name", host), ("description", service)]
        } else {
            vec![("name", id)]
        };

        for (column, value) in targets {
            let column = Registry::global()
                .column(self.table, column)
                .cloned()
                .ok_or_else(|| QueryError::unknown_column(self.table, column))?;
            self.target
                .push(FilterNode::Leaf(Leaf::new(column, Operator::Eq, value.trim())?));
        }
        Ok(())
    }

    /// Timeout in seconds
    pub fn timeout_secs(&self) -> f64 {
        self.timeout.as_secs_f64()
    }

    /// Query selecting the target object when the condition holds
    pub fn probe(&self) -> Query {
        let mut query = Query::new(self.table);
        for entry in self.target.entries().iter().chain(self.condition.entries()) {
            query.filter.push(entry.clone());
        }
        query
    }

    /// Run the probe once; true when at least one item matches
    pub fn condition_fulfilled(&self, executor: &Executor<'_>) -> QueryResult<bool> {
        let probe = self.probe();
        let fulfilled = executor.items(&probe)?.next().is_some();
        tracing::debug!(table = %self.table, fulfilled, "Wait condition checked");
        Ok(fulfilled)
    }
}

fn count(args: &str) -> QueryResult<usize> {
    args.trim()
        .parse()
        .map_err(|_| QueryError::MalformedFilter(format!("expected a count, got '{}'", args)))
}

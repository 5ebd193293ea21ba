//! SQL push-down filter for the log store
//!
//! Mirrors the primary filter stack while a `GET log` request is parsed.
//! Each entry is a SQL fragment with bound parameters, or `None` when the
//! predicate cannot be expressed (regexes), which means "unconstrained".
//! The resulting `WHERE` clause selects a superset of the matching lines;
//! the engine re-applies the exact filter afterwards.

use crate::query::{Leaf, Operator, Reference};
use rusqlite::types::Value as SqlValue;

/// Columns of the `logs` table that filters may be pushed down to
const PUSHDOWN_FIELDS: &[&str] = &[
    "time",
    "lineno",
    "class",
    "type",
    "options",
    "message",
    "state",
    "state_type",
    "attempt",
    "host_name",
    "service_description",
    "contact_name",
    "plugin_output",
    "command_name",
];

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    sql: String,
    params: Vec<SqlValue>,
    /// False when a sub-predicate was dropped, making this a superset
    exact: bool,
}

/// Accumulated log store filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    stack: Vec<Option<Clause>>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one leaf
    pub fn add_filter(&mut self, leaf: &Leaf) {
        self.stack.push(compile_leaf(leaf));
    }

    /// Replace the top `n` entries by their conjunction
    pub fn add_and(&mut self, n: usize) {
        let popped = self.pop(n);
        self.stack.push(conjunction(popped));
    }

    /// Replace the top `n` entries by their disjunction
    pub fn add_or(&mut self, n: usize) {
        let popped = self.pop(n);
        self.stack.push(disjunction(popped));
    }

    /// Negate the top `n` entries (all when `None`), OR-joining the results
    pub fn add_not(&mut self, n: Option<usize>) {
        let n = n.unwrap_or(self.stack.len());
        let negated: Vec<Option<Clause>> = self.pop(n).into_iter().map(negation).collect();
        if negated.len() == 1 {
            self.stack.extend(negated);
        } else {
            self.stack.push(disjunction(negated));
        }
    }

    fn pop(&mut self, n: usize) -> Vec<Option<Clause>> {
        let at = self.stack.len().saturating_sub(n);
        self.stack.split_off(at)
    }

    /// `WHERE` clause body and parameters; `None` means no constraint
    pub fn where_clause(&self) -> Option<(String, Vec<SqlValue>)> {
        conjunction(self.stack.clone()).map(|c| (c.sql, c.params))
    }

    /// Whether the SQL selects exactly the matching lines
    pub fn is_exact(&self) -> bool {
        self.stack.iter().all(|c| c.as_ref().map(|c| c.exact).unwrap_or(false))
    }
}

fn compile_leaf(leaf: &Leaf) -> Option<Clause> {
    let field = leaf.column.storage_name();
    if !PUSHDOWN_FIELDS.contains(&field) {
        return None;
    }
    let param = match &leaf.reference {
        Reference::Int(i) => SqlValue::Integer(*i),
        Reference::Float(f) => SqlValue::Real(*f),
        Reference::Text(t) => SqlValue::Text(t.clone()),
        Reference::Pattern(_) => return None,
    };
    let op = match leaf.op {
        Operator::Eq => "=",
        Operator::Ne => "!=",
        Operator::Gt => ">",
        Operator::Ge => ">=",
        Operator::Lt => "<",
        Operator::Le => "<=",
        // NOCASE folds ASCII only: `=` would miss other Unicode case
        // variants, `!=` still selects a superset
        Operator::EqI => return None,
        Operator::NeI => {
            return Some(Clause {
                sql: format!("\"{}\" != ? COLLATE NOCASE", field),
                params: vec![param],
                exact: false,
            })
        }
        _ => return None,
    };
    Some(Clause {
        sql: format!("\"{}\" {} ?", field, op),
        params: vec![param],
        exact: true,
    })
}

fn join(clauses: Vec<Clause>, keyword: &str) -> Clause {
    let exact = clauses.iter().all(|c| c.exact);
    let sql = clauses
        .iter()
        .map(|c| format!("({})", c.sql))
        .collect::<Vec<_>>()
        .join(&format!(" {} ", keyword));
    let params = clauses.into_iter().flat_map(|c| c.params).collect();
    Clause { sql, params, exact }
}

/// Unconstrained parts are dropped; the result is then a superset
fn conjunction(parts: Vec<Option<Clause>>) -> Option<Clause> {
    if parts.is_empty() {
        return Some(Clause {
            sql: "1 = 1".to_string(),
            params: Vec::new(),
            exact: true,
        });
    }
    let total = parts.len();
    let known: Vec<Clause> = parts.into_iter().flatten().collect();
    if known.is_empty() {
        return None;
    }
    let dropped = known.len() < total;
    let mut clause = join(known, "AND");
    clause.exact &= !dropped;
    Some(clause)
}

/// Any unconstrained part makes the whole disjunction unconstrained
fn disjunction(parts: Vec<Option<Clause>>) -> Option<Clause> {
    if parts.is_empty() {
        return Some(Clause {
            sql: "1 = 0".to_string(),
            params: Vec::new(),
            exact: true,
        });
    }
    let known: Option<Vec<Clause>> = parts.into_iter().collect();
    known.map(|clauses| join(clauses, "OR"))
}

/// Only exact clauses can be negated without losing lines
fn negation(part: Option<Clause>) -> Option<Clause> {
    match part {
        Some(c) if c.exact => Some(Clause {
            sql: format!("NOT ({})", c.sql),
            params: c.params,
            exact: true,
        }),
        _ => None,
    }
}

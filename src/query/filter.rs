//! Filter stack machine
//!
//! `Filter:` and `Stats:` lines push entries onto a stack; `And:`, `Or:` and
//! `Negate:` reduce the top N entries into one. Entries left on the stack
//! at the end are implicitly ANDed.
//!
//! ```text
//! Filter: state = 1          [state=1]
//! Filter: state = 2          [state=1, state=2]
//! Or: 2                      [Or(state=1, state=2)]
//! Negate:                    [And(state!=1, state!=2)]
//! ```
//!
//! Negation is structural: comparison operators flip to their complement
//! (`=`/`!=`, `>`/`<=`, `>=`/`<`), AND and OR swap, and operators without a
//! complement are wrapped in `Not`.

use super::error::{QueryError, QueryResult};
use crate::model::{Item, Value};
use crate::schema::{Column, Datatype};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Comparison operator of a filter leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`: equality; emptiness for lists
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`: greater or equal; membership for lists
    Ge,
    /// `<`
    Lt,
    /// `<=`: less or equal; case-insensitive membership for lists
    Le,
    /// `=~`: case-insensitive equality
    EqI,
    /// `!=~`
    NeI,
    /// `~`: regex substring match
    Re,
    /// `!~`
    NRe,
    /// `~~`: case-insensitive regex match
    ReI,
    /// `!~~`
    NReI,
}

impl Operator {
    /// Parse an operator token. The negated comparisons `!>`, `!>=`, `!<`,
    /// `!<=` are rewritten to their positive complement here.
    pub fn parse(token: &str) -> Option<Self> {
        let op = match token {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "=~" => Operator::EqI,
            "!=~" => Operator::NeI,
            "~" => Operator::Re,
            "!~" => Operator::NRe,
            "~~" => Operator::ReI,
            "!~~" => Operator::NReI,
            "!>" => Operator::Le,
            "!>=" => Operator::Lt,
            "!<" => Operator::Ge,
            "!<=" => Operator::Gt,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::EqI => "=~",
            Operator::NeI => "!=~",
            Operator::Re => "~",
            Operator::NRe => "!~",
            Operator::ReI => "~~",
            Operator::NReI => "!~~",
        }
    }

    /// Pure complement, if one exists
    pub fn complement(&self) -> Option<Operator> {
        match self {
            Operator::Eq => Some(Operator::Ne),
            Operator::Ne => Some(Operator::Eq),
            Operator::Gt => Some(Operator::Le),
            Operator::Le => Some(Operator::Gt),
            Operator::Ge => Some(Operator::Lt),
            Operator::Lt => Some(Operator::Ge),
            _ => None,
        }
    }

    /// Whether this is one of the kept-distinct negated operators
    pub fn is_negated(&self) -> bool {
        matches!(self, Operator::NeI | Operator::NRe | Operator::NReI)
    }

    /// Positive form of a negated operator
    pub fn positive(&self) -> Operator {
        match self {
            Operator::NeI => Operator::EqI,
            Operator::NRe => Operator::Re,
            Operator::NReI => Operator::ReI,
            other => *other,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(
            self,
            Operator::Re | Operator::NRe | Operator::ReI | Operator::NReI
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Reference value coerced to the column's datatype
#[derive(Debug, Clone)]
pub enum Reference {
    Int(i64),
    Float(f64),
    Text(String),
    Pattern(Regex),
}

/// One `attribute operator reference` comparison
#[derive(Debug, Clone)]
pub struct Leaf {
    pub column: Arc<Column>,
    pub op: Operator,
    /// Reference text exactly as sent
    pub raw: String,
    pub reference: Reference,
}

impl Leaf {
    pub fn new(column: Arc<Column>, op: Operator, raw: impl Into<String>) -> QueryResult<Self> {
        let raw = raw.into();
        let reference = Self::coerce(&column, op, &raw)?;
        Ok(Self {
            column,
            op,
            raw,
            reference,
        })
    }

    fn coerce(column: &Column, op: Operator, raw: &str) -> QueryResult<Reference> {
        if op.is_regex() {
            let case_insensitive = matches!(op, Operator::ReI | Operator::NReI);
            return RegexBuilder::new(raw)
                .case_insensitive(case_insensitive)
                .build()
                .map(Reference::Pattern)
                .map_err(|e| QueryError::MalformedFilter(format!("invalid regex '{}': {}", raw, e)));
        }
        if matches!(op, Operator::EqI | Operator::NeI) {
            return Ok(Reference::Text(raw.to_string()));
        }

        let bad = |kind: &str| {
            QueryError::MalformedFilter(format!(
                "'{}' is not a valid {} reference for column '{}'",
                raw, kind, column.name
            ))
        };
        match column.datatype {
            Datatype::Int | Datatype::Bool => raw
                .trim()
                .parse::<i64>()
                .map(Reference::Int)
                .map_err(|_| bad("integer")),
            Datatype::Float => raw
                .trim()
                .parse::<f64>()
                .map(Reference::Float)
                .map_err(|_| bad("float")),
            Datatype::String | Datatype::List => Ok(Reference::Text(raw.to_string())),
        }
    }

    /// Evaluate against one item; an item without the attribute never matches
    pub fn matches(&self, item: &Item) -> bool {
        match self.column.accessor.get(item) {
            Some(value) if self.column.datatype.is_list() => self.match_list(&value),
            Some(value) => self.match_scalar(&value),
            None => false,
        }
    }

    fn match_scalar(&self, value: &Value) -> bool {
        match (&self.reference, self.op) {
            (Reference::Pattern(re), op) => {
                let found = re.is_match(&value.to_string());
                if op.is_negated() {
                    !found
                } else {
                    found
                }
            }
            (Reference::Text(text), Operator::EqI) => value.to_string().to_lowercase() == text.to_lowercase(),
            (Reference::Text(text), Operator::NeI) => value.to_string().to_lowercase() != text.to_lowercase(),
            (Reference::Int(reference), op) => match value.as_i64() {
                Some(v) => compare(op, v.cmp(reference)),
                None => false,
            },
            (Reference::Float(reference), op) => match value.as_f64().and_then(|v| v.partial_cmp(reference)) {
                Some(ordering) => compare(op, ordering),
                None => false,
            },
            (Reference::Text(text), op) => compare(op, value.to_string().as_str().cmp(text.as_str())),
        }
    }

    fn match_list(&self, value: &Value) -> bool {
        let elements: Vec<String> = match value {
            Value::List(items) => items.iter().map(|v| v.to_string()).collect(),
            other => vec![other.to_string()],
        };
        let text = match &self.reference {
            Reference::Pattern(re) => {
                let found = elements.iter().any(|e| re.is_match(e));
                return if self.op.is_negated() { !found } else { found };
            }
            Reference::Text(text) => text.clone(),
            Reference::Int(i) => i.to_string(),
            Reference::Float(f) => f.to_string(),
        };
        let contains = || elements.iter().any(|e| *e == text);
        let contains_ci = || {
            let wanted = text.to_lowercase();
            elements.iter().any(|e| e.to_lowercase() == wanted)
        };
        match self.op {
            Operator::Eq => elements.is_empty(),
            Operator::Ne => !elements.is_empty(),
            Operator::Ge => contains(),
            Operator::Lt => !contains(),
            Operator::Le | Operator::EqI => contains_ci(),
            Operator::Gt | Operator::NeI => !contains_ci(),
            Operator::Re | Operator::NRe | Operator::ReI | Operator::NReI => false,
        }
    }

    /// Complement of this leaf
    pub fn negate(self) -> FilterNode {
        if let Some(op) = self.op.complement() {
            return FilterNode::Leaf(Leaf { op, ..self });
        }
        if self.op.is_negated() {
            return FilterNode::Leaf(Leaf {
                op: self.op.positive(),
                ..self
            });
        }
        FilterNode::Not(Box::new(FilterNode::Leaf(self)))
    }
}

impl std::fmt::Display for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.column.name, self.op, self.raw)
    }
}

fn compare(op: Operator, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        Operator::Eq => ordering == Equal,
        Operator::Ne => ordering != Equal,
        Operator::Gt => ordering == Greater,
        Operator::Ge => ordering != Less,
        Operator::Lt => ordering == Less,
        Operator::Le => ordering != Greater,
        _ => false,
    }
}

/// Boolean filter expression
#[derive(Debug, Clone)]
pub enum FilterNode {
    Leaf(Leaf),
    Not(Box<FilterNode>),
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
}

impl FilterNode {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            FilterNode::Leaf(leaf) => leaf.matches(item),
            FilterNode::Not(inner) => !inner.matches(item),
            FilterNode::And(nodes) => nodes.iter().all(|n| n.matches(item)),
            FilterNode::Or(nodes) => nodes.iter().any(|n| n.matches(item)),
        }
    }

    /// Structural negation, applied bottom-up
    pub fn negate(self) -> FilterNode {
        match self {
            FilterNode::Leaf(leaf) => leaf.negate(),
            FilterNode::Not(inner) => *inner,
            FilterNode::And(nodes) => FilterNode::Or(nodes.into_iter().map(FilterNode::negate).collect()),
            FilterNode::Or(nodes) => FilterNode::And(nodes.into_iter().map(FilterNode::negate).collect()),
        }
    }
}

fn write_group(f: &mut std::fmt::Formatter<'_>, name: &str, nodes: &[FilterNode]) -> std::fmt::Result {
    write!(f, "{}(", name)?;
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", node)?;
    }
    write!(f, ")")
}

impl std::fmt::Display for FilterNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterNode::Leaf(leaf) => write!(f, "{}", leaf),
            FilterNode::Not(inner) => write!(f, "Not({})", inner),
            FilterNode::And(nodes) => write_group(f, "And", nodes),
            FilterNode::Or(nodes) => write_group(f, "Or", nodes),
        }
    }
}

/// Numeric aggregation functions for `Stats:` lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunc {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "sum" => Some(AggregateFunc::Sum),
            "min" => Some(AggregateFunc::Min),
            "max" => Some(AggregateFunc::Max),
            "avg" => Some(AggregateFunc::Avg),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Sum => "sum",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::Avg => "avg",
        }
    }
}

/// One entry of the stats stack
#[derive(Debug, Clone)]
pub enum StatsEntry {
    /// Counts matching items
    Predicate(FilterNode),
    /// Aggregates a numeric column over all items
    Aggregate { func: AggregateFunc, column: Arc<Column> },
}

/// Entries a `FilterStack` can reduce
pub trait StackEntry: Sized {
    fn and(entries: Vec<Self>) -> QueryResult<Self>;
    fn or(entries: Vec<Self>) -> QueryResult<Self>;
    fn negate(self) -> QueryResult<Self>;
}

impl StackEntry for FilterNode {
    fn and(entries: Vec<Self>) -> QueryResult<Self> {
        Ok(FilterNode::And(entries))
    }

    fn or(entries: Vec<Self>) -> QueryResult<Self> {
        Ok(FilterNode::Or(entries))
    }

    fn negate(self) -> QueryResult<Self> {
        Ok(FilterNode::negate(self))
    }
}

impl StatsEntry {
    fn predicates(entries: Vec<Self>, op: &str) -> QueryResult<Vec<FilterNode>> {
        entries
            .into_iter()
            .map(|e| match e {
                StatsEntry::Predicate(node) => Ok(node),
                StatsEntry::Aggregate { func, column } => Err(QueryError::MalformedFilter(format!(
                    "cannot combine aggregate '{} {}' with {}",
                    func.name(),
                    column.name,
                    op
                ))),
            })
            .collect()
    }
}

impl StackEntry for StatsEntry {
    fn and(entries: Vec<Self>) -> QueryResult<Self> {
        Ok(StatsEntry::Predicate(FilterNode::And(Self::predicates(entries, "StatsAnd")?)))
    }

    fn or(entries: Vec<Self>) -> QueryResult<Self> {
        Ok(StatsEntry::Predicate(FilterNode::Or(Self::predicates(entries, "StatsOr")?)))
    }

    fn negate(self) -> QueryResult<Self> {
        match self {
            StatsEntry::Predicate(node) => Ok(StatsEntry::Predicate(node.negate())),
            StatsEntry::Aggregate { func, column } => Err(QueryError::MalformedFilter(format!(
                "cannot negate aggregate '{} {}'",
                func.name(),
                column.name
            ))),
        }
    }
}

/// Stack of filter or stats entries owned by one query
#[derive(Debug, Clone)]
pub struct FilterStack<E> {
    entries: Vec<E>,
}

impl<E> Default for FilterStack<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: StackEntry> FilterStack<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: E) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    fn pop_n(&mut self, n: usize, what: &str) -> QueryResult<Vec<E>> {
        if n > self.entries.len() {
            return Err(QueryError::MalformedFilter(format!(
                "{}: {} needs {} entries, only {} on the stack",
                what,
                n,
                n,
                self.entries.len()
            )));
        }
        let at = self.entries.len() - n;
        Ok(self.entries.split_off(at))
    }

    /// Replace the top `n` entries by their conjunction
    pub fn and(&mut self, n: usize) -> QueryResult<()> {
        let popped = self.pop_n(n, "And")?;
        self.entries.push(E::and(popped)?);
        Ok(())
    }

    /// Replace the top `n` entries by their disjunction
    pub fn or(&mut self, n: usize) -> QueryResult<()> {
        let popped = self.pop_n(n, "Or")?;
        self.entries.push(E::or(popped)?);
        Ok(())
    }

    /// Negate the conjunction of the top `n` entries (all entries when
    /// `n` is `None`). Each entry is inverted and, for more than one,
    /// the results are joined with OR.
    pub fn negate(&mut self, n: Option<usize>) -> QueryResult<()> {
        let n = n.unwrap_or(self.entries.len());
        if n == 0 {
            return Err(QueryError::MalformedFilter(
                "Negate: nothing to negate".to_string(),
            ));
        }
        let popped = self.pop_n(n, "Negate")?;
        let mut negated = popped
            .into_iter()
            .map(E::negate)
            .collect::<QueryResult<Vec<E>>>()?;
        let entry = if negated.len() == 1 {
            negated.remove(0)
        } else {
            E::or(negated)?
        };
        self.entries.push(entry);
        Ok(())
    }

    pub fn into_entries(self) -> Vec<E> {
        self.entries
    }
}

impl FilterStack<FilterNode> {
    /// Implicit conjunction of everything on the stack
    pub fn matches(&self, item: &Item) -> bool {
        self.entries.iter().all(|n| n.matches(item))
    }

    /// Whole stack as one tree; `None` when empty
    pub fn tree(&self) -> Option<FilterNode> {
        match self.entries.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(FilterNode::And(many.to_vec())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Host, Service};
    use crate::schema::{Registry, Table};

    fn leaf(table: Table, column: &str, op: &str, raw: &str) -> Leaf {
        let column = Registry::global().column(table, column).unwrap().clone();
        Leaf::new(column, Operator::parse(op).unwrap(), raw).unwrap()
    }

    fn host(name: &str, state: i64) -> Item {
        Item::Host(Arc::new(Host::new(name).state(state)))
    }

    #[test]
    fn test_negated_comparisons_rewritten() {
        assert_eq!(Operator::parse("!>"), Some(Operator::Le));
        assert_eq!(Operator::parse("!>="), Some(Operator::Lt));
        assert_eq!(Operator::parse("!<"), Some(Operator::Ge));
        assert_eq!(Operator::parse("!<="), Some(Operator::Gt));
        assert_eq!(Operator::parse("!~"), Some(Operator::NRe));
        assert_eq!(Operator::parse("=="), None);
    }

    #[test]
    fn test_scalar_int_compare() {
        let items: Vec<Item> = (0..4).map(|s| host("h", s)).collect();
        let ge = leaf(Table::Hosts, "state", ">=", "2");
        let hits: Vec<bool> = items.iter().map(|i| ge.matches(i)).collect();
        assert_eq!(hits, vec![false, false, true, true]);
    }

    #[test]
    fn test_bad_int_reference_is_malformed() {
        let column = Registry::global().column(Table::Hosts, "state").unwrap().clone();
        let err = Leaf::new(column, Operator::Eq, "up").unwrap_err();
        assert_eq!(err.status_code(), 452);
    }

    #[test]
    fn test_double_negation_is_identity() {
        let ops = ["=", "!=", ">", ">=", "<", "<=", "=~", "!=~", "~", "!~", "~~", "!~~"];
        let items: Vec<Item> = ["alpha", "Beta", "gamma"]
            .iter()
            .map(|n| Item::Host(Arc::new(Host::new(*n))))
            .collect();
        for op in ops {
            let original = FilterNode::Leaf(leaf(Table::Hosts, "name", op, "beta"));
            let twice = original.clone().negate().negate();
            let once = original.clone().negate();
            for item in &items {
                assert_eq!(original.matches(item), twice.matches(item), "op {}", op);
                assert_eq!(original.matches(item), !once.matches(item), "op {}", op);
            }
        }
    }

    #[test]
    fn test_list_membership_complements() {
        let item = Item::Host(Arc::new(Host::new("h").group("linux").group("Web")));
        let empty = Item::Host(Arc::new(Host::new("e")));
        for value in ["linux", "web", "Web", "db"] {
            let ge = leaf(Table::Hosts, "groups", ">=", value);
            let lt = leaf(Table::Hosts, "groups", "<", value);
            for i in [&item, &empty] {
                assert_ne!(ge.matches(i), lt.matches(i));
            }
        }
        assert!(leaf(Table::Hosts, "groups", "<=", "web").matches(&item));
        assert!(!leaf(Table::Hosts, "groups", ">=", "web").matches(&item));
        assert!(leaf(Table::Hosts, "groups", "=", "").matches(&empty));
        assert!(leaf(Table::Hosts, "groups", "!=", "").matches(&item));
        assert!(leaf(Table::Hosts, "groups", "~", "^li").matches(&item));
        assert!(leaf(Table::Hosts, "groups", "!~", "^db").matches(&item));
    }

    #[test]
    fn test_regex_is_substring_match() {
        let item = Item::Host(Arc::new(Host::new("web-frontend-01")));
        assert!(leaf(Table::Hosts, "name", "~", "frontend").matches(&item));
        assert!(leaf(Table::Hosts, "name", "~~", "FRONTEND").matches(&item));
        assert!(!leaf(Table::Hosts, "name", "~", "FRONTEND").matches(&item));
        assert!(leaf(Table::Hosts, "name", "=~", "WEB-FRONTEND-01").matches(&item));
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let service = Item::Service(Arc::new(Service::new("h", "s")));
        assert!(!leaf(Table::Hosts, "state", "=", "0").matches(&service));
    }

    #[test]
    fn test_reduce_underflow_fails() {
        let mut stack: FilterStack<FilterNode> = FilterStack::new();
        stack.push(FilterNode::Leaf(leaf(Table::Hosts, "state", "=", "1")));
        assert!(matches!(stack.and(2), Err(QueryError::MalformedFilter(_))));
        assert!(matches!(stack.or(3), Err(QueryError::MalformedFilter(_))));
        assert!(matches!(stack.negate(Some(2)), Err(QueryError::MalformedFilter(_))));
        assert_eq!(stack.len(), 1);

        let mut empty: FilterStack<FilterNode> = FilterStack::new();
        assert!(empty.negate(None).is_err());
    }

    #[test]
    fn test_and_or_zero() {
        let mut stack: FilterStack<FilterNode> = FilterStack::new();
        stack.and(0).unwrap();
        assert!(stack.matches(&host("h", 0)));
        stack.or(0).unwrap();
        assert!(!stack.matches(&host("h", 0)));
    }

    #[test]
    fn test_negate_all_is_de_morgan() {
        let mut stack: FilterStack<FilterNode> = FilterStack::new();
        stack.push(FilterNode::Leaf(leaf(Table::Hosts, "state", ">=", "1")));
        stack.push(FilterNode::Leaf(leaf(Table::Hosts, "name", "~", "^db")));
        stack.negate(None).unwrap();
        assert_eq!(stack.len(), 1);

        let down_db = Item::Host(Arc::new(Host::new("db01").state(1)));
        let up_db = Item::Host(Arc::new(Host::new("db02").state(0)));
        let down_web = Item::Host(Arc::new(Host::new("web01").state(1)));
        assert!(!stack.matches(&down_db));
        assert!(stack.matches(&up_db));
        assert!(stack.matches(&down_web));
    }

    #[test]
    fn test_negating_aggregate_is_rejected() {
        let column = Registry::global().column(Table::Hosts, "latency").unwrap().clone();
        let mut stack: FilterStack<StatsEntry> = FilterStack::new();
        stack.push(StatsEntry::Aggregate {
            func: AggregateFunc::Avg,
            column,
        });
        assert!(matches!(stack.negate(Some(1)), Err(QueryError::MalformedFilter(_))));

        stack.push(StatsEntry::Predicate(FilterNode::And(vec![])));
        assert!(stack.and(2).is_err());
    }
}

//! Filter compilation and execution against a `DocumentBackend`
//!
//! Leaves translate 1:1 per operator, keyed by each column's storage name:
//!
//! ```text
//! state >= 1          {"state": {"$gte": 1}}
//! name =~ Web01       {"host_name": {"$regex": "^Web01$", "$options": "i"}}
//! groups >= linux     {"groups": "linux"}
//! groups =            {"groups": {"$size": 0}}
//! Not(x)              {"$nor": [x]}
//! ```

use super::DocumentBackend;
use crate::model::{Item, Value};
use crate::query::{
    evaluate_stats, AggregateFunc, Executor, FilterNode, Leaf, Operator, Query, QueryResult,
    Reference, ResultSet, StatsEntry,
};
use crate::schema::{Column, Datatype, Shape};
use serde_json::{json, Map, Value as Json};

/// Compile a filter tree into a filter document
pub fn compile_filter(node: &FilterNode) -> Json {
    match node {
        FilterNode::Leaf(leaf) => compile_leaf(leaf),
        FilterNode::Not(inner) => json!({ "$nor": [compile_filter(inner)] }),
        FilterNode::And(nodes) if nodes.is_empty() => json!({}),
        FilterNode::And(nodes) => {
            json!({ "$and": nodes.iter().map(compile_filter).collect::<Vec<_>>() })
        }
        FilterNode::Or(nodes) if nodes.is_empty() => json!({ "_id": { "$exists": false } }),
        FilterNode::Or(nodes) => {
            json!({ "$or": nodes.iter().map(compile_filter).collect::<Vec<_>>() })
        }
    }
}

fn reference(leaf: &Leaf) -> Json {
    match &leaf.reference {
        Reference::Int(i) if leaf.column.datatype == Datatype::Bool => Json::Bool(*i != 0),
        Reference::Int(i) => json!(i),
        Reference::Float(f) => json!(f),
        Reference::Text(text) => json!(text),
        Reference::Pattern(re) => json!(re.as_str()),
    }
}

fn compile_leaf(leaf: &Leaf) -> Json {
    let value = reference(leaf);
    let exact_ci = || {
        json!({ "$regex": format!("^{}$", regex::escape(&leaf.raw)), "$options": "i" })
    };
    let pattern = |case_insensitive: bool| {
        if case_insensitive {
            json!({ "$regex": leaf.raw, "$options": "i" })
        } else {
            json!({ "$regex": leaf.raw })
        }
    };

    let condition = if leaf.column.datatype.is_list() {
        match leaf.op {
            Operator::Eq => json!({ "$size": 0 }),
            Operator::Ne => json!({ "$not": { "$size": 0 } }),
            Operator::Ge => value,
            Operator::Lt => json!({ "$ne": value }),
            Operator::Le | Operator::EqI => exact_ci(),
            Operator::Gt | Operator::NeI => json!({ "$not": exact_ci() }),
            Operator::Re => pattern(false),
            Operator::ReI => pattern(true),
            Operator::NRe => json!({ "$not": pattern(false) }),
            Operator::NReI => json!({ "$not": pattern(true) }),
        }
    } else {
        match leaf.op {
            Operator::Eq => value,
            Operator::Ne => json!({ "$ne": value }),
            Operator::Gt => json!({ "$gt": value }),
            Operator::Ge => json!({ "$gte": value }),
            Operator::Lt => json!({ "$lt": value }),
            Operator::Le => json!({ "$lte": value }),
            Operator::EqI => exact_ci(),
            Operator::NeI => json!({ "$not": exact_ci() }),
            Operator::Re => pattern(false),
            Operator::ReI => pattern(true),
            Operator::NRe => json!({ "$not": pattern(false) }),
            Operator::NReI => json!({ "$not": pattern(true) }),
        }
    };

    let mut doc = Map::new();
    doc.insert(leaf.column.storage_name().to_string(), condition);
    Json::Object(doc)
}

/// Filter document for a whole query: authorization plus primary filter
pub fn query_document(query: &Query) -> Json {
    let mut parts: Vec<Json> = Vec::new();
    if let Some(auth) = &query.auth_filter {
        parts.push(compile_leaf(auth));
    }
    parts.extend(query.filter.entries().iter().map(compile_filter));
    match parts.len() {
        0 => json!({}),
        1 => parts.remove(0),
        _ => json!({ "$and": parts }),
    }
}

fn and(base: &Json, extra: Json) -> Json {
    match base.as_object() {
        Some(map) if map.is_empty() => extra,
        _ => json!({ "$and": [base, extra] }),
    }
}

/// Convert a document field to a cell value of the column's datatype
fn cell(column: &Column, field: Option<&Json>) -> Value {
    let Some(field) = field else {
        return column.datatype.default_value();
    };
    match column.datatype {
        Datatype::Int => field
            .as_i64()
            .or_else(|| field.as_f64().map(|f| f as i64))
            .or_else(|| field.as_bool().map(i64::from))
            .map(Value::Int)
            .unwrap_or_else(|| column.datatype.default_value()),
        Datatype::Float => field
            .as_f64()
            .map(Value::Float)
            .unwrap_or_else(|| column.datatype.default_value()),
        Datatype::Bool => field
            .as_bool()
            .or_else(|| field.as_i64().map(|i| i != 0))
            .map(Value::Bool)
            .unwrap_or_else(|| column.datatype.default_value()),
        Datatype::String => match field {
            Json::String(s) => Value::from(s.as_str()),
            Json::Null => column.datatype.default_value(),
            other => Value::Str(other.to_string()),
        },
        Datatype::List => list_value(field),
    }
}

fn list_value(field: &Json) -> Value {
    match field {
        Json::Array(items) => Value::List(items.iter().map(list_value).collect()),
        Json::String(s) => Value::from(s.as_str()),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Int(0)),
        Json::Null => Value::List(Vec::new()),
        Json::Object(_) => Value::Str(field.to_string()),
    }
}

/// Executor answering scan tables through a document backend.
/// Every other table falls back to the object-store executor.
pub struct DocumentExecutor<'a> {
    backend: &'a dyn DocumentBackend,
    fallback: Executor<'a>,
}

impl<'a> DocumentExecutor<'a> {
    pub fn new(backend: &'a dyn DocumentBackend, fallback: Executor<'a>) -> Self {
        Self { backend, fallback }
    }

    pub fn execute(&self, query: &Query) -> QueryResult<ResultSet> {
        if query.table.shape() != Shape::Scan {
            return self.fallback.execute(query);
        }
        let collection = query.table.name();
        let filter = query_document(query);
        tracing::debug!(collection, filter = %filter, "Document backend query");

        let rows = if query.is_stats_query {
            vec![self.stats(collection, &filter, query)?]
        } else {
            let columns = query.output_columns();
            self.backend
                .find(collection, &filter, self.fallback.row_limit(query))?
                .iter()
                .map(|doc| {
                    columns
                        .iter()
                        .map(|c| cell(c, doc.get(c.storage_name())))
                        .collect()
                })
                .collect()
        };

        Ok(ResultSet {
            headers: query.header_names(),
            rows,
            columns_requested: query.has_requested_columns(),
        })
    }

    fn stats(&self, collection: &str, filter: &Json, query: &Query) -> QueryResult<Vec<Value>> {
        let mut row = Vec::with_capacity(query.stats.len());
        for entry in query.stats.entries() {
            let value = match entry {
                StatsEntry::Predicate(node) => {
                    let count = self.backend.count(collection, &and(filter, compile_filter(node)))?;
                    Value::Int(count as i64)
                }
                StatsEntry::Aggregate { func, column } => {
                    let mut accumulator = Map::new();
                    accumulator.insert(
                        format!("${}", func.name()),
                        Json::String(format!("${}", column.storage_name())),
                    );
                    let pipeline = [
                        json!({ "$match": filter }),
                        json!({ "$group": { "_id": Json::Null, "value": Json::Object(accumulator) } }),
                    ];
                    let docs = self.backend.aggregate(collection, &pipeline)?;
                    let value = docs.first().and_then(|d| d.get("value")).filter(|v| !v.is_null());
                    aggregate_value(*func, column, value)
                }
            };
            row.push(value);
        }
        Ok(row)
    }
}

/// Backend aggregate result, with the same empty-input defaults as the
/// in-memory evaluator
fn aggregate_value(func: AggregateFunc, column: &std::sync::Arc<Column>, value: Option<&Json>) -> Value {
    match (func, value) {
        (AggregateFunc::Avg, Some(v)) => Value::Float(v.as_f64().unwrap_or(0.0)),
        (_, Some(v)) => cell(column, Some(v)),
        (_, None) => {
            let entry = StatsEntry::Aggregate {
                func,
                column: std::sync::Arc::clone(column),
            };
            evaluate_stats(std::slice::from_ref(&entry), std::iter::empty::<Item>())
                .pop()
                .unwrap_or(Value::Int(0))
        }
    }
}

//! Stats evaluation
//!
//! A stats query answers with one row: one cell per top-level entry of the
//! stats stack. Predicates count matching items; aggregates fold a numeric
//! column over every item. All entries are fed in a single pass.

use super::filter::{AggregateFunc, FilterNode, StatsEntry};
use crate::model::{Item, Value};
use crate::schema::{Column, Datatype};
use std::sync::Arc;

enum Accumulator<'e> {
    Count {
        predicate: &'e FilterNode,
        count: i64,
    },
    Aggregate {
        func: AggregateFunc,
        column: &'e Arc<Column>,
        sum: f64,
        int_sum: i64,
        min: Option<f64>,
        max: Option<f64>,
        count: usize,
    },
}

impl<'e> Accumulator<'e> {
    fn new(entry: &'e StatsEntry) -> Self {
        match entry {
            StatsEntry::Predicate(predicate) => Accumulator::Count { predicate, count: 0 },
            StatsEntry::Aggregate { func, column } => Accumulator::Aggregate {
                func: *func,
                column,
                sum: 0.0,
                int_sum: 0,
                min: None,
                max: None,
                count: 0,
            },
        }
    }

    fn feed(&mut self, item: &Item) {
        match self {
            Accumulator::Count { predicate, count } => {
                if predicate.matches(item) {
                    *count += 1;
                }
            }
            Accumulator::Aggregate {
                column,
                sum,
                int_sum,
                min,
                max,
                count,
                ..
            } => {
                let Some(value) = column.accessor.get(item) else {
                    return;
                };
                let Some(v) = value.as_f64() else {
                    return;
                };
                *sum += v;
                *int_sum = int_sum.saturating_add(value.as_i64().unwrap_or(0));
                *min = Some(min.map_or(v, |m| m.min(v)));
                *max = Some(max.map_or(v, |m| m.max(v)));
                *count += 1;
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count { count, .. } => Value::Int(count),
            Accumulator::Aggregate {
                func,
                column,
                sum,
                int_sum,
                min,
                max,
                count,
            } => {
                let integral = matches!(column.datatype, Datatype::Int | Datatype::Bool);
                let numeric = |v: Option<f64>| match (v, integral) {
                    (Some(v), true) => Value::Int(v as i64),
                    (Some(v), false) => Value::Float(v),
                    (None, true) => Value::Int(0),
                    (None, false) => Value::Float(0.0),
                };
                match func {
                    AggregateFunc::Sum if integral => Value::Int(int_sum),
                    AggregateFunc::Sum => Value::Float(sum),
                    AggregateFunc::Min => numeric(min),
                    AggregateFunc::Max => numeric(max),
                    AggregateFunc::Avg if count == 0 => Value::Float(0.0),
                    AggregateFunc::Avg => Value::Float(sum / count as f64),
                }
            }
        }
    }
}

/// Run every stats entry over `items`, returning the aggregate row
pub fn evaluate(entries: &[StatsEntry], items: impl IntoIterator<Item = Item>) -> Vec<Value> {
    let mut accumulators: Vec<Accumulator<'_>> = entries.iter().map(Accumulator::new).collect();
    for item in items {
        for acc in accumulators.iter_mut() {
            acc.feed(&item);
        }
    }
    accumulators.into_iter().map(Accumulator::finish).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Service;
    use crate::query::parse_query;

    fn services() -> Vec<Item> {
        let mut items = Vec::new();
        for (i, state) in [1, 1, 1, 2, 2, 2, 0].iter().enumerate() {
            let mut s = Service::new("h", format!("svc{}", i)).state(*state).max_check_attempts(3);
            s.latency = i as f64 * 0.5;
            items.push(Item::Service(Arc::new(s)));
        }
        items
    }

    fn stats(request: &str, items: Vec<Item>) -> Vec<Value> {
        let query = parse_query(request).unwrap();
        evaluate(query.stats.entries(), items)
    }

    #[test]
    fn test_grouped_predicates() {
        let row = stats(
            "GET services\nStats: state = 1\nStats: state = 2\nStatsOr: 2\nStats: max_check_attempts = 3\nStatsAnd: 2\n",
            services(),
        );
        assert_eq!(row, vec![Value::Int(6)]);
    }

    #[test]
    fn test_one_cell_per_entry() {
        let row = stats(
            "GET services\nStats: state = 0\nStats: state = 2\nStats: sum max_check_attempts\nStats: max latency\n",
            services(),
        );
        assert_eq!(
            row,
            vec![Value::Int(1), Value::Int(3), Value::Int(21), Value::Float(3.0)]
        );
    }

    #[test]
    fn test_stats_negate_counts_complement() {
        let row = stats("GET services\nStats: state = 1\nStatsNegate: 1\n", services());
        assert_eq!(row, vec![Value::Int(4)]);
    }

    #[test]
    fn test_empty_input_is_defined() {
        let row = stats(
            "GET services\nStats: avg latency\nStats: min state\nStats: sum latency\nStats: state = 0\n",
            Vec::new(),
        );
        assert_eq!(
            row,
            vec![Value::Float(0.0), Value::Int(0), Value::Float(0.0), Value::Int(0)]
        );
    }

    #[test]
    fn test_avg() {
        let row = stats("GET services\nStats: avg latency\n", services());
        assert_eq!(row, vec![Value::Float(1.5)]);
    }
}

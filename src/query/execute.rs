//! Apply a validated `Query` to scored records: filter, stable sort, limit.
//!
//! Total over any validated query and any record shape: unknown fields, type
//! mismatches and missing data mean "does not match" / "not comparable".
//! The input slice is never mutated.

use std::cmp::Ordering;

use metrics::counter;
use serde_json::Value;
use tracing::debug;

use super::fields::resolve;
use super::{FilterCondition, Query, QueryResult, SortOrder, NO_MATCHES_EXPLANATION};
use crate::analyze::ScoredRecord;

pub fn execute(records: &[ScoredRecord], query: &Query) -> QueryResult {
    counter!("queries_executed_total").increment(1);
    debug!(
        target: "query",
        input = records.len(),
        filters = query.filters.len(),
        sort = ?query.sort,
        limit = ?query.limit,
        "executing query"
    );

    // JSON view of each record, built once; field paths walk this.
    let mut rows: Vec<(usize, Value)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, serde_json::to_value(r).unwrap_or(Value::Null)))
        .collect();

    if !query.filters.is_empty() {
        rows.retain(|(_, view)| {
            query
                .filters
                .iter()
                .all(|f| matches_condition(resolve(view, &f.field), &f.condition))
        });
        debug!(target: "query", matched = rows.len(), "after filters");
    }
    let total = rows.len();

    if let Some(sort) = &query.sort {
        // `sort_by` is stable, so ties keep their incoming (score-ranked) order.
        rows.sort_by(|(_, a), (_, b)| {
            sort_cmp(resolve(a, &sort.field), resolve(b, &sort.field), sort.order)
        });
    }

    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }

    let out: Vec<ScoredRecord> = rows.into_iter().map(|(i, _)| records[i].clone()).collect();
    let explanation = if out.is_empty() {
        Some(match &query.explanation {
            Some(e) => format!("{NO_MATCHES_EXPLANATION} ({e})"),
            None => NO_MATCHES_EXPLANATION.to_string(),
        })
    } else {
        query.explanation.clone()
    };

    QueryResult {
        records: out,
        total,
        explanation,
    }
}

/// Every operator present in `cond` must hold for `value`.
pub fn matches_condition(value: Option<&Value>, cond: &FilterCondition) -> bool {
    if let Some(target) = &cond.eq {
        match value {
            Some(v) if scalar_eq(v, target) => {}
            _ => return false,
        }
    }

    let num = value.and_then(Value::as_f64);
    let numeric_checks: [(Option<f64>, fn(f64, f64) -> bool); 4] = [
        (cond.gt, |v, t| v > t),
        (cond.gte, |v, t| v >= t),
        (cond.lt, |v, t| v < t),
        (cond.lte, |v, t| v <= t),
    ];
    for (target, check) in numeric_checks {
        if let Some(t) = target {
            match num {
                Some(v) if check(v, t) => {}
                _ => return false,
            }
        }
    }

    if let Some(needle) = &cond.contains {
        match value.and_then(Value::as_str) {
            Some(hay) if hay.to_lowercase().contains(&needle.to_lowercase()) => {}
            _ => return false,
        }
    }

    true
}

/// Strict equality; numbers compare by value so `7` equals `7.0`.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Numbers before strings before anything else (missing, bool, null, nested).
fn value_class(v: Option<&Value>) -> u8 {
    match v {
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        _ => 2,
    }
}

/// Total ascending order: by class, then numbers numerically and strings with a
/// locale-style ordering. Values of the last class tie with each other.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => locale_cmp(x, y),
        _ => value_class(a).cmp(&value_class(b)),
    }
}

/// Sort comparator. `Desc` flips only values of the same class, so records
/// without a comparable value stay at the end in either direction.
pub fn sort_cmp(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    let ord = compare_values(a, b);
    match order {
        SortOrder::Desc if value_class(a) == value_class(b) => ord.reverse(),
        _ => ord,
    }
}

/// Case-insensitive first; on a tie lowercase sorts first ("apple" < "banana" < "Banana").
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

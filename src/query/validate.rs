//! JSON value -> typed `Query`, or `QueryError::Schema`.
//!
//! Rules:
//! - top level must be an object; unknown keys are ignored;
//! - `filters` is an object of objects whose keys are operators
//!   (`eq`, `gt`, `gte`, `lt`, `lte`, `contains`);
//! - `gt..lte` take numbers (numeric strings are accepted), `contains` a string,
//!   `eq` any scalar; a `null` operand is treated as absent;
//! - `sort` needs a non-empty string `field` and `order` of exactly "asc"/"desc";
//! - `limit` truncates only when it is a positive integer, anything else means no limit.
//!
//! Field paths are not checked against the record shape; unknown paths simply
//! never match at execution time.

use serde_json::{Map, Value};

use super::{Filter, FilterCondition, Query, QueryError, SortOrder, SortSpec};

pub const OPERATORS: [&str; 6] = ["eq", "gt", "gte", "lt", "lte", "contains"];

pub fn validate(value: &Value) -> Result<Query, QueryError> {
    let obj = value
        .as_object()
        .ok_or_else(|| QueryError::schema("expected a JSON object at the top level"))?;

    Ok(Query {
        filters: parse_filters(obj.get("filters"))?,
        sort: parse_sort(obj.get("sort"))?,
        limit: parse_limit(obj.get("limit")),
        explanation: obj
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

fn parse_filters(v: Option<&Value>) -> Result<Vec<Filter>, QueryError> {
    let map = match v {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(m)) => m,
        Some(_) => return Err(QueryError::schema("`filters` must be an object")),
    };

    map.iter()
        .map(|(field, cond)| {
            let cond = cond.as_object().ok_or_else(|| {
                QueryError::schema(format!("filter for `{field}` must be an object of operators"))
            })?;
            Ok(Filter {
                field: field.clone(),
                condition: parse_condition(field, cond)?,
            })
        })
        .collect()
}

fn parse_condition(field: &str, cond: &Map<String, Value>) -> Result<FilterCondition, QueryError> {
    let mut out = FilterCondition::default();
    for (op, operand) in cond {
        if !OPERATORS.contains(&op.as_str()) {
            return Err(QueryError::schema(format!(
                "unsupported operator `{op}` on `{field}`"
            )));
        }
        if operand.is_null() {
            continue;
        }
        match op.as_str() {
            "eq" => {
                if operand.is_array() || operand.is_object() {
                    return Err(QueryError::schema(format!(
                        "`eq` on `{field}` must be a string, number or boolean"
                    )));
                }
                out.eq = Some(operand.clone());
            }
            "contains" => {
                let s = operand.as_str().ok_or_else(|| {
                    QueryError::schema(format!("`contains` on `{field}` must be a string"))
                })?;
                out.contains = Some(s.to_string());
            }
            numeric => {
                let n = as_number(operand).ok_or_else(|| {
                    QueryError::schema(format!("`{numeric}` on `{field}` must be a number"))
                })?;
                match numeric {
                    "gt" => out.gt = Some(n),
                    "gte" => out.gte = Some(n),
                    "lt" => out.lt = Some(n),
                    _ => out.lte = Some(n),
                }
            }
        }
    }
    Ok(out)
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn parse_sort(v: Option<&Value>) -> Result<Option<SortSpec>, QueryError> {
    let obj = match v {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(m)) => m,
        Some(_) => return Err(QueryError::schema("`sort` must be an object")),
    };

    let field = obj
        .get("field")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| QueryError::schema("`sort.field` must be a non-empty string"))?;

    let order = match obj.get("order").and_then(Value::as_str) {
        Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(other) => {
            return Err(QueryError::schema(format!(
                "`sort.order` must be \"asc\" or \"desc\", got \"{other}\""
            )))
        }
        None => {
            return Err(QueryError::schema(
                "`sort.order` must be \"asc\" or \"desc\"",
            ))
        }
    };

    Ok(Some(SortSpec {
        field: field.to_string(),
        order,
    }))
}

/// Positive integers only; everything else means "no truncation".
fn parse_limit(v: Option<&Value>) -> Option<usize> {
    let Value::Number(n) = v? else {
        return None;
    };
    if let Some(u) = n.as_u64() {
        return usize::try_from(u).ok().filter(|u| *u > 0);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= usize::MAX as f64).then_some(f as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_is_empty_query() {
        let q = validate(&json!({})).unwrap();
        assert!(q.is_empty());
        assert_eq!(q.explanation, None);
    }

    #[test]
    fn full_query_parses() {
        let q = validate(&json!({
            "filters": { "views": { "lt": 100000 }, "title": { "contains": "Live" } },
            "sort": { "field": "rates.engagementRate", "order": "desc" },
            "limit": 20,
            "explanation": "High engagement videos with under 100K views"
        }))
        .unwrap();
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters[0].field, "views");
        assert_eq!(q.filters[0].condition.lt, Some(100_000.0));
        assert_eq!(q.filters[1].condition.contains.as_deref(), Some("Live"));
        assert_eq!(
            q.sort,
            Some(SortSpec {
                field: "rates.engagementRate".into(),
                order: SortOrder::Desc
            })
        );
        assert_eq!(q.limit, Some(20));
        assert!(q.explanation.is_some());
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        for v in [json!([]), json!("sort by views"), json!(3), json!(null)] {
            assert!(matches!(validate(&v), Err(QueryError::Schema(_))), "{v}");
        }
    }

    #[test]
    fn illegal_sort_order_is_rejected() {
        for order in [json!("ascending"), json!("DESC"), json!(1), json!(null)] {
            let v = json!({ "sort": { "field": "views", "order": order } });
            assert!(matches!(validate(&v), Err(QueryError::Schema(_))));
        }
        let missing_field = json!({ "sort": { "order": "asc" } });
        assert!(validate(&missing_field).is_err());
    }

    #[test]
    fn non_object_filters_are_rejected() {
        assert!(validate(&json!({ "filters": [1, 2] })).is_err());
        assert!(validate(&json!({ "filters": { "views": 5 } })).is_err());
        assert!(validate(&json!({ "filters": { "views": { "between": [1, 2] } } })).is_err());
        assert!(validate(&json!({ "filters": { "views": { "gt": "lots" } } })).is_err());
        assert!(validate(&json!({ "filters": { "title": { "contains": 5 } } })).is_err());
        assert!(validate(&json!({ "filters": { "title": { "eq": ["a"] } } })).is_err());
    }

    #[test]
    fn unknown_keys_and_fields_are_tolerated() {
        let q = validate(&json!({
            "filters": { "no.such.field": { "eq": true } },
            "sort": { "field": "made_up", "order": "asc" },
            "confidence": 0.9
        }))
        .unwrap();
        assert_eq!(q.filters[0].field, "no.such.field");
        assert_eq!(q.sort.unwrap().field, "made_up");
    }

    #[test]
    fn limit_only_truncates_when_positive_integer() {
        let lim = |v: Value| validate(&json!({ "limit": v })).unwrap().limit;
        assert_eq!(lim(json!(5)), Some(5));
        assert_eq!(lim(json!(5.0)), Some(5));
        assert_eq!(lim(json!(0)), None);
        assert_eq!(lim(json!(-3)), None);
        assert_eq!(lim(json!(2.5)), None);
        assert_eq!(lim(json!("10")), None);
        assert_eq!(lim(json!(null)), None);
    }

    #[test]
    fn numeric_strings_and_null_operands() {
        let q = validate(&json!({ "filters": { "days": { "lte": "7", "gt": null } } })).unwrap();
        assert_eq!(q.filters[0].condition.lte, Some(7.0));
        assert_eq!(q.filters[0].condition.gt, None);
    }
}

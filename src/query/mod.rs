// src/query/mod.rs
//! Structured query DSL over scored records.
//!
//! Grammar (JSON):
//! {
//!   "filters": { "<dot.path>": { "eq"|"gt"|"gte"|"lt"|"lte"|"contains": value, ... } },
//!   "sort": { "field": "<dot.path>", "order": "asc" | "desc" },
//!   "limit": <positive int>,
//!   "explanation": "<text>"
//! }
//!
//! Input usually comes from an LLM, so it is untrusted: `validate` checks shape
//! and types exhaustively, and `execute` is total over any validated query.

pub mod execute;
pub mod extract;
pub mod fields;
pub mod validate;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::analyze::ScoredRecord;

pub use execute::execute;
pub use extract::extract_json_object;
pub use validate::validate;

/// Explanation used when nothing survives the filters.
pub const NO_MATCHES_EXPLANATION: &str = "No records match this query.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Translator output contained no JSON object.
    #[error("no JSON object found in translator output")]
    Extraction,
    /// JSON was found but does not fit the query grammar.
    #[error("invalid query: {0}")]
    Schema(String),
}

impl QueryError {
    pub fn schema(msg: impl Into<String>) -> Self {
        QueryError::Schema(msg.into())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Extraction => "extraction",
            QueryError::Schema(_) => "schema",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

/// Operator/value pairs for one field. Absent operators are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eq: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub condition: FilterCondition,
}

/// A validated query. Construct through `validate`/`parse_query` for untrusted input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// In the order they appeared in the source object.
    pub filters: Vec<Filter>,
    pub sort: Option<SortSpec>,
    /// `None` means no truncation.
    pub limit: Option<usize>,
    pub explanation: Option<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sort.is_none() && self.limit.is_none()
    }

    pub fn filter(mut self, field: impl Into<String>, condition: FilterCondition) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            condition,
        });
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortSpec {
            field: field.into(),
            order,
        });
        self
    }

    pub fn limited(mut self, n: usize) -> Self {
        self.limit = (n > 0).then_some(n);
        self
    }
}

/// Ranked/filtered output plus an explanation for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub records: Vec<ScoredRecord>,
    /// Matches after filtering, before the limit.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Raw translator text -> validated query.
pub fn parse_query(text: &str) -> Result<Query, QueryError> {
    let value = extract_json_object(text)?;
    validate(&value)
}

/// Raw translator text -> executed result.
pub fn run_query_text(records: &[ScoredRecord], text: &str) -> Result<QueryResult, QueryError> {
    let query = parse_query(text).inspect_err(|e| {
        metrics::counter!("queries_rejected_total", "kind" => e.kind()).increment(1);
    })?;
    Ok(execute(records, &query))
}

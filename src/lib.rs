// src/lib.rs
// Public library surface for the server binary, tools and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod query;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    explain, rank_by_score, rescore, score_batch, score_metrics, score_record, Component,
    RawMetrics, Rates, ScoreComponents, ScoreGrade, ScoredRecord, ScoringProfile, WeightVector,
};
pub use crate::api::router;
pub use crate::ingest::VideoRecord;
pub use crate::query::{execute, validate, Query, QueryError, QueryResult};
pub use crate::translate::{ask, AskError, TranslateError, Translator};

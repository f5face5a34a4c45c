// src/analyze/mod.rs
//! Scoring pipeline entry: raw counters -> rates -> sub-scores -> composite.
//!
//! Everything here is pure. The caller owns the `WeightVector` and re-invokes
//! `rescore` when it changes; nothing is cached per weight vector.

pub mod grade;
pub mod normalize;
pub mod rates;
pub mod scoring;
pub mod weights;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ingest::duration::is_short_form;
use crate::ingest::VideoRecord;

// Re-export convenient types.
pub use crate::analyze::grade::ScoreGrade;
pub use crate::analyze::rates::{RawMetrics, Rates};
pub use crate::analyze::scoring::{Component, ScoreComponents, ScoringProfile};
pub use crate::analyze::weights::{HotReloadWeights, WeightVector};

/// Immutable result of one scoring pass over one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    pub id: String,
    pub title: String,
    pub profile: ScoringProfile,
    pub raw_metrics: RawMetrics,
    pub rates: Rates,
    pub components: ScoreComponents,
    pub composite_score: f64,
    pub grade: ScoreGrade,
    pub is_short: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// Score raw counters directly (no metadata).
pub fn score_metrics(
    id: impl Into<String>,
    title: impl Into<String>,
    metrics: RawMetrics,
    profile: ScoringProfile,
    weights: &WeightVector,
) -> ScoredRecord {
    let metrics = metrics.sanitized();
    let rates = Rates::from_metrics(&metrics);
    let components = scoring::compute_components(profile, &metrics, &rates);
    let composite_score = scoring::composite(profile, &components, weights);
    counter!("records_scored_total").increment(1);
    ScoredRecord {
        id: id.into(),
        title: title.into(),
        profile,
        raw_metrics: metrics,
        rates,
        components,
        composite_score,
        grade: ScoreGrade::from_score(composite_score),
        is_short: is_short_form(metrics.duration_seconds),
        metadata: Map::new(),
    }
}

/// Score one input record; `now` resolves `publishedAt` into an age.
pub fn score_record(
    rec: &VideoRecord,
    profile: ScoringProfile,
    weights: &WeightVector,
    now: DateTime<Utc>,
) -> ScoredRecord {
    let mut out = score_metrics(
        rec.id.clone(),
        rec.title.clone(),
        rec.raw_metrics(now),
        profile,
        weights,
    );
    out.metadata = rec.metadata.clone();
    out
}

/// Score a batch, preserving input order.
pub fn score_batch(
    records: &[VideoRecord],
    profile: ScoringProfile,
    weights: &WeightVector,
    now: DateTime<Utc>,
) -> Vec<ScoredRecord> {
    records
        .iter()
        .map(|r| score_record(r, profile, weights, now))
        .collect()
}

/// Stable ranking by composite score, best first.
pub fn rank_by_score(mut records: Vec<ScoredRecord>) -> Vec<ScoredRecord> {
    records.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    records
}

/// Re-blend existing sub-scores under new weights. Components are untouched;
/// a new record is returned.
pub fn rescore(record: &ScoredRecord, weights: &WeightVector) -> ScoredRecord {
    let composite_score = scoring::composite(record.profile, &record.components, weights);
    ScoredRecord {
        composite_score,
        grade: ScoreGrade::from_score(composite_score),
        ..record.clone()
    }
}

/// Per-component contribution to a composite score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentContribution {
    pub component: Component,
    pub value: f64,
    /// Normalized weight share in percent.
    pub weight_pct: u32,
    pub contribution: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreExplanation {
    pub composite_score: f64,
    pub profile: ScoringProfile,
    pub grade: ScoreGrade,
    pub components: Vec<ComponentContribution>,
    pub human_readable: String,
}

/// Break a composite down into its weighted parts.
pub fn explain(record: &ScoredRecord, weights: &WeightVector) -> ScoreExplanation {
    let parts = record.profile.components();
    let total = weights.total(parts);
    let w = weights.sanitized();

    let mut components: Vec<ComponentContribution> = parts
        .iter()
        .map(|c| {
            let value = record.components.get(*c).unwrap_or(0.0);
            let share = if total > 0.0 { w.get(*c) / total } else { 0.0 };
            ComponentContribution {
                component: *c,
                value,
                weight_pct: w.normalized_percent(*c, parts),
                contribution: normalize::round1(value * share),
                description: c.description(),
            }
        })
        .collect();
    components.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

    let composite_score = scoring::composite(record.profile, &record.components, weights);
    let grade = ScoreGrade::from_score(composite_score);
    let top = components
        .iter()
        .filter(|c| c.contribution > 0.0)
        .take(2)
        .map(|c| format!("{} {:.1}", c.component, c.value))
        .collect::<Vec<_>>();
    let human_readable = if top.is_empty() {
        format!("{composite_score:.1} ({}): no component contributes", grade.label())
    } else {
        format!(
            "{composite_score:.1} ({}): driven by {}",
            grade.label(),
            top.join(", ")
        )
    };

    ScoreExplanation {
        composite_score,
        profile: record.profile,
        grade,
        components,
        human_readable,
    }
}

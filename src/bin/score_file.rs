//! Score a JSON file of records and print them ranked, optionally through a query.
//!
//! usage: score_file <records.json> [query-json-or-text] [classic|balanced]

use anyhow::{bail, Context};
use chrono::Utc;
use std::path::Path;

use video_score_engine::analyze::{
    rank_by_score, score_batch, HotReloadWeights, ScoringProfile, WeightVector,
};
use video_score_engine::ingest::{duration::format_duration, load_records_from};
use video_score_engine::query;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: score_file <records.json> [query] [classic|balanced]");
    };
    let query_text = args.next();
    let profile = match args.next() {
        Some(p) => p.parse::<ScoringProfile>().map_err(anyhow::Error::msg)?,
        None => ScoringProfile::default(),
    };

    let weights = HotReloadWeights::new(None, WeightVector::default()).current();
    let records = load_records_from(Path::new(&path)).context("loading records")?;
    let scored = rank_by_score(score_batch(&records, profile, &weights, Utc::now()));

    let result = match query_text.as_deref() {
        Some(text) => query::run_query_text(&scored, text).context("query rejected")?,
        None => query::execute(&scored, &query::Query::default()),
    };

    if let Some(e) = &result.explanation {
        println!("{e}");
    }
    for r in &result.records {
        println!(
            "{:>5.1}  {:<10} {:>8}  {:>10} views  {}",
            r.composite_score,
            r.grade.label(),
            format_duration(r.raw_metrics.duration_seconds as u64),
            r.raw_metrics.views,
            r.title
        );
    }
    println!("{} of {} records", result.records.len(), scored.len());
    Ok(())
}

// src/ingest/mod.rs
//! Input records as delivered by the metrics-fetching collaborator.
//!
//! The fetcher hands over an ordered list of records with a stable id, a title,
//! raw counters and free-form display metadata. Counters may arrive as numbers
//! or numeric strings, durations as seconds or ISO-8601, and age either as
//! `ageDays` or derived from `publishedAt`.

pub mod duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::analyze::rates::RawMetrics;
use duration::parse_iso8601_duration;

/// One record as received; not yet scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    #[serde(alias = "videoId")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de_counter")]
    pub views: u64,
    #[serde(default, deserialize_with = "de_counter")]
    pub likes: u64,
    #[serde(default, deserialize_with = "de_counter")]
    pub comments: u64,
    #[serde(default, alias = "days", skip_serializing_if = "Option::is_none")]
    pub age_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "duration",
        deserialize_with = "de_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_seconds: Option<f64>,
    /// Display-only fields (url, thumbnail, description...). Not used by scoring.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl VideoRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, m: RawMetrics) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            views: m.views,
            likes: m.likes,
            comments: m.comments,
            age_days: Some(m.age_days),
            published_at: None,
            duration_seconds: Some(m.duration_seconds),
            metadata: Map::new(),
        }
    }

    /// Raw counters for scoring. Age falls back to whole days since `published_at`
    /// relative to `now`, then to 0.
    pub fn raw_metrics(&self, now: DateTime<Utc>) -> RawMetrics {
        let age = self
            .age_days
            .or_else(|| self.published_at.map(|p| days_between(p, now)))
            .unwrap_or(0.0);
        RawMetrics::new(
            self.views,
            self.likes,
            self.comments,
            age,
            self.duration_seconds.unwrap_or(0.0),
        )
    }
}

/// Whole days from `from` to `to`, never negative.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_days().max(0) as f64
}

fn de_counter<'de, D>(d: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

fn de_duration<'de, D>(d: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(secs) => Some(secs),
            Err(_) => Some(parse_iso8601_duration(&s) as f64),
        },
        _ => None,
    })
}

/// Titles from the fetcher: decode HTML entities, collapse whitespace, trim.
pub fn normalize_title(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Normalize titles, drop records without an id, keep the first of duplicate ids.
/// Input order is preserved. Returns `(kept, dropped)`.
pub fn normalize_records(raw: Vec<VideoRecord>) -> (Vec<VideoRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for mut rec in raw {
        rec.id = rec.id.trim().to_string();
        if rec.id.is_empty() || !seen.insert(rec.id.clone()) {
            dropped += 1;
            continue;
        }
        rec.title = normalize_title(&rec.title);
        kept.push(rec);
    }

    counter!("ingest_records_kept_total").increment(kept.len() as u64);
    counter!("ingest_records_dropped_total").increment(dropped as u64);
    (kept, dropped)
}

/// Load a JSON array of records from disk and normalize it.
pub fn load_records_from(path: &Path) -> Result<Vec<VideoRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading records from {}", path.display()))?;
    let raw: Vec<VideoRecord> = serde_json::from_str(&content)
        .with_context(|| format!("parsing records in {}", path.display()))?;
    let (kept, dropped) = normalize_records(raw);
    if dropped > 0 {
        tracing::warn!(dropped, path = %path.display(), "records without id or duplicated were dropped");
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn accepts_fetcher_shapes() {
        let rec: VideoRecord = serde_json::from_value(json!({
            "videoId": "abc",
            "title": "Tom &amp; Jerry",
            "views": "1200",
            "likes": 30,
            "comments": null,
            "days": 4,
            "duration": "PT4M13S",
            "metadata": { "url": "https://youtu.be/abc" }
        }))
        .unwrap();
        assert_eq!(rec.id, "abc");
        assert_eq!(rec.views, 1_200);
        assert_eq!(rec.comments, 0);
        assert_eq!(rec.age_days, Some(4.0));
        assert_eq!(rec.duration_seconds, Some(253.0));
        assert_eq!(rec.metadata["url"], "https://youtu.be/abc");
    }

    #[test]
    fn age_derives_from_published_at() {
        let rec: VideoRecord = serde_json::from_value(json!({
            "id": "x",
            "publishedAt": "2024-01-01T00:00:00Z",
            "durationSeconds": 90
        }))
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap();
        let m = rec.raw_metrics(now);
        assert_eq!(m.age_days, 10.0);
        assert_eq!(m.duration_seconds, 90.0);
    }

    #[test]
    fn future_publish_date_is_age_zero() {
        let from = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(days_between(from, now), 0.0);
    }

    #[test]
    fn normalize_title_decodes_and_collapses() {
        assert_eq!(normalize_title("  Hello&nbsp;&nbsp; \n world  "), "Hello world");
        assert_eq!(normalize_title("Q&amp;A"), "Q&A");
    }

    #[test]
    fn normalize_records_drops_blank_and_duplicate_ids() {
        let m = RawMetrics::default();
        let raw = vec![
            VideoRecord::new("a", "first", m),
            VideoRecord::new("  ", "blank", m),
            VideoRecord::new("b", "second", m),
            VideoRecord::new("a", "dup", m),
        ];
        let (kept, dropped) = normalize_records(raw);
        assert_eq!(dropped, 2);
        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(kept[0].title, "first");
    }

    #[test]
    fn load_records_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, r#"[{"id":"a","views":10},{"id":"b","views":"20"}]"#).unwrap();
        let recs = load_records_from(&path).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].views, 20);
    }
}

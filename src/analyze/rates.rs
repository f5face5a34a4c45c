//! Rate metrics derived from the raw counters of a single video.
//!
//! Every function here is total: zero views, zero age and zero duration are
//! explicit cases and never produce NaN or Infinity.

use serde::{Deserialize, Serialize};

/// Comments count this many times a like in the weighted engagement rate.
pub const COMMENT_WEIGHT: f64 = 5.0;
pub const LIKE_WEIGHT: f64 = 1.0;

/// Raw counters for one record, as delivered by the metrics fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub age_days: f64,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl RawMetrics {
    /// Safe constructor: negative or non-finite age/duration become 0.
    pub fn new(views: u64, likes: u64, comments: u64, age_days: f64, duration_seconds: f64) -> Self {
        Self {
            views,
            likes,
            comments,
            age_days: non_negative(age_days),
            duration_seconds: non_negative(duration_seconds),
        }
    }

    /// Same values with age/duration sanitized (used after deserialization).
    pub fn sanitized(self) -> Self {
        Self::new(
            self.views,
            self.likes,
            self.comments,
            self.age_days,
            self.duration_seconds,
        )
    }

    /// Content length in minutes, floored to one minute for the rate denominators.
    fn billable_minutes(&self) -> f64 {
        (self.duration_seconds / 60.0).max(1.0)
    }
}

fn non_negative(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Derived, read-only rates. Always recomputed from `RawMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rates {
    /// Likes per 1000 views.
    pub like_rate: f64,
    /// Comments per 1000 views.
    pub comment_rate: f64,
    /// Weighted (likes + 5 * comments) per 1000 views.
    pub engagement_rate: f64,
    pub views_per_day: f64,
    /// Views per minute of content.
    pub views_per_minute: f64,
    pub engagement_per_minute: f64,
}

impl Rates {
    pub fn from_metrics(m: &RawMetrics) -> Self {
        Self {
            like_rate: per_thousand(m.likes as f64, m.views),
            comment_rate: per_thousand(m.comments as f64, m.views),
            engagement_rate: engagement_rate(m),
            views_per_day: views_per_day(m),
            views_per_minute: m.views as f64 / m.billable_minutes(),
            engagement_per_minute: (m.likes + m.comments) as f64 / m.billable_minutes(),
        }
    }
}

/// `x / views * 1000`, or 0 when there are no views.
pub fn per_thousand(x: f64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    x / views as f64 * 1000.0
}

pub fn engagement_rate(m: &RawMetrics) -> f64 {
    let weighted = m.likes as f64 * LIKE_WEIGHT + m.comments as f64 * COMMENT_WEIGHT;
    per_thousand(weighted, m.views)
}

/// Views per day of age; a record published today counts all its views.
pub fn views_per_day(m: &RawMetrics) -> f64 {
    if m.age_days == 0.0 {
        m.views as f64
    } else {
        m.views as f64 / m.age_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_views_zeroes_every_rate() {
        let r = Rates::from_metrics(&RawMetrics::new(0, 10, 3, 5.0, 300.0));
        assert_eq!(r.like_rate, 0.0);
        assert_eq!(r.comment_rate, 0.0);
        assert_eq!(r.engagement_rate, 0.0);
        assert_eq!(r.views_per_day, 0.0);
        assert_eq!(r.views_per_minute, 0.0);
    }

    #[test]
    fn engagement_weights_comments_five_times() {
        let m = RawMetrics::new(1_000, 10, 2, 1.0, 60.0);
        // (10 + 2*5) / 1000 * 1000
        assert!(approx(engagement_rate(&m), 20.0));
        assert!(approx(Rates::from_metrics(&m).like_rate, 10.0));
        assert!(approx(Rates::from_metrics(&m).comment_rate, 2.0));
    }

    #[test]
    fn age_zero_counts_all_views_per_day() {
        let m = RawMetrics::new(5_000, 0, 0, 0.0, 600.0);
        assert!(approx(views_per_day(&m), 5_000.0));
        let m = RawMetrics::new(5_000, 0, 0, 10.0, 600.0);
        assert!(approx(views_per_day(&m), 500.0));
    }

    #[test]
    fn short_content_floors_to_one_minute() {
        let short = Rates::from_metrics(&RawMetrics::new(600, 6, 0, 1.0, 15.0));
        assert!(approx(short.views_per_minute, 600.0));
        assert!(approx(short.engagement_per_minute, 6.0));

        let none = Rates::from_metrics(&RawMetrics::new(600, 6, 0, 1.0, 0.0));
        assert!(approx(none.views_per_minute, 600.0));

        let long = Rates::from_metrics(&RawMetrics::new(600, 6, 0, 1.0, 600.0));
        assert!(approx(long.views_per_minute, 60.0));
    }

    #[test]
    fn negative_and_nan_inputs_are_sanitized() {
        let m = RawMetrics::new(100, 1, 1, -3.0, f64::NAN);
        assert_eq!(m.age_days, 0.0);
        assert_eq!(m.duration_seconds, 0.0);
        let r = Rates::from_metrics(&m);
        assert!(r.views_per_day.is_finite());
        assert!(r.views_per_minute.is_finite());
    }
}

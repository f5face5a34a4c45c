//! Sub-score composition and the weighted composite.
//!
//! Two generations of the formula coexist as explicit `ScoringProfile`s:
//! - `classic`  : five components; consistency is engagement scaled by an age factor,
//!   plus an `efficiency` component from views per minute of content.
//! - `balanced` : four components; consistency is the daily view rate discounted
//!   for very young records and rewarded for sustained older ones.
//!
//! Shared rules:
//! - every sub-score is in [0,100] and rounded to one decimal;
//! - a driving signal of exactly 0 gives a sub-score of exactly 0;
//! - composite = Σ component * weight / Σ weight over the profile's components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::normalize::{log_scaled, round1, sigmoid};
use super::rates::{RawMetrics, Rates};
use super::weights::WeightVector;

/// Name of a sub-score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    #[serde(alias = "views")]
    Reach,
    Engagement,
    Consistency,
    Community,
    Efficiency,
}

impl Component {
    pub const ALL: [Component; 5] = [
        Component::Reach,
        Component::Engagement,
        Component::Consistency,
        Component::Community,
        Component::Efficiency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Reach => "reach",
            Component::Engagement => "engagement",
            Component::Consistency => "consistency",
            Component::Community => "community",
            Component::Efficiency => "efficiency",
        }
    }

    /// One-line description for explanations and tooltips.
    pub fn description(&self) -> &'static str {
        match self {
            Component::Reach => "Total views on a log scale; broader reach and discoverability.",
            Component::Engagement => "Likes and comments per 1,000 views, comments weighted 5x.",
            Component::Consistency => "Sustained performance relative to the record's age.",
            Component::Community => "Share of comments in total engagement; discussion depth.",
            Component::Efficiency => "Views per minute of content.",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned sub-score composition strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringProfile {
    #[default]
    #[serde(alias = "v1")]
    Classic,
    #[serde(alias = "v2")]
    Balanced,
}

const CLASSIC_COMPONENTS: [Component; 5] = Component::ALL;
const BALANCED_COMPONENTS: [Component; 4] = [
    Component::Reach,
    Component::Engagement,
    Component::Consistency,
    Component::Community,
];

impl ScoringProfile {
    /// Components this profile produces, in display order.
    pub fn components(&self) -> &'static [Component] {
        match self {
            ScoringProfile::Classic => &CLASSIC_COMPONENTS,
            ScoringProfile::Balanced => &BALANCED_COMPONENTS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringProfile::Classic => "classic",
            ScoringProfile::Balanced => "balanced",
        }
    }
}

impl FromStr for ScoringProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" | "v1" => Ok(ScoringProfile::Classic),
            "balanced" | "v2" => Ok(ScoringProfile::Balanced),
            other => Err(format!("unknown scoring profile: {other}")),
        }
    }
}

/// Named sub-scores, each in [0,100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub reach: f64,
    pub engagement: f64,
    pub consistency: f64,
    pub community: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

impl ScoreComponents {
    pub fn get(&self, c: Component) -> Option<f64> {
        match c {
            Component::Reach => Some(self.reach),
            Component::Engagement => Some(self.engagement),
            Component::Consistency => Some(self.consistency),
            Component::Community => Some(self.community),
            Component::Efficiency => self.efficiency,
        }
    }

    /// `(component, value)` pairs that are present.
    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        Component::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|v| (c, v)))
    }
}

// --- benchmarks: the rate value each sigmoid maps to 50 ---
const ENGAGEMENT_MIDPOINT: f64 = 40.0;
const ENGAGEMENT_STEEPNESS: f64 = 0.6;
const COMMUNITY_MIDPOINT: f64 = 15.0;
const COMMUNITY_STEEPNESS: f64 = 0.6;
const CLASSIC_CONSISTENCY_MIDPOINT: f64 = 50.0;
const CLASSIC_CONSISTENCY_STEEPNESS: f64 = 0.5;

/// Compute every sub-score of `profile` for one record.
pub fn compute_components(profile: ScoringProfile, m: &RawMetrics, r: &Rates) -> ScoreComponents {
    let reach = reach_score(m);
    let engagement = engagement_score(r);
    let community = community_score(m, r);
    match profile {
        ScoringProfile::Classic => ScoreComponents {
            reach: round1(reach),
            engagement: round1(engagement),
            consistency: round1(classic_consistency_score(m, r)),
            community: round1(community),
            efficiency: Some(round1(efficiency_score(m, r))),
        },
        ScoringProfile::Balanced => ScoreComponents {
            reach: round1(reach),
            engagement: round1(engagement),
            consistency: round1(balanced_consistency_score(m, r)),
            community: round1(community),
            efficiency: None,
        },
    }
}

/// Weighted blend of the components present in `profile`, rounded to one decimal.
/// All-zero weights give 0.
pub fn composite(profile: ScoringProfile, c: &ScoreComponents, w: &WeightVector) -> f64 {
    let parts = profile.components();
    let total = w.total(parts);
    if total <= 0.0 {
        return 0.0;
    }
    let w = w.sanitized();
    let raw: f64 = parts
        .iter()
        .map(|p| c.get(*p).unwrap_or(0.0) * (w.get(*p) / total))
        .sum();
    round1(raw.clamp(0.0, 100.0))
}

pub fn reach_score(m: &RawMetrics) -> f64 {
    if m.views == 0 {
        return 0.0;
    }
    log_scaled(m.views as f64, 2.0, 20.0)
}

pub fn engagement_score(r: &Rates) -> f64 {
    if r.engagement_rate <= 0.0 {
        return 0.0;
    }
    sigmoid(r.engagement_rate, ENGAGEMENT_MIDPOINT, ENGAGEMENT_STEEPNESS)
}

/// Comment share of total engagement (60%) blended with the comment rate (40%).
pub fn community_score(m: &RawMetrics, r: &Rates) -> f64 {
    let total = m.likes + m.comments;
    if total == 0 {
        return 0.0;
    }
    let comment_share = m.comments as f64 / total as f64;
    let index = comment_share * 100.0 * 0.6 + r.comment_rate * 8.0 * 0.4;
    if index <= 0.0 {
        return 0.0;
    }
    sigmoid(index, COMMUNITY_MIDPOINT, COMMUNITY_STEEPNESS)
}

/// Classic age factor: flat for the first week, +20% by day 90, up to +50% after a year.
pub fn classic_age_factor(days: f64) -> f64 {
    if days <= 7.0 {
        1.0
    } else if days <= 90.0 {
        1.0 + (days - 7.0) / 83.0 * 0.2
    } else {
        1.2 + ((days - 90.0) / 275.0).min(0.3)
    }
}

pub fn classic_consistency_score(m: &RawMetrics, r: &Rates) -> f64 {
    let index = r.engagement_rate * classic_age_factor(m.age_days);
    if index <= 0.0 {
        return 0.0;
    }
    sigmoid(
        index,
        CLASSIC_CONSISTENCY_MIDPOINT,
        CLASSIC_CONSISTENCY_STEEPNESS,
    )
}

/// Views per minute of content on a log scale; unknown duration scores 0.
pub fn efficiency_score(m: &RawMetrics, r: &Rates) -> f64 {
    if m.duration_seconds <= 0.0 || m.views == 0 {
        return 0.0;
    }
    log_scaled(r.views_per_minute, 2.0, 25.0)
}

/// Confidence in a record's daily view rate given its age.
///
/// 0.5 on upload day rising to 1.0 at 30 days (too little data before that),
/// flat until 90 days, then up to 1.2 at a year for sustained performance.
pub fn age_confidence(days: f64) -> f64 {
    if days <= 30.0 {
        0.5 + days.max(0.0) / 30.0 * 0.5
    } else if days <= 90.0 {
        1.0
    } else {
        1.0 + ((days - 90.0) / 275.0).min(1.0) * 0.2
    }
}

pub fn balanced_consistency_score(m: &RawMetrics, r: &Rates) -> f64 {
    if r.views_per_day <= 0.0 {
        return 0.0;
    }
    let magnitude = log_scaled(r.views_per_day, 1.0, 25.0);
    (magnitude * age_confidence(m.age_days)).clamp(0.0, 100.0)
}

//! Caller-held weight vector for blending sub-scores, with an optional
//! hot-reloaded file source (`config/weights.json`).
//!
//! JSON shape (every key optional, absent keys take the defaults below;
//! `views` is accepted as an alias of `reach`; sending both is rejected):
//! {
//!   "reach": 35,
//!   "engagement": 20,
//!   "consistency": 15,
//!   "community": 15,
//!   "efficiency": 15
//! }
//!
//! Weights need not sum to 100; the composer renormalizes by the sum.
//! On each `current()` call we check the file's modified time and reload if changed.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::RwLock,
    time::SystemTime,
};
use tracing::{info, warn};

use super::scoring::Component;

pub const DEFAULT_WEIGHTS_PATH: &str = "config/weights.json";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeightsRepr")]
pub struct WeightVector {
    pub reach: f64,
    pub engagement: f64,
    pub consistency: f64,
    pub community: f64,
    pub efficiency: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            reach: 35.0,
            engagement: 20.0,
            consistency: 15.0,
            community: 15.0,
            efficiency: 15.0,
        }
    }
}

/// Wire form: every key optional, `views` standing in for `reach`.
#[derive(Default, Deserialize)]
#[serde(default)]
struct WeightsRepr {
    reach: Option<f64>,
    views: Option<f64>,
    engagement: Option<f64>,
    consistency: Option<f64>,
    community: Option<f64>,
    efficiency: Option<f64>,
}

impl TryFrom<WeightsRepr> for WeightVector {
    type Error = String;

    fn try_from(r: WeightsRepr) -> Result<Self, Self::Error> {
        let reach = match (r.reach, r.views) {
            (Some(_), Some(_)) => {
                return Err("`views` is an alias of `reach`; send only one of them".into())
            }
            (reach, views) => reach.or(views),
        };
        let d = WeightVector::default();
        Ok(Self {
            reach: reach.unwrap_or(d.reach),
            engagement: r.engagement.unwrap_or(d.engagement),
            consistency: r.consistency.unwrap_or(d.consistency),
            community: r.community.unwrap_or(d.community),
            efficiency: r.efficiency.unwrap_or(d.efficiency),
        })
    }
}

impl WeightVector {
    pub fn get(&self, c: Component) -> f64 {
        match c {
            Component::Reach => self.reach,
            Component::Engagement => self.engagement,
            Component::Consistency => self.consistency,
            Component::Community => self.community,
            Component::Efficiency => self.efficiency,
        }
    }

    /// Builder-style override of a single weight (negative values become 0).
    pub fn with(mut self, c: Component, w: f64) -> Self {
        let w = clamp_weight(w);
        match c {
            Component::Reach => self.reach = w,
            Component::Engagement => self.engagement = w,
            Component::Consistency => self.consistency = w,
            Component::Community => self.community = w,
            Component::Efficiency => self.efficiency = w,
        }
        self
    }

    /// Negative or non-finite weights become 0.
    pub fn sanitized(self) -> Self {
        Self {
            reach: clamp_weight(self.reach),
            engagement: clamp_weight(self.engagement),
            consistency: clamp_weight(self.consistency),
            community: clamp_weight(self.community),
            efficiency: clamp_weight(self.efficiency),
        }
    }

    /// Multiply every weight by `k`.
    pub fn scaled(self, k: f64) -> Self {
        Self {
            reach: self.reach * k,
            engagement: self.engagement * k,
            consistency: self.consistency * k,
            community: self.community * k,
            efficiency: self.efficiency * k,
        }
        .sanitized()
    }

    /// Sum of the weights for the given components.
    pub fn total(&self, components: &[Component]) -> f64 {
        components.iter().map(|c| clamp_weight(self.get(*c))).sum()
    }

    /// Share of `c` within `components`, as a rounded percentage for display.
    pub fn normalized_percent(&self, c: Component, components: &[Component]) -> u32 {
        let total = self.total(components);
        if total <= 0.0 || !components.contains(&c) {
            return 0;
        }
        (clamp_weight(self.get(c)) / total * 100.0).round() as u32
    }
}

fn clamp_weight(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

/// Hot-reload wrapper: reloads when the config file mtime changes.
#[derive(Debug)]
pub struct HotReloadWeights {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    weights: WeightVector,
    last_modified: Option<SystemTime>,
}

impl HotReloadWeights {
    /// Create with a path (defaults to "config/weights.json" if `None`).
    /// `fallback` is served until (and unless) the file can be read.
    pub fn new(path: Option<&Path>, fallback: WeightVector) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEIGHTS_PATH));
        Self {
            path,
            inner: RwLock::new(State {
                weights: fallback.sanitized(),
                last_modified: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the latest weights, reloading if the config file changed.
    pub fn current(&self) -> WeightVector {
        let needs_reload = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => {
                let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
                guard.last_modified != Some(mtime)
            }
            // Missing file: keep whatever we have.
            Err(_) => false,
        };

        if !needs_reload {
            return self.inner.read().unwrap_or_else(|e| e.into_inner()).weights;
        }

        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        // Double-check in case of races.
        if let Ok(mtime) = fs::metadata(&self.path).and_then(|m| m.modified()) {
            if guard.last_modified != Some(mtime) {
                match load_weights_file(&self.path) {
                    Ok(w) => {
                        info!(path = %self.path.display(), ?w, "weights reloaded");
                        guard.weights = w;
                    }
                    Err(e) => {
                        warn!(path = %self.path.display(), error = %e, "weights file rejected; keeping previous");
                    }
                }
                // Remember the mtime either way so a broken file is not re-parsed on every call.
                guard.last_modified = Some(mtime);
            }
        }
        guard.weights
    }
}

/// Load weights directly (no caching). Public for tests/tools.
pub fn load_weights_file(path: &Path) -> io::Result<WeightVector> {
    let bytes = fs::read(path)?;
    let w: WeightVector = serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(w.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Write, thread, time::Duration};

    #[test]
    fn views_and_reach_together_are_rejected() {
        let err = serde_json::from_str::<WeightVector>(r#"{"views": 50, "reach": 10}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("alias of `reach`"), "{err}");
    }

    #[test]
    fn absent_keys_take_defaults_and_views_aliases_reach() {
        let w: WeightVector = serde_json::from_str(r#"{"views": 50, "community": 0}"#).unwrap();
        assert_eq!(w.reach, 50.0);
        assert_eq!(w.community, 0.0);
        assert_eq!(w.engagement, WeightVector::default().engagement);
    }

    #[test]
    fn negative_weights_are_clamped() {
        let w = WeightVector::default().with(Component::Reach, -10.0);
        assert_eq!(w.reach, 0.0);
        let w = WeightVector {
            engagement: f64::NAN,
            ..WeightVector::default()
        }
        .sanitized();
        assert_eq!(w.engagement, 0.0);
    }

    #[test]
    fn normalized_percent_uses_only_listed_components() {
        let w = WeightVector::default();
        let five = Component::ALL;
        assert_eq!(w.normalized_percent(Component::Reach, &five), 35);
        let four = [
            Component::Reach,
            Component::Engagement,
            Component::Consistency,
            Component::Community,
        ];
        // 35 / 85
        assert_eq!(w.normalized_percent(Component::Reach, &four), 41);
        assert_eq!(w.normalized_percent(Component::Efficiency, &four), 0);
    }

    #[test]
    fn loads_and_hot_reloads() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("weights.json");

        {
            let mut f = fs::File::create(&path).unwrap();
            write!(f, r#"{{"reach":10,"engagement":20}}"#).unwrap();
            f.sync_all().unwrap();
        }

        let hot = HotReloadWeights::new(Some(path.as_path()), WeightVector::default());
        let w1 = hot.current();
        assert_eq!(w1.reach, 10.0);
        assert_eq!(w1.engagement, 20.0);
        assert_eq!(w1.efficiency, 15.0);

        // Ensure different mtime (some filesystems have coarse granularity).
        thread::sleep(Duration::from_millis(1100));

        {
            let mut f = fs::File::create(&path).unwrap();
            write!(f, r#"{{"reach":1,"engagement":1,"consistency":1,"community":1,"efficiency":1}}"#)
                .unwrap();
            f.sync_all().unwrap();
        }

        let w2 = hot.current();
        assert_eq!(w2.reach, 1.0);
        assert_eq!(w2.efficiency, 1.0);
    }

    #[test]
    fn missing_file_serves_fallback() {
        let tmpdir = tempfile::tempdir().unwrap();
        let fallback = WeightVector::default().with(Component::Reach, 99.0);
        let hot = HotReloadWeights::new(Some(tmpdir.path().join("nope.json").as_path()), fallback);
        assert_eq!(hot.current(), fallback);
    }
}

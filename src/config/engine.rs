// src/config/engine.rs
//! Engine settings from `config/engine.toml`:
//!
//! ```toml
//! bind_addr = "0.0.0.0:8080"
//! profile = "classic"            # or "balanced"
//! weights_path = "config/weights.json"
//!
//! [weights]
//! reach = 35
//! engagement = 20
//! ```
//!
//! `[weights]` are the fallback served until the hot-reloaded weights file loads.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::analyze::{ScoringProfile, WeightVector};

pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub profile: ScoringProfile,
    #[serde(default)]
    pub weights: WeightVector,
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            profile: ScoringProfile::default(),
            weights: WeightVector::default(),
            weights_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(s).context("parsing engine config TOML")?;
        cfg.weights = cfg.weights.sanitized();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// `ENGINE_CONFIG_PATH` if set (must exist), else `config/engine.toml` if
    /// present, else defaults.
    pub fn from_env() -> Result<Self> {
        match env::var(ENV_ENGINE_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(p),
            Err(_) if Path::new(DEFAULT_ENGINE_CONFIG_PATH).exists() => {
                Self::load_from_file(DEFAULT_ENGINE_CONFIG_PATH)
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn partial_weights_and_profile_parse() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            profile = "balanced"
            weights_path = "w.json"

            [weights]
            views = 50
            community = -3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.profile, ScoringProfile::Balanced);
        assert_eq!(cfg.weights.reach, 50.0);
        assert_eq!(cfg.weights.community, 0.0);
        assert_eq!(cfg.weights.engagement, 20.0);
        assert_eq!(cfg.weights_path, Some(PathBuf::from("w.json")));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        assert!(EngineConfig::from_toml_str(r#"profile = "v3""#).is_err());
    }

    #[test]
    #[serial]
    fn env_path_override_is_used() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "bind_addr = \"127.0.0.1:9999\"").unwrap();
        std::env::set_var(ENV_ENGINE_CONFIG_PATH, f.path());
        let cfg = EngineConfig::from_env().unwrap();
        std::env::remove_var(ENV_ENGINE_CONFIG_PATH);
        assert_eq!(cfg.bind_addr, "127.0.0.1:9999");
    }
}

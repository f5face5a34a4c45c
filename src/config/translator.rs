// src/config/translator.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_TRANSLATOR_CONFIG_PATH: &str = "config/translator.json";
pub const ENV_TRANSLATOR_CONFIG_PATH: &str = "TRANSLATOR_CONFIG_PATH";

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "openai" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Any OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranslatorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading translator config {}", path.display()))?;
        let mut cfg: TranslatorConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing translator config {}", path.display()))?;

        cfg.provider = cfg.provider.trim().to_lowercase();
        cfg.base_url = cfg.base_url.trim_end_matches('/').to_string();

        // Resolve api key if "ENV" (only needed when the translator will run)
        if cfg.enabled && cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                "mock" => String::new(),
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }

        Ok(cfg)
    }

    /// `TRANSLATOR_CONFIG_PATH` or `config/translator.json`; a missing default
    /// file yields a disabled translator.
    pub fn from_env() -> anyhow::Result<Self> {
        match env::var(ENV_TRANSLATOR_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(p),
            Err(_) if Path::new(DEFAULT_TRANSLATOR_CONFIG_PATH).exists() => {
                Self::load_from_file(DEFAULT_TRANSLATOR_CONFIG_PATH)
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

    fn write_tmp(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn missing_keys_take_defaults() {
        let f = write_tmp(r#"{"enabled": true, "provider": "MOCK"}"#);
        let cfg = TranslatorConfig::load_from_file(f.path()).unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.provider, "mock");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    #[serial]
    fn env_api_key_is_resolved() {
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        let f = write_tmp(
            r#"{"enabled": true, "provider": "openai", "api_key": "ENV", "base_url": "http://localhost:9/v1/"}"#,
        );
        let cfg = TranslatorConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.base_url, "http://localhost:9/v1");
        std::env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    #[serial]
    fn env_api_key_missing_is_an_error() {
        std::env::remove_var("OPENAI_API_KEY");
        let f = write_tmp(r#"{"enabled": true, "provider": "openai", "api_key": "env"}"#);
        assert!(TranslatorConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    #[serial]
    fn disabled_config_does_not_need_the_key() {
        std::env::remove_var("OPENAI_API_KEY");
        let f = write_tmp(r#"{"enabled": false, "provider": "openai", "api_key": "ENV"}"#);
        let cfg = TranslatorConfig::load_from_file(f.path()).unwrap();
        assert!(!cfg.enabled);
    }

    #[test]
    fn unknown_provider_with_env_key_is_rejected() {
        let f = write_tmp(r#"{"enabled": true, "provider": "claude", "api_key": "ENV"}"#);
        assert!(TranslatorConfig::load_from_file(f.path()).is_err());
    }
}

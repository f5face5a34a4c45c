//! Natural-language translator boundary and the `ask` pipeline.
//!
//! The translator is a black box that turns a question into text which should
//! contain a JSON query. Nothing it returns is trusted: the text goes through
//! `query::extract`, `query::validate` and only then `query::execute`.
//!
//! Provider selection (`build_translator`):
//! * `TRANSLATOR_TEST_MODE=mock` -> deterministic mock;
//! * `enabled == false`          -> disabled (every call fails with `Disabled`);
//! * `provider == "mock"`        -> mock;
//! * `provider == "openai"`      -> OpenAI-compatible chat completions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyze::ScoredRecord;
use crate::config::TranslatorConfig;
use crate::query::fields::KNOWN_FIELDS;
use crate::query::{self, QueryError, QueryResult};

/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translator is disabled")]
    Disabled,
    #[error("translator unavailable: {0}")]
    Unavailable(String),
    #[error("translator returned an empty response")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("invalid question: {0}")]
    InvalidQuestion(&'static str),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Question -> raw model text (expected to contain one JSON object).
    async fn translate(&self, question: &str) -> Result<String, TranslateError>;
    /// Provider name for logs and metrics labels.
    fn name(&self) -> &'static str;
}

pub type DynTranslator = Arc<dyn Translator>;

/// Every call fails; used when no provider is configured.
pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(&self, _question: &str) -> Result<String, TranslateError> {
        Err(TranslateError::Disabled)
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns the same text for every question.
#[derive(Clone)]
pub struct MockTranslator {
    pub fixed: String,
}

pub const MOCK_RESPONSE: &str = r#"{"sort": {"field": "score", "order": "desc"}, "limit": 10, "explanation": "Top videos by overall score (mock)"}"#;

impl Default for MockTranslator {
    fn default() -> Self {
        Self {
            fixed: MOCK_RESPONSE.to_string(),
        }
    }
}

impl MockTranslator {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, _question: &str) -> Result<String, TranslateError> {
        Ok(self.fixed.clone())
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiTranslator {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiTranslator {
    pub fn new(cfg: &TranslatorConfig) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("video-score-engine/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| TranslateError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate(&self, question: &str) -> Result<String, TranslateError> {
        if self.api_key.is_empty() {
            return Err(TranslateError::Unavailable("missing API key".into()));
        }

        let req = ChatReq {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT.as_str(),
                },
                Msg {
                    role: "user",
                    content: question,
                },
            ],
            temperature: 0.1,
            max_tokens: 500,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| TranslateError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TranslateError::Unavailable(format!("HTTP {status}")));
        }
        let body: ChatResp = resp
            .json()
            .await
            .map_err(|e| TranslateError::Unavailable(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            Err(TranslateError::Empty)
        } else {
            Ok(text)
        }
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Build a translator from config and environment.
pub fn build_translator(cfg: &TranslatorConfig) -> DynTranslator {
    if std::env::var("TRANSLATOR_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockTranslator::default());
    }

    if !cfg.enabled {
        return Arc::new(DisabledTranslator);
    }

    match cfg.provider.as_str() {
        "mock" => Arc::new(MockTranslator::default()),
        "openai" => match OpenAiTranslator::new(cfg) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                warn!(target: "translate", error = %e, "could not build OpenAI client; translator disabled");
                Arc::new(DisabledTranslator)
            }
        },
        other => {
            warn!(target: "translate", provider = other, "unknown translator provider; translator disabled");
            Arc::new(DisabledTranslator)
        }
    }
}

/// System prompt describing the field vocabulary, operators and examples.
pub static SYSTEM_PROMPT: Lazy<String> = Lazy::new(|| {
    let mut p = String::from(
        "You are a query translator for a video analytics app. Convert natural language \
         questions about videos into structured JSON queries.\n\nAvailable video fields:\n",
    );
    for (path, ty, desc) in KNOWN_FIELDS {
        p.push_str(&format!("- {path}: {ty} ({desc})\n"));
    }
    p.push_str(
        r#"
Output a JSON object with this structure:
{
  "filters": { "fieldName": { "operator": value } },
  "sort": { "field": "fieldName", "order": "asc" | "desc" },
  "limit": number,
  "explanation": "Brief explanation of what this query does"
}

Operators: "eq", "gt", "gte", "lt", "lte", "contains" (for text fields)

Examples:
- "most viewed video" -> { "sort": { "field": "views", "order": "desc" }, "limit": 1, "explanation": "Video with the highest view count" }
- "videos from last week" -> { "filters": { "days": { "lte": 7 } }, "explanation": "All videos uploaded in the last 7 days" }
- "videos over 1 million views" -> { "filters": { "views": { "gte": 1000000 } }, "explanation": "All videos with 1M+ views" }
- "longest video" -> { "sort": { "field": "duration", "order": "desc" }, "limit": 1, "explanation": "Video with the longest duration" }
- "oldest videos" -> { "sort": { "field": "days", "order": "desc" }, "explanation": "Videos sorted by age, oldest first" }
- "newest videos" -> { "sort": { "field": "days", "order": "asc" }, "explanation": "Videos sorted by age, newest first" }
- "hidden gems" -> { "sort": { "field": "views", "order": "asc" }, "limit": 20, "explanation": "Videos with the lowest views" }
- "high engagement low views" -> { "sort": { "field": "rates.engagementRate", "order": "desc" }, "filters": { "views": { "lt": 100000 } }, "limit": 20, "explanation": "High engagement videos with under 100K views" }

Time references:
- "today" = days == 0
- "yesterday" = days == 1
- "recent" or "last week" = days <= 7
- "last month" = days <= 30
- "last year" = days <= 365

Output ONLY valid JSON, no markdown, no text outside the JSON."#,
    );
    p
});

/// Non-empty after trimming and at most `MAX_QUESTION_CHARS` characters.
pub fn validate_question(question: &str) -> Result<&str, AskError> {
    let q = question.trim();
    if q.is_empty() {
        return Err(AskError::InvalidQuestion("question is empty"));
    }
    if q.chars().count() > MAX_QUESTION_CHARS {
        return Err(AskError::InvalidQuestion("question exceeds 500 characters"));
    }
    Ok(q)
}

/// Short anonymized id so questions never reach the logs verbatim.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// question -> translator -> extract -> validate -> execute.
pub async fn ask(
    translator: &dyn Translator,
    question: &str,
    records: &[ScoredRecord],
) -> Result<QueryResult, AskError> {
    let question = validate_question(question)?;
    let id = anon_hash(question);
    let provider = translator.name();

    let text = match translator.translate(question).await {
        Ok(t) => {
            counter!("translator_calls_total", "provider" => provider, "outcome" => "ok")
                .increment(1);
            t
        }
        Err(e) => {
            counter!("translator_calls_total", "provider" => provider, "outcome" => "error")
                .increment(1);
            warn!(target: "translate", %id, provider, error = %e, "translator call failed");
            return Err(e.into());
        }
    };
    debug!(target: "translate", %id, provider, chars = text.len(), "translator replied");

    let result = query::run_query_text(records, &text).inspect_err(|e| {
        info!(target: "translate", %id, kind = e.kind(), error = %e, "translator output rejected");
    })?;
    info!(
        target: "translate",
        %id,
        provider,
        total = result.total,
        returned = result.records.len(),
        "question answered"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{score_metrics, RawMetrics, ScoringProfile, WeightVector};
    use serial_test::serial;

    fn records() -> Vec<ScoredRecord> {
        let w = WeightVector::default();
        vec![
            score_metrics("a", "small", RawMetrics::new(900, 40, 5, 20.0, 240.0), ScoringProfile::Classic, &w),
            score_metrics("b", "big", RawMetrics::new(2_000_000, 90_000, 4_000, 60.0, 600.0), ScoringProfile::Classic, &w),
        ]
    }

    #[test]
    fn question_bounds() {
        assert!(matches!(validate_question("   "), Err(AskError::InvalidQuestion(_))));
        assert!(validate_question(&"x".repeat(500)).is_ok());
        assert!(validate_question(&"x".repeat(501)).is_err());
        // counted in characters, not bytes
        assert!(validate_question(&"é".repeat(500)).is_ok());
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("most viewed video");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("most viewed video"));
        assert_ne!(a, anon_hash("least viewed video"));
    }

    #[test]
    fn prompt_lists_fields_and_operators() {
        assert!(SYSTEM_PROMPT.contains("- views: number"));
        assert!(SYSTEM_PROMPT.contains("rates.engagementRate"));
        assert!(SYSTEM_PROMPT.contains("\"contains\""));
    }

    #[tokio::test]
    async fn mock_answers_with_top_by_score() {
        let r = ask(&MockTranslator::default(), "best videos?", &records())
            .await
            .unwrap();
        assert_eq!(r.records[0].id, "b");
        assert_eq!(r.records.len(), 2);
        assert!(r.explanation.unwrap().contains("mock"));
    }

    #[tokio::test]
    async fn disabled_translator_is_a_translate_error() {
        let err = ask(&DisabledTranslator, "anything", &records()).await.unwrap_err();
        assert!(matches!(err, AskError::Translate(TranslateError::Disabled)));
    }

    #[tokio::test]
    async fn prose_without_json_is_extraction_error() {
        let t = MockTranslator::new("Sorry, I cannot help with that.");
        let err = ask(&t, "anything", &records()).await.unwrap_err();
        assert!(matches!(err, AskError::Query(QueryError::Extraction)));
    }

    #[test]
    #[serial]
    fn test_mode_env_forces_mock() {
        std::env::set_var("TRANSLATOR_TEST_MODE", "mock");
        let t = build_translator(&TranslatorConfig::default());
        std::env::remove_var("TRANSLATOR_TEST_MODE");
        assert_eq!(t.name(), "mock");
    }

    #[test]
    #[serial]
    fn disabled_config_builds_disabled() {
        std::env::remove_var("TRANSLATOR_TEST_MODE");
        let t = build_translator(&TranslatorConfig::default());
        assert_eq!(t.name(), "disabled");
        let cfg = TranslatorConfig {
            enabled: true,
            provider: "openai".into(),
            ..TranslatorConfig::default()
        };
        assert_eq!(build_translator(&cfg).name(), "openai");
    }
}

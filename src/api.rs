use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::analyze::{
    self, rank_by_score, score_batch, HotReloadWeights, ScoreExplanation, ScoredRecord,
    ScoringProfile, WeightVector,
};
use crate::config::{EngineConfig, TranslatorConfig};
use crate::ingest::{normalize_records, VideoRecord};
use crate::query::{self, QueryError, QueryResult};
use crate::translate::{self, build_translator, AskError, DynTranslator};

#[derive(Clone)]
pub struct AppState {
    pub profile: ScoringProfile,
    pub weights: Arc<HotReloadWeights>,
    pub translator: DynTranslator,
}

impl AppState {
    pub fn new(
        profile: ScoringProfile,
        weights: HotReloadWeights,
        translator: DynTranslator,
    ) -> Self {
        Self {
            profile,
            weights: Arc::new(weights),
            translator,
        }
    }

    pub fn from_config(engine: &EngineConfig, translator: &TranslatorConfig) -> Self {
        let weights = HotReloadWeights::new(engine.weights_path.as_deref(), engine.weights);
        Self::new(engine.profile, weights, build_translator(translator))
    }

    /// Request overrides win; otherwise server profile and the hot-reloaded weights.
    fn scoring(
        &self,
        profile: Option<ScoringProfile>,
        weights: Option<WeightVector>,
    ) -> (ScoringProfile, WeightVector) {
        (
            profile.unwrap_or(self.profile),
            weights
                .map(WeightVector::sanitized)
                .unwrap_or_else(|| self.weights.current()),
        )
    }

    /// Normalize, score and rank input records (best first).
    fn score(
        &self,
        records: Vec<VideoRecord>,
        profile: Option<ScoringProfile>,
        weights: Option<WeightVector>,
    ) -> (Vec<ScoredRecord>, usize) {
        let (profile, weights) = self.scoring(profile, weights);
        let (records, dropped) = normalize_records(records);
        let scored = rank_by_score(score_batch(&records, profile, &weights, Utc::now()));
        (scored, dropped)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/weights", get(current_weights))
        .route("/score", post(score))
        .route("/explain", post(explain))
        .route("/query", post(run_query))
        .route("/ask", post(ask))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---- errors ----

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Ask(#[from] AskError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Query(e) | ApiError::Ask(AskError::Query(e)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "could not understand the question", "detail": e.to_string() }),
            ),
            ApiError::Ask(AskError::InvalidQuestion(m)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid question", "detail": m }),
            ),
            ApiError::Ask(AskError::Translate(e)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "translator unavailable", "detail": e.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ---- handlers ----

#[derive(Serialize)]
struct WeightsResp {
    profile: ScoringProfile,
    weights: WeightVector,
    /// Normalized share per component of the active profile, in percent.
    percentages: BTreeMap<&'static str, u32>,
}

async fn current_weights(State(state): State<AppState>) -> Json<WeightsResp> {
    let weights = state.weights.current();
    let components = state.profile.components();
    let percentages = components
        .iter()
        .map(|c| (c.as_str(), weights.normalized_percent(*c, components)))
        .collect();
    Json(WeightsResp {
        profile: state.profile,
        weights,
        percentages,
    })
}

#[derive(Deserialize)]
struct ScoreReq {
    records: Vec<VideoRecord>,
    #[serde(default)]
    weights: Option<WeightVector>,
    #[serde(default)]
    profile: Option<ScoringProfile>,
}

#[derive(Serialize)]
struct ScoreResp {
    records: Vec<ScoredRecord>,
    /// Inputs discarded for a blank or duplicate id.
    dropped: usize,
}

async fn score(State(state): State<AppState>, Json(body): Json<ScoreReq>) -> Json<ScoreResp> {
    let (records, dropped) = state.score(body.records, body.profile, body.weights);
    debug!(target: "api", scored = records.len(), dropped, "score");
    Json(ScoreResp { records, dropped })
}

#[derive(Deserialize)]
struct ExplainReq {
    record: VideoRecord,
    #[serde(default)]
    weights: Option<WeightVector>,
    #[serde(default)]
    profile: Option<ScoringProfile>,
}

async fn explain(
    State(state): State<AppState>,
    Json(body): Json<ExplainReq>,
) -> Json<ScoreExplanation> {
    let (profile, weights) = state.scoring(body.profile, body.weights);
    let scored = analyze::score_record(&body.record, profile, &weights, Utc::now());
    Json(analyze::explain(&scored, &weights))
}

#[derive(Deserialize)]
struct QueryReq {
    records: Vec<VideoRecord>,
    /// A query object, or raw translator text containing one.
    query: Value,
    #[serde(default)]
    weights: Option<WeightVector>,
    #[serde(default)]
    profile: Option<ScoringProfile>,
}

async fn run_query(
    State(state): State<AppState>,
    Json(body): Json<QueryReq>,
) -> Result<Json<QueryResult>, ApiError> {
    let (records, _) = state.score(body.records, body.profile, body.weights);
    let result = match &body.query {
        Value::String(text) => query::run_query_text(&records, text)?,
        other => {
            let q = query::validate(other).inspect_err(|e| {
                metrics::counter!("queries_rejected_total", "kind" => e.kind()).increment(1);
            })?;
            query::execute(&records, &q)
        }
    };
    info!(target: "api", total = result.total, returned = result.records.len(), "query");
    Ok(Json(result))
}

#[derive(Deserialize)]
struct AskReq {
    records: Vec<VideoRecord>,
    question: String,
    #[serde(default)]
    weights: Option<WeightVector>,
    #[serde(default)]
    profile: Option<ScoringProfile>,
}

async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskReq>,
) -> Result<Json<QueryResult>, ApiError> {
    let (records, _) = state.score(body.records, body.profile, body.weights);
    let result = translate::ask(state.translator.as_ref(), &body.question, &records).await?;
    Ok(Json(result))
}

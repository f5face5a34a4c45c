//! Video score engine, binary entrypoint.
//! Boots the Axum HTTP server: config, tracing, Prometheus recorder, routes.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use video_score_engine::api::{self, AppState};
use video_score_engine::config::{EngineConfig, TranslatorConfig};
use video_score_engine::metrics::Metrics;

/// `RUST_LOG` filter (default `video_score_engine=info,warn`), compact output,
/// or JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("video_score_engine=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let engine = EngineConfig::from_env().context("loading engine config")?;
    let translator = TranslatorConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "translator config unusable; translator disabled");
        TranslatorConfig::default()
    });

    let metrics = Metrics::init(engine.profile).context("installing Prometheus recorder")?;

    let state = AppState::from_config(&engine, &translator);
    info!(
        profile = engine.profile.as_str(),
        translator = state.translator.name(),
        weights_path = %state.weights.path().display(),
        "engine configured"
    );

    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&engine.bind_addr)
        .await
        .with_context(|| format!("binding {}", engine.bind_addr))?;
    info!(addr = %engine.bind_addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

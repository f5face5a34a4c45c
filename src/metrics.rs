use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::analyze::ScoringProfile;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the engine's series.
    /// Fails if a recorder is already installed in this process.
    pub fn init(profile: ScoringProfile) -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();

        // Which profile the server scores with by default (1 = active).
        gauge!("scoring_profile_active", "profile" => profile.as_str()).set(1.0);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("records_scored_total", "Records passed through the score composer");
    describe_counter!("queries_executed_total", "Validated queries executed");
    describe_counter!(
        "queries_rejected_total",
        "Translator outputs rejected, by kind (extraction|schema)"
    );
    describe_counter!(
        "translator_calls_total",
        "Translator calls by provider and outcome (ok|error)"
    );
    describe_counter!("ingest_records_kept_total", "Input records kept after normalization");
    describe_counter!(
        "ingest_records_dropped_total",
        "Input records dropped for a blank or duplicate id"
    );
}

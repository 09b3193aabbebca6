//! Sprain/Strain Knowledge API Server
//!
//! Natural-language questions over the injury graph, fuzzy scoring of
//! clinical indicators, case evaluation and alert management.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
mod routes;

pub use config::AppConfig;
pub use error::{ApiError, ServerError};

use alerting::{AlertStore, RuleSet};
use graph_store::{GraphStore, Neo4jHttpStore};
use nl_query::{LanguageModel, LlmTranslator, OllamaModel, QaPipeline, QueryProfile};
use scoring::{CaseEvaluator, FuzzyScorer, GraphAlertStore, GraphSlotRepository};

/// Application state shared across handlers
pub struct AppState {
    /// Q&A pipelines by profile name
    pub pipelines: BTreeMap<String, QaPipeline>,
    pub store: Arc<dyn GraphStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub scorer: FuzzyScorer,
    pub evaluator: CaseEvaluator,
    /// Default minimum `mu` for the relation listing
    pub relation_threshold: f64,
    pub cors_origins: Vec<String>,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Wire the components around the given collaborators
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn GraphStore>,
        model: Arc<dyn LanguageModel>,
        alerts: Arc<dyn AlertStore>,
    ) -> Result<Self, ServerError> {
        let mut pipelines = BTreeMap::new();
        for name in [QueryProfile::CLINICAL, QueryProfile::MONITORING] {
            let profile = config
                .profile(name)
                .ok_or_else(|| ServerError::UnknownProfile(name.to_string()))?;
            let translator = Arc::new(LlmTranslator::new(model.clone(), profile.instructions.clone()));

            let mut pipeline = QaPipeline::new(profile, translator, store.clone());
            if config.qa.synthesize_answers {
                pipeline = pipeline.with_answers(model.clone());
            }
            pipelines.insert(name.to_string(), pipeline);
        }

        let rules = RuleSet::sprain_defaults(
            config.rules.severe_pain_threshold,
            config.rules.low_improvement_threshold,
        );
        let slots = Arc::new(GraphSlotRepository::new(store.clone()));

        Ok(Self {
            pipelines,
            scorer: FuzzyScorer::new(store.clone()),
            evaluator: CaseEvaluator::new(slots, alerts.clone(), rules),
            store,
            alerts,
            relation_threshold: config.qa.relation_threshold,
            cors_origins: config.server.cors_origins.clone(),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        })
    }

    /// Connect to the configured graph database and model server
    pub fn connect(config: &AppConfig) -> Result<Self, ServerError> {
        info!("Graph endpoint: {:?}", config.graph);
        let store: Arc<dyn GraphStore> = Arc::new(Neo4jHttpStore::new(config.graph.clone())?);
        let model: Arc<dyn LanguageModel> = Arc::new(OllamaModel::new(config.model.clone())?);
        let alerts: Arc<dyn AlertStore> = Arc::new(GraphAlertStore::new(store.clone()));

        Self::new(config, store, model, alerts)
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn pipeline(&self, profile: &str) -> Option<&QaPipeline> {
        self.pipelines.get(profile)
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub profiles: Vec<String>,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        // Natural-language questions
        .route("/query", get(routes::query::ask_clinical))
        .route("/query_clinico", get(routes::query::ask_clinical))
        .route("/query_monitoreo", get(routes::query::ask_monitoring))
        .route("/api/v1/query/:profile", get(routes::query::ask_profile))
        // Fuzzy scoring and cases
        .route("/fuzzy", post(routes::fuzzy::score))
        .route("/api/v1/fuzzy", post(routes::fuzzy::score))
        .route("/api/v1/cases/:case_id/evaluate", post(routes::cases::evaluate))
        .route("/api/v1/cases/:case_id/slots/:slot", put(routes::cases::update_slot))
        .route("/api/v1/relations", get(routes::relations::list_relations))
        // Rules and alerts
        .route("/regla_dolor", get(routes::rules::run_symptom_rules))
        .route("/api/v1/rules/symptoms", post(routes::rules::run_symptom_rules))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:code/resolve", post(routes::alerts::resolve_alert))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        profiles: state.pipelines.keys().cloned().collect(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    metrics::describe_counter!("queries_total", "Natural-language questions received");
    metrics::describe_counter!("query_failures_total", "Questions that failed in translation, query or answer");
    metrics::describe_counter!("fuzzy_scores_total", "Fuzzy scoring requests served");
    metrics::describe_counter!("alerts_fired_total", "Alert rule firings");

    Ok(handle)
}

/// Initialize logging
pub fn init_logging(config: &config::LoggingConfig) -> Result<(), ServerError> {
    let level: Level = config.level.parse().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| ServerError::Logging(e.to_string()))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let state = AppState::connect(&config)?.with_metrics(install_metrics()?);
    let app = create_router(Arc::new(state));

    let addr = config.server.addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! HTTP API gateway for Vesta.
//!
//! Exposes the decision router to voice front-ends and diagnostics:
//! routing, user switches, recent decisions and statistics.
//!
//! Built on Axum.

use axum::extract::{DefaultBodyLimit, Query};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use vesta_config::AppConfig;
use vesta_core::error::PreferenceError;
use vesta_core::route::RouteResponse;
use vesta_core::utterance::SessionId;
use vesta_engine::{CacheStats, DecisionRouter};
use vesta_telemetry::{DecisionRecord, DecisionStats};

/// Memory cleanup cadence while the gateway runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Shared application state for the gateway.
pub struct GatewayState {
    pub router: Arc<DecisionRouter>,
    /// Session used when a request carries none
    pub default_session: SessionId,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl GatewayState {
    pub fn new(router: Arc<DecisionRouter>) -> Self {
        Self {
            router,
            default_session: SessionId::new(),
            started_at: chrono::Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_app(state: SharedState) -> Router {
    let v1 = Router::new()
        .route("/route", post(route_handler))
        .route("/user-switch", post(user_switch_handler))
        .route("/decisions", get(decisions_handler))
        .route("/stats", get(stats_handler));

    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = Arc::new(vesta_engine::build_router(&config).await);
    let cleanup = router
        .memory()
        .clone()
        .spawn_cleanup(CLEANUP_INTERVAL, config.memory.retention_days);

    let app = build_app(Arc::new(GatewayState::new(router)));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let served = axum::serve(listener, app).await;
    cleanup.abort();
    served?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    generative: bool,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        generative: state.router.generative_enabled(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Deserialize)]
struct RouteRequest {
    text: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn route_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RouteRequest>,
) -> Json<RouteResponse> {
    let session = payload
        .session_id
        .filter(|s| !s.trim().is_empty())
        .map(SessionId::from)
        .unwrap_or_else(|| state.default_session.clone());

    Json(state.router.route(&payload.text, &session).await)
}

#[derive(Deserialize)]
struct UserSwitchRequest {
    user_id: String,
}

#[derive(Serialize)]
struct UserSwitchResponse {
    user_id: String,
    name: String,
}

async fn user_switch_handler(
    State(state): State<SharedState>,
    Json(payload): Json<UserSwitchRequest>,
) -> Result<Json<UserSwitchResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.router.on_user_switch(&payload.user_id).await {
        Ok(snapshot) => Ok(Json(UserSwitchResponse {
            user_id: payload.user_id,
            name: snapshot.name.clone(),
        })),
        Err(e @ PreferenceError::NotFound(_)) => Err(error(StatusCode::NOT_FOUND, e.to_string())),
        Err(e) => {
            warn!(error = %e, "User switch failed");
            Err(error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

#[derive(Deserialize)]
struct DecisionsQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    session_id: Option<String>,
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
struct DecisionsResponse {
    decisions: Vec<DecisionRecord>,
    count: usize,
}

async fn decisions_handler(
    State(state): State<SharedState>,
    Query(query): Query<DecisionsQuery>,
) -> Json<DecisionsResponse> {
    let log = state.router.decisions();
    let decisions = match &query.session_id {
        Some(session) => log.for_session(session, query.limit),
        None => log.recent(query.limit),
    };
    Json(DecisionsResponse {
        count: decisions.len(),
        decisions,
    })
}

#[derive(Serialize)]
struct StatsResponse {
    decisions: DecisionStats,
    cache: CacheStats,
    memory_backend: String,
    generative: bool,
}

async fn stats_handler(State(state): State<SharedState>) -> Json<StatsResponse> {
    let router = &state.router;
    Json(StatsResponse {
        decisions: router.decisions().stats(),
        cache: router.cache().stats(),
        memory_backend: router.memory().backend().to_string(),
        generative: router.generative_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn test_state() -> SharedState {
        let mut config = AppConfig::default();
        config.generative.enabled = false;
        config.memory.backend = "in_memory".into();
        let router = vesta_engine::build_router(&config).await;
        Arc::new(GatewayState::new(Arc::new(router)))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_app(test_state().await);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn route_requires_json_body() {
        let app = build_app(test_state().await);

        let req = Request::builder()
            .method("POST")
            .uri("/v1/route")
            .header("content-type", "application/json")
            .body(Body::from("{\"session_id\": \"s\"}"))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::api::{
    ApiAnalyticsResponse, ApiError, ApiHealthResponse, ApiInfluencerRow, ApiListParams,
    ApiListResponse, ApiOverviewResponse,
};
use pawrank::config::PipelineConfig;
use pawrank::sources::{FileSourceLoader, SourceLoader};
use pawrank::{CanonicalInfluencer, Dashboard, Pipeline};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<RwLock<Arc<Dashboard>>>,
    pipeline: Arc<Pipeline>,
    loader: Arc<dyn SourceLoader>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, loader: Arc<dyn SourceLoader>) -> Self {
        let dashboard = pipeline.build(loader.as_ref());
        Self {
            dashboard: Arc::new(RwLock::new(Arc::new(dashboard))),
            pipeline: Arc::new(pipeline),
            loader,
        }
    }

    async fn snapshot(&self) -> Arc<Dashboard> {
        self.dashboard.read().await.clone()
    }

    /// Rebuilds from the loader off the async runtime, then swaps the snapshot.
    async fn reload(&self) -> Result<Arc<Dashboard>, String> {
        let pipeline = self.pipeline.clone();
        let loader = self.loader.clone();
        let rebuilt = tokio::task::spawn_blocking(move || pipeline.build(loader.as_ref()))
            .await
            .map_err(|err| format!("reload task failed: {}", err))?;
        let rebuilt = Arc::new(rebuilt);
        *self.dashboard.write().await = rebuilt.clone();
        Ok(rebuilt)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/overview", get(overview))
        .route("/api/influencers", get(list_influencers))
        .route("/api/influencers/:id", get(influencer_detail))
        .route("/api/influencers/:id/analytics", get(influencer_analytics))
        .route("/api/reload", post(reload))
        .with_state(state)
}

pub async fn serve(args: crate::ServeArgs, config: PipelineConfig) -> Result<(), String> {
    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let web_root = args.web_root.or(config.server.web_root);

    let loader: Arc<dyn SourceLoader> = Arc::new(FileSourceLoader::new(config.sources));
    let pipeline = Pipeline::from_config(&config.identity);
    let state = tokio::task::spawn_blocking(move || AppState::new(pipeline, loader))
        .await
        .map_err(|err| format!("initial build failed: {}", err))?;

    let mut app = router(state);
    if let Some(web_root) = web_root {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        let static_service =
            ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
        app = app.fallback_service(static_service);
    }

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    info!(%addr, "serving influencer dashboard");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health(State(state): State<AppState>) -> Json<ApiHealthResponse> {
    let dashboard = state.snapshot().await;
    Json(ApiHealthResponse {
        status: "ok",
        influencers: dashboard.len(),
        built_at: dashboard.built_at.to_rfc3339(),
    })
}

async fn overview(State(state): State<AppState>) -> Json<ApiOverviewResponse> {
    let dashboard = state.snapshot().await;
    Json(ApiOverviewResponse {
        overview: dashboard.overview(),
        built_at: dashboard.built_at.to_rfc3339(),
    })
}

async fn list_influencers(
    State(state): State<AppState>,
    Query(params): Query<ApiListParams>,
) -> ApiResult<ApiListResponse> {
    let query = params.into_query().map_err(bad_request)?;
    let dashboard = state.snapshot().await;
    let influencers: Vec<ApiInfluencerRow> = dashboard
        .query(&query)
        .into_iter()
        .map(ApiInfluencerRow::from_influencer)
        .collect();

    Ok(Json(ApiListResponse {
        total: dashboard.len(),
        count: influencers.len(),
        influencers,
    }))
}

async fn influencer_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CanonicalInfluencer> {
    let dashboard = state.snapshot().await;
    dashboard
        .find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

async fn influencer_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiAnalyticsResponse> {
    let dashboard = state.snapshot().await;
    let influencer = dashboard.find(&id).ok_or_else(|| not_found(&id))?;
    let report = dashboard
        .analytics(&influencer.id)
        .ok_or_else(|| not_found(&id))?;
    let content = dashboard
        .content_profile(Some(&influencer.id))
        .unwrap_or_default();

    Ok(Json(ApiAnalyticsResponse {
        id: influencer.id.clone(),
        report,
        content,
    }))
}

async fn reload(State(state): State<AppState>) -> ApiResult<ApiHealthResponse> {
    let dashboard = state.reload().await.map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(err)),
        )
    })?;
    info!(influencers = dashboard.len(), "snapshot reloaded");
    Ok(Json(ApiHealthResponse {
        status: "reloaded",
        influencers: dashboard.len(),
        built_at: dashboard.built_at.to_rfc3339(),
    }))
}

fn bad_request(message: String) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(message)))
}

fn not_found(id: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(format!("influencer not found: {}", id))),
    )
}

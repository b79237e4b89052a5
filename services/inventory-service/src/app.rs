use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use common_http_errors::{ApiError, ApiResult};
use common_observability::InventoryMetrics;
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::item_handlers::{
    create_item, delete_item, get_item, list_items, reorder_item, update_item, use_item, ApiResponse,
};
use crate::item_service::InventoryService;
use crate::item_store::{ItemStore, MemoryItemStore};
use crate::pg_item_store::PgItemStore;

pub const SERVICE_NAME: &str = "inventory-service";

// `/api/inventory` is the path the browser client calls.
pub const ITEM_ROUTE_PREFIXES: [&str; 2] = ["/items", "/api/inventory"];

#[derive(Clone)]
pub struct AppState {
    pub inventory: InventoryService,
    pub metrics: Arc<InventoryMetrics>,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>, metrics: Arc<InventoryMetrics>, mutation_max_attempts: u32) -> Self {
        let inventory = InventoryService::new(store, metrics.clone()).with_max_attempts(mutation_max_attempts);
        Self { inventory, metrics }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryItemStore::new()),
            Arc::new(InventoryMetrics::new()),
            crate::item_service::DEFAULT_MAX_ATTEMPTS,
        )
    }
}

pub async fn build_state(config: &ServiceConfig) -> anyhow::Result<AppState> {
    let metrics = Arc::new(InventoryMetrics::new());
    let store: Arc<dyn ItemStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .context("failed to connect to Postgres")?;
            let store = PgItemStore::new(pool);
            store.migrate().await.context("failed to run inventory migrations")?;
            info!(max_connections = config.database_max_connections, "Using Postgres inventory store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; inventory is kept in memory and lost on restart");
            Arc::new(MemoryItemStore::new())
        }
    };
    Ok(AppState::new(store, metrics, config.mutation_max_attempts))
}

pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse { success: true, data: None, message: "Server is running".into() })
}

async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let collections = state.inventory.collections().await?;
    Ok(Json(json!({ "collections": collections })))
}

async fn metrics_endpoint(State(state): State<AppState>) -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8_lossy(&buf).to_string())
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("route_not_found", "Route not found")
}

// Counts every >= 400 response by the code the error envelope put in X-Error-Code.
async fn error_metrics_mw(
    State(metrics): State<Arc<InventoryMetrics>>,
    req: axum::http::Request<Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("x-error-code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        metrics
            .http_errors_total
            .with_label_values(&[SERVICE_NAME, code, status.as_str()])
            .inc();
    }
    resp
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
}

fn with_item_routes(router: Router<AppState>, prefix: &str) -> Router<AppState> {
    router
        .route(prefix, get(list_items).post(create_item))
        .route(&format!("{prefix}/:id"), get(get_item).put(update_item).delete(delete_item))
        .route(&format!("{prefix}/:id/use"), post(use_item))
        .route(&format!("{prefix}/:id/reorder"), post(reorder_item))
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let metrics = state.metrics.clone();
    let router = ITEM_ROUTE_PREFIXES
        .iter()
        .fold(Router::new(), |router, prefix| with_item_routes(router, prefix));
    router
        .route("/healthz", get(health))
        .route("/api/health", get(health))
        .route("/api/debug/collections", get(list_collections))
        .route("/metrics", get(metrics_endpoint))
        .fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(metrics, error_metrics_mw))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins)),
        )
}

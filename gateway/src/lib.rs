//! Gridmind HTTP gateway
//!
//! Exposes the single `POST /generate-cellmap` route in front of the
//! OpenRouter client: forward the prompt, normalize the reply, return the
//! cell map. Any failure surfaces as a generic 500 with a diagnostic detail
//! string, which is all the paired front-end expects.

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{error, info};

use gridmind_core::{normalize, CellMap, LlmClient, Result, DEFAULT_MODEL};

/// Origins allowed to call the API with credentials. The gateway is paired
/// with a local front-end; nothing else should be calling it cross-origin.
const ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("GRIDMIND_GATEWAY_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("GRIDMIND_GATEWAY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
struct GatewayState {
    llm: LlmClient,
}

/// Request body for the cell-map route
#[derive(Debug, Deserialize)]
pub struct CellMapRequest {
    pub prompt: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Error body returned on any failure
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Builds the gateway router with the CORS policy applied.
pub fn router(llm: LlmClient) -> Router {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();

    Router::new()
        .route("/generate-cellmap", post(generate_cellmap))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true),
        )
        .with_state(GatewayState { llm })
}

/// Generate a cell map from a natural-language prompt
async fn generate_cellmap(
    State(state): State<GatewayState>,
    Json(req): Json<CellMapRequest>,
) -> std::result::Result<Json<CellMap>, (StatusCode, Json<ErrorDetail>)> {
    let result = state
        .llm
        .complete(&req.prompt, &req.model)
        .await
        .and_then(|text| normalize(&text));

    match result {
        Ok(map) => Ok(Json(map)),
        Err(e) => {
            error!(target: "gateway", error = %e, "generate-cellmap request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorDetail {
                    detail: format!("Failed to process AI request: {e}"),
                }),
            ))
        }
    }
}

/// Starts the gateway server; blocks until the listener shuts down.
pub async fn start_server(addr: SocketAddr, llm: LlmClient) -> Result<()> {
    let app = router(llm);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: "gateway", %addr, "Gridmind gateway ready");
    axum::serve(listener, app).await?;
    Ok(())
}

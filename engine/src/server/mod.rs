//! HTTP API
//!
//! Exposes the engine as a single JSON endpoint, `POST /generate_route`,
//! consumed by the web mini-app. CORS is permissive because the mini-app
//! is served from a different origin. Time fields arrive from the client
//! as numbers or numeric strings; both are accepted, and anything else
//! falls back to the engine's default duration.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::engine::RouteEngine;
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
struct GenerateRouteRequest {
    query: Option<String>,
    hours: Option<Value>,
    minutes: Option<Value>,
    #[serde(rename = "startPoint", default)]
    start_point: Option<String>,
}

/// Build the application router.
pub fn router(engine: Arc<RouteEngine>) -> Router {
    Router::new()
        .route("/generate_route", post(generate_route_handler))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Bind and serve until the process is stopped.
pub async fn serve(engine: Arc<RouteEngine>, config: &ServerConfig) -> Result<(), EngineError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn generate_route_handler(
    State(engine): State<Arc<RouteEngine>>,
    Json(request): Json<GenerateRouteRequest>,
) -> Response {
    let query = request.query.unwrap_or_default();
    let start_point = request.start_point.unwrap_or_default();
    let hours = coerce_minutes(request.hours.as_ref());
    let minutes = coerce_minutes(request.minutes.as_ref());

    match engine
        .generate_route(&query, hours, minutes, &start_point)
        .await
    {
        Ok(itinerary) => Json(itinerary).into_response(),
        Err(EngineError::InvalidInput(message)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        Err(EngineError::Catalog(message)) => {
            tracing::error!(error = %message, "Catalog failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Route generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

/// Accept a time component as a JSON number or a numeric string.
fn coerce_minutes(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

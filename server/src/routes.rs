use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::forecast::{QueryKind, WeatherError, WeatherManager, WeatherReport};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherManager>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub kind: Option<String>,
    pub days: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    Path(location): Path<String>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<WeatherReport>, StatusCode> {
    let kind = match params.kind.as_deref() {
        Some(raw) => raw.parse::<QueryKind>().map_err(|e| {
            tracing::warn!("{}", e);
            StatusCode::BAD_REQUEST
        })?,
        None => QueryKind::default(),
    };

    match state.weather.get_for_city(&location, kind, params.days).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            tracing::error!("Failed to get {} weather for {}: {}", kind, location, e);
            Err(status_for(&e))
        }
    }
}

pub fn status_for(err: &WeatherError) -> StatusCode {
    match err {
        WeatherError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        WeatherError::Upstream { .. } | WeatherError::MalformedResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        WeatherError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
    }
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/weather/:location", get(get_weather))
        .with_state(state)
}

//! Route handlers and wire shaping for the fleet API.
//!
//! The handlers are deliberately thin: authenticate where required, call
//! one service operation, and shape the response the way the dashboard and
//! the IoT simulator expect it.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

use skipwatch_core::model::{BinId, TelemetryUpdate};
use skipwatch_core::ports::StoreError;
use skipwatch_core::route::RouteStop;
use skipwatch_core::service::FleetService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub(crate) struct ApiState {
    /// The fleet service every operation goes through.
    pub service: Arc<FleetService>,
    /// Shared secret expected in `X-API-Key` on the update endpoint.
    pub api_key: String,
}

pub(crate) fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health))
        .route("/api/bins", get(list_bins))
        .route("/api/stats", get(stats))
        .route("/api/alerts", get(alerts))
        .route("/api/route/optimize", get(optimize_route))
        .route("/api/predict/{bin_id}", get(predict))
        .route("/api/navigate/{bin_id}", get(navigate))
        .route("/api/bins/{bin_id}/update", post(update_bin))
        .with_state(state)
}

pub(crate) enum ApiError {
    Unauthorized,
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
            ApiError::Store(StoreError::BinNotFound) => {
                (StatusCode::NOT_FOUND, "Bin not found".to_owned())
            }
            ApiError::Store(err @ (StoreError::Network(_) | StoreError::Unavailable(_))) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ApiError::Store(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn home(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "message": "Skipwatch fleet monitor API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "database": state.service.backend_name(),
        "endpoints": {
            "bins": "/api/bins",
            "health": "/api/health",
            "alerts": "/api/alerts",
            "stats": "/api/stats",
            "route": "/api/route/optimize",
            "predict": "/api/predict/{binId}",
            "navigate": "/api/navigate/{binId}",
        },
        "timestamp": Utc::now(),
    }))
}

async fn health(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let count = state.service.bin_count().await?;
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "binsCount": count,
        "database": state.service.backend_name(),
        "features": [
            "Real-time Bin Monitoring",
            "Priority-based Collection",
            "Predictive Analytics",
            "Route Optimization",
        ],
    })))
}

/// Full bin listing plus the fleet roll-up; the dashboard's main call.
async fn list_bins(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let (bins, system_stats) = state.service.overview(now).await?;
    tracing::info!(count = bins.len(), endpoint = "/api/bins", "bins fetched");
    Ok(Json(json!({
        "bins": &bins,
        "count": bins.len(),
        "system_stats": system_stats,
        "lastUpdated": now,
    })))
}

async fn stats(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let (_bins, system_stats) = state.service.overview(now).await?;
    Ok(Json(json!({
        "stats": &system_stats,
        "binsByPriority": system_stats.bins_by_priority,
        "binsByStatus": system_stats.bins_by_status,
        "timestamp": now,
    })))
}

async fn alerts(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let active = state.service.active_alerts(now).await?;
    Ok(Json(json!({
        "alerts": &active,
        "count": active.len(),
        "lastUpdated": now,
    })))
}

async fn optimize_route(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let plan = state.service.optimize_route(now).await?;
    let route: Vec<Value> = plan.route.iter().map(route_stop_json).collect();
    Ok(Json(json!({
        "route": route,
        "summary": plan.summary,
        "optimization_info": {
            "algorithm": "Priority-Distance Optimization",
            "factors_considered": [
                "Priority Score (40%)",
                "Fill Level (30%)",
                "Distance Optimization (20%)",
                "Waste Type Priority (10%)",
            ],
        },
        "timestamp": now,
    })))
}

/// Stops go out with the arrival as a wall-clock `HH:MM` string, which is
/// what the driver-facing views render.
fn route_stop_json(stop: &RouteStop) -> Value {
    json!({
        "stop_number": stop.stop_number,
        "bin_id": stop.bin_id,
        "location": stop.location,
        "coordinates": stop.coordinates,
        "waste_type": stop.waste_type.slug(),
        "fill_level": stop.fill_level,
        "priority_score": stop.priority_score,
        "distance_from_previous": stop.distance_from_previous,
        "travel_time_minutes": stop.travel_time_minutes,
        "collection_time_minutes": stop.collection_time_minutes,
        "estimated_arrival": stop.estimated_arrival.format("%H:%M").to_string(),
        "predicted_fill_on_arrival": stop.predicted_fill_on_arrival,
    })
}

async fn predict(
    State(state): State<ApiState>,
    Path(bin_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = BinId(bin_id);
    let now = Utc::now();
    let bin = state.service.get_bin(&id).await?;
    let forecast = state.service.forecast(&id, now).await?;

    Ok(Json(json!({
        "bin_id": id,
        "current_status": bin,
        "predictions": {
            "hours_to_80_percent": forecast.predictions.hours_to_80_percent,
            "hours_to_90_percent": forecast.predictions.hours_to_90_percent,
            "hours_to_full": forecast.predictions.hours_to_full,
            "daily_fill_rate_percent": forecast.predictions.daily_fill_rate_percent,
            "predicted_collection_date": forecast
                .predictions
                .predicted_collection_date
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        },
        "risk_assessment": forecast.risk_assessment,
        "timestamp": now,
    })))
}

async fn navigate(
    State(state): State<ApiState>,
    Path(bin_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = BinId(bin_id);
    let now = Utc::now();
    let bin = state.service.get_bin(&id).await?;
    let estimate = state.service.navigate(&id).await?;

    Ok(Json(json!({
        "target_bin": bin,
        "navigation": {
            "distance_km": estimate.distance_km,
            "estimated_travel_time_minutes": estimate.estimated_travel_time_minutes,
            "from_location": estimate.from_location,
            "to_location": estimate.to_location,
            "predicted_fill_on_arrival": estimate.predicted_fill_on_arrival,
            "priority_justification": estimate.priority_justification,
        },
        "traffic_info": {
            "estimated_delay": estimate.traffic.estimated_delay_minutes,
            "route_status": estimate.traffic.route_status,
        },
        "timestamp": now,
    })))
}

async fn update_bin(
    State(state): State<ApiState>,
    Path(bin_id): Path<String>,
    headers: HeaderMap,
    Json(update): Json<TelemetryUpdate>,
) -> Result<Json<Value>, ApiError> {
    if !authorized(&headers, &state.api_key) {
        return Err(ApiError::Unauthorized);
    }

    let now = Utc::now();
    let outcome = state.service.ingest(BinId(bin_id), update, now).await?;
    tracing::info!(
        bin_id = %outcome.bin.id,
        fill_level = outcome.bin.fill_level,
        priority = %outcome.bin.priority,
        alerts_added = outcome.alerts.len(),
        "bin updated"
    );

    Ok(Json(json!({
        "status": "updated",
        "binId": outcome.bin.id,
        "priority": outcome.bin.priority,
        "alerts": outcome.alerts.len(),
        "timestamp": now,
    })))
}

fn authorized(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| provided == expected)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn update_endpoint_requires_the_exact_shared_secret() {
        let mut headers = HeaderMap::new();
        assert!(!authorized(&headers, "demo-key-123"));

        headers.insert("x-api-key", HeaderValue::from_static("wrong"));
        assert!(!authorized(&headers, "demo-key-123"));

        headers.insert("x-api-key", HeaderValue::from_static("demo-key-123"));
        assert!(authorized(&headers, "demo-key-123"));
    }
}

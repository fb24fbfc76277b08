/// HTTP request handlers
use crate::config::LocationTable;
use crate::domain::{
    AppInfo, Health, LocationEarthquakes, LocationQuery, RecentEarthquakes, RecentQuery,
    ServiceStatus, DEFAULT_LOOKBACK_DAYS, DEFAULT_MIN_MAGNITUDE, DEFAULT_RECENT_LIMIT,
};
use crate::errors::{ApiError, ApiResult};
use crate::logging::{EventLog, LogChannel};
use crate::services::EarthquakeService;
use crate::utils::{format_uptime, timestamp_to_str};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        ConnectInfo, Path, Query, Request, State,
    },
    http::{header::HOST, StatusCode},
    middleware::Next,
    response::{Html, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

pub const TEL_AVIV: &str = "Tel Aviv, Israel";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub earthquakes: Arc<EarthquakeService>,
    pub locations: Arc<LocationTable>,
    pub event_log: Arc<dyn EventLog>,
    pub started_at: Instant,
}

const MAIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Earthquake Dashboard</title></head>
<body>
<h1>Earthquake Dashboard</h1>
<ul>
<li><a href="/telaviv-earthquakes">/telaviv-earthquakes</a></li>
<li><a href="/locations">/locations</a></li>
<li>/earthquakes/&lt;location name&gt;</li>
<li>/today-extreme-earthquakes/&lt;min magnitude&gt;</li>
<li><a href="/recent-earthquakes">/recent-earthquakes</a>?days=&amp;minmag=&amp;limit=</li>
<li><a href="/health">/health</a> · <a href="/status">/status</a> · <a href="/info">/info</a></li>
</ul>
</body>
</html>
"#;

/// Access log middleware: `addr - METHOD url` for every request
pub async fn log_access(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let addr = client_ip(req.extensions().get::<ConnectInfo<SocketAddr>>());

    state.event_log.record(
        LogChannel::Access,
        &format!("{} - {} {}", addr, req.method(), request_url(&req)),
    );

    next.run(req).await
}

/// Full URL of the request when a Host header is present, the bare URI otherwise
fn request_url(req: &Request) -> String {
    let uri = req.uri();
    if uri.authority().is_some() {
        return uri.to_string();
    }

    match req.headers().get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{host}{uri}"),
        None => uri.to_string(),
    }
}

/// Log-friendly rendering of an optional JSON field, `-` when absent
fn field_or_dash(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn client_ip(info: Option<&ConnectInfo<SocketAddr>>) -> String {
    info.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn main_page() -> Html<&'static str> {
    Html(MAIN_PAGE)
}

pub async fn ping() -> &'static str {
    "pong"
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "Application is healthy",
        now: Utc::now(),
    })
}

pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        service: env!("CARGO_PKG_NAME"),
        status: "running",
        uptime: format_uptime(state.started_at.elapsed()),
    })
}

pub async fn info() -> Json<AppInfo> {
    Json(AppInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
    })
}

/// Configured location names and search areas
pub async fn list_locations(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "locations": state.locations.all() }))
}

pub async fn telaviv_earthquakes(
    State(state): State<AppState>,
) -> ApiResult<Json<LocationEarthquakes>> {
    earthquakes_for_location(&state, TEL_AVIV).await.map(Json)
}

pub async fn earthquakes_by_location(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
) -> ApiResult<Json<LocationEarthquakes>> {
    let Path(location_name) = path?;
    earthquakes_for_location(&state, &location_name)
        .await
        .map(Json)
}

async fn earthquakes_for_location(
    state: &AppState,
    name: &str,
) -> ApiResult<LocationEarthquakes> {
    let Some(location) = state.locations.get(name) else {
        error!("{} configuration not found in location table", name);
        return Err(ApiError::LocationNotFound(name.to_string()));
    };

    let query = LocationQuery::new(
        location.lat,
        location.lon,
        location.radius_km,
        DEFAULT_LOOKBACK_DAYS,
    )?;

    state
        .earthquakes
        .query_by_location(&query)
        .await
        .inspect_err(|e| error!("Location query for {} failed: {}", name, e))
}

/// Magnitude-filtered events from the last day, logged to the dashboard channel
pub async fn today_extreme_earthquakes(
    path: Result<Path<f64>, PathRejection>,
    client: Option<ConnectInfo<SocketAddr>>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let Path(min_mag) = path?;
    let query = RecentQuery::new(1, min_mag, DEFAULT_RECENT_LIMIT)?;
    let result = state.earthquakes.query_recent(&query).await;
    let log = &state.event_log;

    let addr = client_ip(client.as_ref());
    log.record(
        LogChannel::Dashboard,
        &format!("Endpoint '/today-extreme-earthquakes/{min_mag:?}' accessed by {addr}"),
    );

    let events = result.events();
    let message = if events.is_empty() {
        format!("No extreme earthquakes found today (magnitude >= {min_mag:?}).")
    } else {
        format!(
            "Found {} extreme earthquakes (magnitude >= {min_mag:?})",
            events.len()
        )
    };
    log.record(LogChannel::Dashboard, &format!("{message}:"));

    for event in events {
        let props = &event["properties"];
        log.record(
            LogChannel::Dashboard,
            &format!(
                "- Magnitude: {}, Location: {}, Time: {}",
                field_or_dash(&props["mag"]),
                field_or_dash(&props["place"]),
                props["time"]
                    .as_f64()
                    .map(|t| timestamp_to_str(t as i64))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        );
    }

    let mut body = match &result {
        RecentEarthquakes::Found { events, .. } => json!({ "events": events }),
        RecentEarthquakes::Empty { .. } => json!({}),
        RecentEarthquakes::Failed { error } => json!({ "error": error }),
    };
    body["message"] = json!(message);

    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub days: Option<u32>,
    pub minmag: Option<f64>,
    pub limit: Option<usize>,
}

pub async fn recent_earthquakes(
    query: Result<Query<RecentParams>, QueryRejection>,
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<RecentEarthquakes>)> {
    let Query(params) = query?;
    let query = RecentQuery::new(
        params.days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
        params.minmag.unwrap_or(DEFAULT_MIN_MAGNITUDE),
        params.limit.unwrap_or(DEFAULT_RECENT_LIMIT),
    )?;

    let result = state.earthquakes.query_recent(&query).await;
    let status = if result.is_failed() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    Ok((status, Json(result)))
}

/// Domain models for the application
use crate::errors::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;
pub const DEFAULT_MIN_MAGNITUDE: f64 = 1.0;
pub const DEFAULT_RECENT_LIMIT: usize = 3;

pub const NO_EARTHQUAKES_MESSAGE: &str =
    "No earthquakes found within the specified time and magnitude range.";

/// Location-scoped query: everything within `radius_km` of a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub lookback_days: u32,
}

impl LocationQuery {
    pub fn new(
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        lookback_days: u32,
    ) -> ApiResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ApiError::InvalidInput(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ApiError::InvalidInput(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        // NaN fails this comparison too
        if !(radius_km > 0.0 && radius_km.is_finite()) {
            return Err(ApiError::InvalidInput(format!(
                "radius {radius_km} km must be positive"
            )));
        }
        check_lookback(lookback_days)?;

        Ok(Self {
            latitude,
            longitude,
            radius_km,
            lookback_days,
        })
    }
}

/// Global query for the most recent events above a magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecentQuery {
    pub lookback_days: u32,
    pub min_magnitude: f64,
    pub limit: usize,
}

impl RecentQuery {
    pub fn new(lookback_days: u32, min_magnitude: f64, limit: usize) -> ApiResult<Self> {
        check_lookback(lookback_days)?;
        if !min_magnitude.is_finite() {
            return Err(ApiError::InvalidInput(format!(
                "minimum magnitude {min_magnitude} is not a number"
            )));
        }
        if limit == 0 {
            return Err(ApiError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            lookback_days,
            min_magnitude,
            limit,
        })
    }
}

impl Default for RecentQuery {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

fn check_lookback(days: u32) -> ApiResult<()> {
    if days == 0 {
        return Err(ApiError::InvalidInput(
            "lookback days must be positive".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinates {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub depth: Option<f64>,
}

/// Flattened view of one upstream feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    /// Epoch milliseconds, integer or float as sent upstream
    pub time: Option<Number>,
    pub coordinates: Coordinates,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// Project a raw geojson feature into a [`NormalizedEvent`].
///
/// Total over any JSON input: missing, null or wrongly typed fields come
/// back as `None`.
pub fn project_event(feature: &Value) -> NormalizedEvent {
    let properties = &feature["properties"];
    let coords = feature["geometry"]["coordinates"].as_array();
    let coord = |i: usize| coords.and_then(|c| c.get(i)).and_then(Value::as_f64);

    NormalizedEvent {
        magnitude: properties["mag"].as_f64(),
        place: properties["place"].as_str().map(str::to_string),
        time: match &properties["time"] {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        },
        coordinates: Coordinates {
            longitude: coord(0),
            latitude: coord(1),
            depth: coord(2),
        },
        event_type: properties["type"].as_str().map(str::to_string),
    }
}

/// Upstream event time in epoch milliseconds, 0 when absent or not a number
pub fn event_time(feature: &Value) -> f64 {
    feature["properties"]["time"].as_f64().unwrap_or(0.0)
}

/// Location query result
#[derive(Debug, Clone, Serialize)]
pub struct LocationEarthquakes {
    pub count: usize,
    pub events: Vec<NormalizedEvent>,
}

impl LocationEarthquakes {
    pub fn new(events: Vec<NormalizedEvent>) -> Self {
        Self {
            count: events.len(),
            events,
        }
    }
}

/// Recent query result. Failures are part of the envelope, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecentEarthquakes {
    Found { message: String, events: Vec<Value> },
    Empty { message: String },
    Failed { error: String },
}

impl RecentEarthquakes {
    pub fn events(&self) -> &[Value] {
        match self {
            RecentEarthquakes::Found { events, .. } => events,
            _ => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecentEarthquakes::Failed { .. })
    }
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub now: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub status: &'static str,
    pub uptime: String,
}

#[derive(Serialize)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

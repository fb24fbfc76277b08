/// Application routes configuration
use crate::handlers::{
    earthquakes_by_location, health, info, list_locations, log_access, main_page, ping,
    recent_earthquakes, status, telaviv_earthquakes, today_extreme_earthquakes, AppState,
};
use axum::{middleware, routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(main_page))
        // Liveness and metadata
        .route("/ping", get(ping))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/info", get(info))
        // Earthquake endpoints
        .route("/locations", get(list_locations))
        .route("/telaviv-earthquakes", get(telaviv_earthquakes))
        .route("/earthquakes/:location_name", get(earthquakes_by_location))
        .route(
            "/today-extreme-earthquakes/:minmag",
            get(today_extreme_earthquakes),
        )
        .route("/recent-earthquakes", get(recent_earthquakes))
        .layer(middleware::from_fn_with_state(state.clone(), log_access))
        .with_state(state)
}

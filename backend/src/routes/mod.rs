//! Route definitions for the Farm Nursery Management Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Crop bookings
        .nest("/bookings", booking_routes())
        // Sowing schedules
        .nest("/schedules", schedule_routes())
        // Crop catalog (read-only, for display)
        .nest("/catalog", catalog_routes())
}

/// Booking routes
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route(
            "/:booking_id",
            get(handlers::get_booking)
                .put(handlers::update_booking)
                .delete(handlers::delete_booking),
        )
}

/// Sowing schedule routes
fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(handlers::list_live_schedules))
        .route("/reaggregate", post(handlers::reaggregate_schedules))
        .route("/:schedule_id", get(handlers::get_schedule))
        .route("/:schedule_id/progress", put(handlers::set_progress))
        .route("/:schedule_id/status", put(handlers::set_schedule_status))
}

/// Catalog routes
fn catalog_routes() -> Router<AppState> {
    Router::new().route("/groups", get(handlers::list_catalog_groups))
}

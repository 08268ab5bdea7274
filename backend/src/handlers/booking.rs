//! Crop booking HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::booking::{BookingService, CreateBookingInput, UpdateBookingInput};
use crate::AppState;

/// List all bookings
pub async fn list_bookings(State(state): State<AppState>) -> impl IntoResponse {
    let service = BookingService::new(state.db.clone());

    match service.list_bookings().await {
        Ok(bookings) => (
            StatusCode::OK,
            Json(serde_json::json!({ "bookings": bookings })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific booking
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = BookingService::new(state.db.clone());

    match service.get_booking(booking_id).await {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new booking
pub async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<CreateBookingInput>,
) -> impl IntoResponse {
    let service = BookingService::new(state.db.clone());

    match service.create_booking(input).await {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a booking
pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<UpdateBookingInput>,
) -> impl IntoResponse {
    let service = BookingService::new(state.db.clone());

    match service.update_booking(booking_id, input).await {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a booking
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = BookingService::new(state.db.clone());

    match service.delete_booking(booking_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

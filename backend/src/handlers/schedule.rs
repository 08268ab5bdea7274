//! Sowing schedule HTTP handlers
//!
//! The read path never exposes duplicate windows (the service de-duplicates
//! legacy rows); the progress endpoint returns distinct not-found signals
//! for schedule, group, and variety so stale references are diagnosable.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::schedule::ScheduleService;
use crate::AppState;

/// Body for the progress-update endpoint
#[derive(Debug, Deserialize)]
pub struct SetProgressInput {
    pub group_id: Uuid,
    pub variety_id: Uuid,
    pub completed: Decimal,
}

/// Body for the manual status endpoint
#[derive(Debug, Deserialize)]
pub struct SetStatusInput {
    pub status: String,
}

/// List live schedules, shaped for display
pub async fn list_live_schedules(State(state): State<AppState>) -> impl IntoResponse {
    let service = ScheduleService::new(state.db.clone());

    match service.live_schedule_views(Utc::now()).await {
        Ok(schedules) => (
            StatusCode::OK,
            Json(serde_json::json!({ "schedules": schedules })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a single schedule, shaped for display
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ScheduleService::new(state.db.clone());

    match service.schedule_view(schedule_id).await {
        Ok(schedule) => (StatusCode::OK, Json(schedule)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Set a variety's completed counter within a schedule
pub async fn set_progress(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(input): Json<SetProgressInput>,
) -> impl IntoResponse {
    let service = ScheduleService::new(state.db.clone());

    match service
        .set_completed(schedule_id, input.group_id, input.variety_id, input.completed)
        .await
    {
        Ok(variety) => (StatusCode::OK, Json(variety)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Manually set a schedule's status
pub async fn set_schedule_status(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(input): Json<SetStatusInput>,
) -> impl IntoResponse {
    let service = ScheduleService::new(state.db.clone());

    match service.set_status(schedule_id, &input.status).await {
        Ok(schedule) => (StatusCode::OK, Json(schedule)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Administrative re-aggregation: re-derive every schedule from current
/// booking data. Idempotent, safe to re-run any time.
pub async fn reaggregate_schedules(State(state): State<AppState>) -> impl IntoResponse {
    let service = ScheduleService::new(state.db.clone());

    match service.reconcile_all().await {
        Ok(schedules) => {
            let windows: Vec<serde_json::Value> = schedules
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "schedule_id": s.id,
                        "window_start": s.window_start,
                        "window_end": s.window_end,
                    })
                })
                .collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "reconciled": schedules.len(),
                    "windows": windows,
                })),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

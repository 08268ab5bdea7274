//! Crop catalog HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::services::catalog::CatalogService;
use crate::AppState;

/// List all crop groups with their varieties
pub async fn list_catalog_groups(State(state): State<AppState>) -> impl IntoResponse {
    let service = CatalogService::new(state.db.clone());

    match service.list_groups_with_varieties().await {
        Ok(groups) => (
            StatusCode::OK,
            Json(serde_json::json!({ "groups": groups })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

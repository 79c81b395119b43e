use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::guard::{CurrentUser, require_role};
use super::{ApiError, ApiResponse, AppState, CreateEventTypeRequest, EventTypeDto};
use crate::models::Role;

/// POST /api/event-types
pub async fn create_event_type(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateEventTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EventTypeDto>>), ApiError> {
    require_role(&current, &[Role::Leadership])?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Event type name is required"));
    }

    if state
        .store()
        .get_event_type_by_name(name)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check event type: {e}")))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Event type '{name}' already exists"
        )));
    }

    let event_type = state
        .store()
        .create_event_type(name, payload.description)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create event type: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EventTypeDto::from(event_type))),
    ))
}

/// GET /api/event-types
pub async fn list_event_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<EventTypeDto>>>, ApiError> {
    let event_types = state
        .store()
        .list_event_types()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list event types: {e}")))?;

    Ok(Json(ApiResponse::success(
        event_types.into_iter().map(EventTypeDto::from).collect(),
    )))
}

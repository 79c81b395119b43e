use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::guard::{CurrentUser, require_role};
use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, MessageResponse, RegisterRequest,
    UserDto,
};
use crate::domain::events::AuditEvent;
use crate::models::Role;
use crate::services::AuthError;

/// POST /api/users
///
/// Registers an account. Restricted to the command center and admins.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    require_role(&current, &[Role::CommandCenter])?;

    let user = state
        .shared
        .auth_service
        .register(
            &payload.username,
            &payload.password,
            payload.role_level,
            payload.email,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state
        .store()
        .list_users()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list users: {e}")))?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// PUT /api/users/me/password
///
/// Rotates the caller's own credential. The current password is re-verified
/// even though the request already carries a valid token.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth_service
        .change_password(&current.0, &payload.old_password, &payload.new_password)
        .await
        .map_err(|e| match e {
            AuthError::BadPassword => {
                ApiError::Unauthorized("Current password is incorrect".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}

/// DELETE /api/users/{id}
///
/// Deactivation, not deletion: the row and its attempt history remain for
/// the audit trail, and outstanding tokens stop working at the next request.
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_role(&current, &[])?;

    if current.0.id == id {
        return Err(ApiError::validation("Cannot deactivate your own account"));
    }

    let deactivated = state
        .store()
        .deactivate_user(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to deactivate user: {e}")))?;

    if !deactivated {
        return Err(ApiError::not_found("User", id));
    }

    let _ = state
        .event_bus()
        .send(AuditEvent::UserDeactivated { user_id: id });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("User {id} deactivated"),
    })))
}

use axum::{Extension, Json, extract::State, http::HeaderMap};
use std::sync::Arc;

use super::guard::CurrentUser;
use super::{ApiError, ApiResponse, AppState, LoginRequest, LoginResponse, TokenResponse, UserDto};
use crate::models::Role;

/// POST /api/auth/login
///
/// Verifies credentials and returns a sealed session token. Failure reasons
/// beyond lockout are indistinguishable from the outside.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let ip = client_ip(&headers);

    let user = state
        .shared
        .auth_service
        .verify_credentials(&payload.username, &payload.password, &ip)
        .await?;

    let role = Role::from_level(user.role_level)
        .ok_or_else(|| ApiError::internal(format!("Unknown role level {}", user.role_level)))?;
    let token = state.shared.token_service.issue(user.id, role)?;

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        user: UserDto::from(user),
    })))
}

/// POST /api/auth/refresh
///
/// Issues a fresh token for the already-authenticated caller with the role
/// level as it stands now, not as it was at the previous issuance.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let role = current.role()?;
    let token = state.shared.token_service.issue(current.0.id, role)?;

    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// Best-effort client address for the attempt ledger. Proxied deployments
/// populate X-Forwarded-For; otherwise the socket peer is unknown here.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map_or_else(|| "unknown".to_string(), |ip| ip.trim().to_string())
}

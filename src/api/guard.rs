//! Bearer-token middleware and role gates for protected routes.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::entities::users;
use crate::models::Role;
use crate::services::TokenError;

/// Authenticated caller, resolved from the token's subject against the live
/// users table. The role snapshot inside the token is never trusted on its
/// own.
#[derive(Clone)]
pub struct CurrentUser(pub users::Model);

impl CurrentUser {
    pub fn role(&self) -> Result<Role, ApiError> {
        Role::from_level(self.0.role_level)
            .ok_or_else(|| ApiError::internal(format!("Unknown role level {}", self.0.role_level)))
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).ok_or(TokenError::Missing)?;

    let claims = state.shared.token_service.decode(&token)?;

    let user = state
        .store()
        .get_user_by_id(claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Unknown principal".to_string()))?;

    // A token issued before deactivation must stop working immediately.
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    tracing::Span::current().record("user_id", user.id);

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// Role gate for handlers that are not governed by the transition table.
/// Admin passes every gate.
pub fn require_role(user: &CurrentUser, allowed: &[Role]) -> Result<Role, ApiError> {
    let role = user.role()?;
    if role.is_admin() || allowed.contains(&role) {
        return Ok(role);
    }
    Err(ApiError::Forbidden(
        "Operation not permitted for this role".to_string(),
    ))
}

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::guard::{CurrentUser, require_role};
use super::{ApiError, ApiResponse, AppState};
use crate::entities::audit_logs;
use crate::models::Role;

#[derive(Deserialize)]
pub struct AuditLogQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    100
}

#[derive(Serialize)]
pub struct AuditLogDto {
    pub id: i64,
    pub event_type: String,
    pub level: String,
    pub message: String,
    pub details: Option<String>,
    pub created_at: String,
}

impl From<audit_logs::Model> for AuditLogDto {
    fn from(entry: audit_logs::Model) -> Self {
        Self {
            id: entry.id,
            event_type: entry.event_type,
            level: entry.level,
            message: entry.message,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}

/// GET /api/audit-logs
///
/// Most recent entries first. Reserved for leadership and admins; the trail
/// names accounts and login outcomes.
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<ApiResponse<Vec<AuditLogDto>>>, ApiError> {
    require_role(&current, &[Role::Leadership])?;

    let entries = state
        .store()
        .recent_audit_logs(query.limit.min(1000))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to query audit logs: {e}")))?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(AuditLogDto::from).collect(),
    )))
}

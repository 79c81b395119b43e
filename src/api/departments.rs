use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::guard::{CurrentUser, require_role};
use super::{ApiError, ApiResponse, AppState, CreateDepartmentRequest, DepartmentDto};
use crate::models::Role;

/// POST /api/departments
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DepartmentDto>>), ApiError> {
    require_role(&current, &[Role::Leadership])?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Department name is required"));
    }

    if state
        .store()
        .get_department_by_name(name)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check department: {e}")))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Department '{name}' already exists"
        )));
    }

    let department = state
        .store()
        .create_department(name)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create department: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(DepartmentDto::from(department))),
    ))
}

/// GET /api/departments
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<DepartmentDto>>>, ApiError> {
    let departments = state
        .store()
        .list_departments()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list departments: {e}")))?;

    Ok(Json(ApiResponse::success(
        departments.into_iter().map(DepartmentDto::from).collect(),
    )))
}

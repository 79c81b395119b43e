use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::guard::CurrentUser;
use super::{
    ApiError, ApiResponse, AppState, CreateIncidentPayload, DepartmentDto, IncidentDto,
    TransitionPayload,
};
use crate::entities::{departments, incidents};
use crate::services::{CreateIncidentRequest, TransitionKind, TransitionRequest};

fn to_dto(
    state: &AppState,
    incident: incidents::Model,
    linked: Option<Vec<departments::Model>>,
) -> Result<IncidentDto, ApiError> {
    let description = state
        .shared
        .field_cipher
        .decrypt(&incident.description)
        .map_err(|e| ApiError::internal(format!("Failed to decrypt description: {e}")))?;

    Ok(IncidentDto {
        id: incident.id,
        description,
        severity: incident.severity,
        is_aviation: incident.is_aviation,
        event_type_id: incident.event_type_id,
        submitted_by: incident.submitted_by,
        status: incident.status,
        rejection_reason: incident.rejection_reason,
        resolution: incident.resolution,
        resolved_at: incident.resolved_at,
        closed_at: incident.closed_at,
        created_at: incident.created_at,
        updated_at: incident.updated_at,
        departments: linked.map(|d| d.into_iter().map(DepartmentDto::from).collect()),
    })
}

/// POST /api/incidents
pub async fn create_incident(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateIncidentPayload>,
) -> Result<(StatusCode, Json<ApiResponse<IncidentDto>>), ApiError> {
    let incident = state
        .shared
        .workflow_service
        .create(
            &current.0,
            CreateIncidentRequest {
                description: payload.description,
                severity: payload.severity,
                is_aviation: payload.is_aviation,
                event_type_id: payload.event_type_id,
                department_ids: payload.department_ids,
            },
        )
        .await?;

    let dto = to_dto(&state, incident, None)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// GET /api/incidents/{id}
pub async fn get_incident(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<IncidentDto>>, ApiError> {
    let (incident, linked) = state
        .store()
        .get_incident_with_departments(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get incident: {e}")))?
        .ok_or_else(|| ApiError::not_found("Incident", id))?;

    Ok(Json(ApiResponse::success(to_dto(
        &state,
        incident,
        Some(linked),
    )?)))
}

/// GET /api/incidents
pub async fn list_incidents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IncidentDto>>>, ApiError> {
    let incidents = state
        .store()
        .list_incidents()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list incidents: {e}")))?;

    let dtos = incidents
        .into_iter()
        .map(|incident| to_dto(&state, incident, None))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ApiResponse::success(dtos)))
}

async fn apply_transition(
    state: &Arc<AppState>,
    current: &CurrentUser,
    id: i32,
    kind: TransitionKind,
    payload: Option<TransitionPayload>,
) -> Result<Json<ApiResponse<IncidentDto>>, ApiError> {
    let payload = payload.unwrap_or_default();

    let incident = state
        .shared
        .workflow_service
        .transition(
            &current.0,
            id,
            kind,
            TransitionRequest {
                reason: payload.reason,
                resolution: payload.resolution,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(to_dto(state, incident, None)?)))
}

macro_rules! transition_handler {
    ($name:ident, $kind:expr) => {
        pub async fn $name(
            State(state): State<Arc<AppState>>,
            Extension(current): Extension<CurrentUser>,
            Path(id): Path<i32>,
            payload: Option<Json<TransitionPayload>>,
        ) -> Result<Json<ApiResponse<IncidentDto>>, ApiError> {
            apply_transition(&state, &current, id, $kind, payload.map(|Json(p)| p)).await
        }
    };
}

transition_handler!(submit, TransitionKind::Submit);
transition_handler!(department_approve, TransitionKind::DepartmentApprove);
transition_handler!(department_reject, TransitionKind::DepartmentReject);
transition_handler!(submit_command_center, TransitionKind::SubmitCommandCenter);
transition_handler!(command_center_resolve, TransitionKind::CommandCenterResolve);
transition_handler!(issue_emergency_team, TransitionKind::IssueEmergencyTeam);
transition_handler!(resolve, TransitionKind::Resolve);
transition_handler!(close, TransitionKind::Close);
transition_handler!(resubmit, TransitionKind::Resubmit);

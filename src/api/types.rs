use serde::{Deserialize, Serialize};

use crate::entities::incidents::IncidentStatus;
use crate::entities::{departments, event_types, users};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// User representation for responses. Credential material never leaves the
/// users table.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub role_level: i32,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role_level: user.role_level,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Incident representation with the description already decrypted.
#[derive(Debug, Serialize)]
pub struct IncidentDto {
    pub id: i32,
    pub description: String,
    pub severity: i32,
    pub is_aviation: bool,
    pub event_type_id: i32,
    pub submitted_by: i32,
    pub status: IncidentStatus,
    pub rejection_reason: Option<String>,
    pub resolution: Option<String>,
    pub resolved_at: Option<String>,
    pub closed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<DepartmentDto>>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentDto {
    pub id: i32,
    pub name: String,
}

impl From<departments::Model> for DepartmentDto {
    fn from(department: departments::Model) -> Self {
        Self {
            id: department.id,
            name: department.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventTypeDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<event_types::Model> for EventTypeDto {
    fn from(event_type: event_types::Model) -> Self {
        Self {
            id: event_type.id,
            name: event_type.name,
            description: event_type.description,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role_level: i32,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct CreateIncidentPayload {
    pub description: String,
    pub severity: i32,
    #[serde(default)]
    pub is_aviation: bool,
    pub event_type_id: i32,
    #[serde(default)]
    pub department_ids: Vec<i32>,
}

/// Body for transition endpoints. Which field matters depends on the
/// endpoint: `reason` for rejection, `resolution` for command-center
/// resolution, `description` for an edited resubmission.
#[derive(Default, Deserialize)]
pub struct TransitionPayload {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateEventTypeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

//! Domain service for incident creation and lifecycle transitions.

use thiserror::Error;

use crate::entities::incidents::{self, IncidentStatus};
use crate::entities::users;
use crate::services::workflow::TransitionKind;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("incident not found")]
    NotFound,

    /// Role/ownership mismatch; always distinct from authentication failure.
    #[error("operation not permitted for this caller")]
    Forbidden,

    /// Wrong source state, including losing a concurrent transition race.
    #[error("invalid transition: incident is {current:?}, expected {expected:?}")]
    InvalidTransition {
        current: IncidentStatus,
        expected: IncidentStatus,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for WorkflowError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Creation payload, plaintext description.
pub struct CreateIncidentRequest {
    pub description: String,
    pub severity: i32,
    pub is_aviation: bool,
    pub event_type_id: i32,
    pub department_ids: Vec<i32>,
}

/// Transition payload. Which fields are consulted depends on the transition's
/// rule: `reason` for department-reject, `resolution` for
/// command-center-resolve, `description` for resubmission edits.
#[derive(Default)]
pub struct TransitionRequest {
    pub reason: Option<String>,
    pub resolution: Option<String>,
    pub description: Option<String>,
}

#[async_trait::async_trait]
pub trait WorkflowService: Send + Sync {
    /// Creates an incident in `Draft` on behalf of the submitter.
    async fn create(
        &self,
        actor: &users::Model,
        request: CreateIncidentRequest,
    ) -> Result<incidents::Model, WorkflowError>;

    /// Applies one transition from the table in `services::workflow`.
    ///
    /// Checks run in a fixed order: record lookup, source state, caller
    /// authorization, payload validation, then the atomic compare-and-swap
    /// write (which re-checks the source state inside the storage statement).
    async fn transition(
        &self,
        actor: &users::Model,
        incident_id: i32,
        kind: TransitionKind,
        request: TransitionRequest,
    ) -> Result<incidents::Model, WorkflowError>;
}

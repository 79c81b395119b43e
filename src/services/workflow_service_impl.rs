//! `SeaORM` implementation of the `WorkflowService` trait.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::crypto::field::FieldCipher;
use crate::db::{NewIncident, Store, TransitionUpdate};
use crate::domain::events::AuditEvent;
use crate::entities::incidents;
use crate::entities::users;
use crate::models::Role;
use crate::services::sanitizer::sanitize_html;
use crate::services::workflow::{self, PayloadRule, TransitionKind};
use crate::services::workflow_service::{
    CreateIncidentRequest, TransitionRequest, WorkflowError, WorkflowService,
};

pub struct SeaOrmWorkflowService {
    store: Store,
    field_cipher: FieldCipher,
    event_bus: broadcast::Sender<AuditEvent>,
}

impl SeaOrmWorkflowService {
    #[must_use]
    pub const fn new(
        store: Store,
        field_cipher: FieldCipher,
        event_bus: broadcast::Sender<AuditEvent>,
    ) -> Self {
        Self {
            store,
            field_cipher,
            event_bus,
        }
    }

    fn encrypt_description(&self, plaintext: &str) -> Result<String, WorkflowError> {
        self.field_cipher
            .encrypt(plaintext)
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Builds the column updates for a transition after payload validation.
    fn build_update(
        &self,
        rule: &workflow::TransitionRule,
        request: TransitionRequest,
    ) -> Result<TransitionUpdate, WorkflowError> {
        let mut update = TransitionUpdate {
            set_resolved_at: rule.stamps_resolved_at,
            set_closed_at: rule.stamps_closed_at,
            ..Default::default()
        };

        match rule.payload {
            PayloadRule::RejectionReason => {
                let reason = request
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        WorkflowError::Validation("Rejection reason is required".to_string())
                    })?;
                update.rejection_reason = Some(reason.to_string());
            }
            PayloadRule::Resolution => {
                let resolution = request
                    .resolution
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        WorkflowError::Validation("Resolution text is required".to_string())
                    })?;
                // This field is re-displayed to other users; sanitization is
                // not optional here.
                update.resolution = Some(sanitize_html(resolution));
            }
            PayloadRule::None => {}
        }

        // A rejected draft may be edited as part of resubmission
        if rule.kind == TransitionKind::Resubmit
            && let Some(description) = request.description.as_deref()
        {
            let trimmed = description.trim();
            if trimmed.is_empty() {
                return Err(WorkflowError::Validation(
                    "Description cannot be empty".to_string(),
                ));
            }
            update.description = Some(self.encrypt_description(&sanitize_html(trimmed))?);
        }

        Ok(update)
    }
}

#[async_trait]
impl WorkflowService for SeaOrmWorkflowService {
    async fn create(
        &self,
        actor: &users::Model,
        request: CreateIncidentRequest,
    ) -> Result<incidents::Model, WorkflowError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(WorkflowError::Validation(
                "Description is required".to_string(),
            ));
        }

        if !self.store.event_type_exists(request.event_type_id).await? {
            return Err(WorkflowError::Validation(format!(
                "Unknown event type: {}",
                request.event_type_id
            )));
        }

        for department_id in &request.department_ids {
            if !self.store.department_exists(*department_id).await? {
                return Err(WorkflowError::Validation(format!(
                    "Unknown department: {department_id}"
                )));
            }
        }

        let encrypted = self.encrypt_description(&sanitize_html(description))?;

        let incident = self
            .store
            .create_incident(NewIncident {
                description: encrypted,
                severity: request.severity,
                is_aviation: request.is_aviation,
                event_type_id: request.event_type_id,
                submitted_by: actor.id,
                department_ids: request.department_ids,
            })
            .await?;

        let _ = self.event_bus.send(AuditEvent::IncidentCreated {
            incident_id: incident.id,
            submitted_by: actor.id,
        });

        Ok(incident)
    }

    async fn transition(
        &self,
        actor: &users::Model,
        incident_id: i32,
        kind: TransitionKind,
        request: TransitionRequest,
    ) -> Result<incidents::Model, WorkflowError> {
        let rule = workflow::rule_for(kind);

        let incident = self
            .store
            .get_incident(incident_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        // Source state first: a mismatch is reported as InvalidTransition
        // regardless of the caller's role, admin included.
        if incident.status != rule.source {
            return Err(WorkflowError::InvalidTransition {
                current: incident.status,
                expected: rule.source,
            });
        }

        let role = Role::from_level(actor.role_level).ok_or(WorkflowError::Forbidden)?;
        if !workflow::is_authorized(rule, role, actor.id, incident.submitted_by) {
            return Err(WorkflowError::Forbidden);
        }

        let update = self.build_update(rule, request)?;

        let applied = self
            .store
            .apply_incident_transition(incident_id, rule.source, rule.target, update)
            .await?;

        if !applied {
            // Lost a race: someone else moved the record between our read and
            // the conditional write. Re-read for an accurate error.
            let current = self
                .store
                .get_incident(incident_id)
                .await?
                .ok_or(WorkflowError::NotFound)?;
            return Err(WorkflowError::InvalidTransition {
                current: current.status,
                expected: rule.source,
            });
        }

        let updated = self
            .store
            .get_incident(incident_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        info!(
            incident_id,
            action = kind.as_str(),
            from = ?rule.source,
            to = ?rule.target,
            actor_id = actor.id,
            "incident transitioned"
        );

        let _ = self.event_bus.send(AuditEvent::IncidentTransitioned {
            incident_id,
            actor_id: actor.id,
            action: kind.as_str().to_string(),
            from: format!("{:?}", rule.source),
            to: format!("{:?}", rule.target),
        });

        Ok(updated)
    }
}

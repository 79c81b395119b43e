use crate::db::Store;
use crate::domain::events::AuditEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::error;

/// Persists audit events from the event bus. Listener failures are logged
/// and never propagate into request handling.
pub struct AuditLogService {
    store: Store,
    event_bus: broadcast::Sender<AuditEvent>,
}

impl AuditLogService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<AuditEvent>) -> Self {
        Self { store, event_bus }
    }

    pub fn start_listener(self: Arc<Self>) {
        let mut rx = self.event_bus.subscribe();
        let service = self;

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = service.handle_event(event).await {
                            error!(error = %e, "Failed to save audit log");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        error!(count, "Audit listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Audit listener event bus closed");
                        break;
                    }
                }
            }
        });
    }

    async fn handle_event(&self, event: AuditEvent) -> anyhow::Result<()> {
        let (event_type, level, message) = match &event {
            AuditEvent::LoginSucceeded { username, .. } => (
                "LoginSucceeded",
                "info",
                format!("Successful login: {username}"),
            ),
            AuditEvent::LoginRejected {
                username, reason, ..
            } => (
                "LoginRejected",
                "warn",
                format!("Rejected login for {username}: {reason}"),
            ),
            AuditEvent::UserRegistered {
                username,
                role_level,
            } => (
                "UserRegistered",
                "info",
                format!("Registered user {username} with role level {role_level}"),
            ),
            AuditEvent::UserDeactivated { user_id } => (
                "UserDeactivated",
                "warn",
                format!("Deactivated user {user_id}"),
            ),
            AuditEvent::PasswordChanged { user_id } => (
                "PasswordChanged",
                "info",
                format!("Password changed for user {user_id}"),
            ),
            AuditEvent::IncidentCreated {
                incident_id,
                submitted_by,
            } => (
                "IncidentCreated",
                "info",
                format!("Incident {incident_id} created by user {submitted_by}"),
            ),
            AuditEvent::IncidentTransitioned {
                incident_id,
                action,
                from,
                to,
                ..
            } => (
                "IncidentTransitioned",
                "info",
                format!("Incident {incident_id}: {action} ({from} -> {to})"),
            ),
        };

        let details = serde_json::to_string(&event).ok();

        self.store
            .append_audit_log(event_type, level, &message, details)
            .await
    }
}

//! Domain events emitted on the audit bus.
//!
//! Login outcomes keep their distinct internal kind here even though the
//! external response message is uniform.

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum AuditEvent {
    LoginSucceeded {
        username: String,
        ip_address: String,
    },
    LoginRejected {
        username: String,
        ip_address: String,
        reason: String,
    },
    UserRegistered {
        username: String,
        role_level: i32,
    },
    UserDeactivated {
        user_id: i32,
    },
    PasswordChanged {
        user_id: i32,
    },
    IncidentCreated {
        incident_id: i32,
        submitted_by: i32,
    },
    IncidentTransitioned {
        incident_id: i32,
        actor_id: i32,
        action: String,
        from: String,
        to: String,
    },
}

pub mod prelude;

pub mod audit_logs;
pub mod departments;
pub mod event_types;
pub mod incident_departments;
pub mod incidents;
pub mod login_attempts;
pub mod users;

pub use super::audit_logs::Entity as AuditLogs;
pub use super::departments::Entity as Departments;
pub use super::event_types::Entity as EventTypes;
pub use super::incident_departments::Entity as IncidentDepartments;
pub use super::incidents::Entity as Incidents;
pub use super::login_attempts::Entity as LoginAttempts;
pub use super::users::Entity as Users;

pub mod audit;
pub mod auth_service;
pub mod auth_service_impl;
pub mod sanitizer;
pub mod token_service;
pub mod workflow;
pub mod workflow_service;
pub mod workflow_service_impl;

pub use audit::AuditLogService;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;
pub use token_service::{Claims, TokenError, TokenService};
pub use workflow::TransitionKind;
pub use workflow_service::{
    CreateIncidentRequest, TransitionRequest, WorkflowError, WorkflowService,
};
pub use workflow_service_impl::SeaOrmWorkflowService;

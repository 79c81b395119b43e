use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Incident lifecycle states. The transition graph lives in
/// `services::workflow`; nothing else may derive legality from these values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted_department_review")]
    SubmittedDepartmentReview,
    #[sea_orm(string_value = "department_approved")]
    DepartmentApproved,
    #[sea_orm(string_value = "department_rejected")]
    DepartmentRejected,
    #[sea_orm(string_value = "pending_command_center")]
    PendingCommandCenter,
    #[sea_orm(string_value = "command_center_processed")]
    CommandCenterProcessed,
    #[sea_orm(string_value = "issued_emergency_team")]
    IssuedEmergencyTeam,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// AES-256-GCM encrypted description, base64(nonce || ciphertext).
    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub severity: i32,

    pub is_aviation: bool,

    pub event_type_id: i32,

    pub submitted_by: i32,

    pub status: IncidentStatus,

    /// Last department rejection verdict; retained across resubmission.
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    /// Sanitized resolution text written by the command center.
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution: Option<String>,

    pub resolved_at: Option<String>,

    pub closed_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event_types::Entity",
        from = "Column::EventTypeId",
        to = "super::event_types::Column::Id"
    )]
    EventType,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmittedBy",
        to = "super::users::Column::Id"
    )]
    SubmittedBy,
}

impl Related<super::event_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventType.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubmittedBy.def()
    }
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        super::incident_departments::Relation::Department.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::incident_departments::Relation::Incident.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

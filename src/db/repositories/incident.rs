use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::incidents::IncidentStatus;
use crate::entities::{departments, incident_departments, incidents};

/// Insert payload; `description` arrives already encrypted.
pub struct NewIncident {
    pub description: String,
    pub severity: i32,
    pub is_aviation: bool,
    pub event_type_id: i32,
    pub submitted_by: i32,
    pub department_ids: Vec<i32>,
}

/// One status move, applied as a single conditional UPDATE. `from` is part of
/// the WHERE clause: if a concurrent writer already moved the record, zero
/// rows match and the caller reports the lost race as an invalid transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    pub rejection_reason: Option<String>,
    pub resolution: Option<String>,
    /// Re-encrypted description, for resubmission edits.
    pub description: Option<String>,
    pub set_resolved_at: bool,
    pub set_closed_at: bool,
}

pub struct IncidentRepository {
    conn: DatabaseConnection,
}

impl IncidentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new: NewIncident) -> Result<incidents::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let incident = incidents::ActiveModel {
            description: Set(new.description),
            severity: Set(new.severity),
            is_aviation: Set(new.is_aviation),
            event_type_id: Set(new.event_type_id),
            submitted_by: Set(new.submitted_by),
            status: Set(IncidentStatus::Draft),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert incident")?;

        for department_id in new.department_ids {
            incident_departments::ActiveModel {
                incident_id: Set(incident.id),
                department_id: Set(department_id),
            }
            .insert(&txn)
            .await
            .context("Failed to link incident department")?;
        }

        txn.commit().await?;
        Ok(incident)
    }

    pub async fn get(&self, id: i32) -> Result<Option<incidents::Model>> {
        incidents::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query incident")
    }

    pub async fn get_with_departments(
        &self,
        id: i32,
    ) -> Result<Option<(incidents::Model, Vec<departments::Model>)>> {
        let Some(incident) = self.get(id).await? else {
            return Ok(None);
        };

        let departments = incident
            .find_related(departments::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query incident departments")?;

        Ok(Some((incident, departments)))
    }

    pub async fn list(&self) -> Result<Vec<incidents::Model>> {
        incidents::Entity::find()
            .order_by_desc(incidents::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list incidents")
    }

    /// Compare-and-swap the status. Returns false when the record was not in
    /// `from` at write time, which covers both stale reads and concurrent
    /// transitions racing on the same incident.
    pub async fn apply_transition(
        &self,
        id: i32,
        from: IncidentStatus,
        to: IncidentStatus,
        update: TransitionUpdate,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut stmt = incidents::Entity::update_many()
            .col_expr(incidents::Column::Status, Expr::value(to))
            .col_expr(incidents::Column::UpdatedAt, Expr::value(now.clone()));

        if let Some(reason) = update.rejection_reason {
            stmt = stmt.col_expr(incidents::Column::RejectionReason, Expr::value(reason));
        }
        if let Some(resolution) = update.resolution {
            stmt = stmt.col_expr(incidents::Column::Resolution, Expr::value(resolution));
        }
        if let Some(description) = update.description {
            stmt = stmt.col_expr(incidents::Column::Description, Expr::value(description));
        }
        if update.set_resolved_at {
            stmt = stmt.col_expr(incidents::Column::ResolvedAt, Expr::value(now.clone()));
        }
        if update.set_closed_at {
            stmt = stmt.col_expr(incidents::Column::ClosedAt, Expr::value(now));
        }

        let result = stmt
            .filter(incidents::Column::Id.eq(id))
            .filter(incidents::Column::Status.eq(from))
            .exec(&self.conn)
            .await
            .context("Failed to apply incident transition")?;

        Ok(result.rows_affected > 0)
    }
}

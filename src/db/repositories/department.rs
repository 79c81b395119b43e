use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set};

use crate::entities::departments;

pub struct DepartmentRepository {
    conn: DatabaseConnection,
}

impl DepartmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, name: &str) -> Result<departments::Model> {
        departments::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert department")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<departments::Model>> {
        departments::Entity::find()
            .filter(departments::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query department by name")
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(departments::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query department")?
            .is_some())
    }

    pub async fn list(&self) -> Result<Vec<departments::Model>> {
        departments::Entity::find()
            .order_by_asc(departments::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list departments")
    }
}

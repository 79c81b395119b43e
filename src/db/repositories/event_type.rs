use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set};

use crate::entities::event_types;

pub struct EventTypeRepository {
    conn: DatabaseConnection,
}

impl EventTypeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<event_types::Model> {
        event_types::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert event type")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<event_types::Model>> {
        event_types::Entity::find()
            .filter(event_types::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query event type by name")
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(event_types::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query event type")?
            .is_some())
    }

    pub async fn list(&self) -> Result<Vec<event_types::Model>> {
        event_types::Entity::find()
            .order_by_asc(event_types::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list event types")
    }
}

use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set};

use crate::entities::login_attempts;

/// Append-only attempt ledger. Rows are written once and only ever read back
/// for the lockout window count.
pub struct AttemptRepository {
    conn: DatabaseConnection,
}

impl AttemptRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn record(&self, user_id: i32, success: bool, ip_address: &str) -> Result<()> {
        let attempt = login_attempts::ActiveModel {
            user_id: Set(user_id),
            attempt_time: Set(chrono::Utc::now().to_rfc3339()),
            success: Set(success),
            ip_address: Set(ip_address.to_string()),
            ..Default::default()
        };

        attempt
            .insert(&self.conn)
            .await
            .context("Failed to record login attempt")?;

        Ok(())
    }

    /// Failed attempts at or after `cutoff` (RFC 3339). Timestamps are written
    /// with a fixed UTC offset, so string comparison orders correctly.
    pub async fn failed_count_since(&self, user_id: i32, cutoff: &str) -> Result<u64> {
        login_attempts::Entity::find()
            .filter(login_attempts::Column::UserId.eq(user_id))
            .filter(login_attempts::Column::Success.eq(false))
            .filter(login_attempts::Column::AttemptTime.gte(cutoff))
            .count(&self.conn)
            .await
            .context("Failed to count recent login failures")
    }
}

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::crypto::password;
use crate::entities::users;

/// Credential store. Password hash and salt are written together at creation
/// and reset time; no code path sets one without the other.
pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    /// Create a user with a fresh salt and digest. The caller is responsible
    /// for rejecting duplicate usernames first.
    pub async fn create(
        &self,
        username: &str,
        plaintext_password: &str,
        role_level: i32,
        email: Option<String>,
    ) -> Result<users::Model> {
        let salt = password::generate_salt();
        let hash = password::hash_password(&salt, plaintext_password);
        let now = chrono::Utc::now().to_rfc3339();

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash),
            salt: Set(salt),
            role_level: Set(role_level),
            email: Set(email),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(&self.conn)
            .await
            .context("Failed to insert user")
    }

    /// Rotate the credential: new salt, new digest, in one write.
    pub async fn update_password(&self, user_id: i32, new_password: &str) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let salt = password::generate_salt();
        let hash = password::hash_password(&salt, new_password);
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(hash);
        active.salt = Set(salt);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Users are never hard-deleted; this flips the active flag.
    pub async fn deactivate(&self, user_id: i32) -> Result<bool> {
        let Some(user) = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for deactivation")?
        else {
            return Ok(false);
        };

        let now = chrono::Utc::now().to_rfc3339();
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }
}

//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;
use tracing::warn;

use crate::config::LockoutConfig;
use crate::crypto::password;
use crate::db::Store;
use crate::domain::events::AuditEvent;
use crate::entities::users;
use crate::models::Role;
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    lockout: LockoutConfig,
    event_bus: broadcast::Sender<AuditEvent>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        lockout: LockoutConfig,
        event_bus: broadcast::Sender<AuditEvent>,
    ) -> Self {
        Self {
            store,
            lockout,
            event_bus,
        }
    }

    /// Sliding-window lockout: failed attempts inside the trailing window,
    /// counted from the ledger as it stands right now. Two concurrent calls
    /// near the threshold may both pass; the over-admission is bounded by the
    /// concurrent-request count because every call re-reads the ledger.
    async fn is_locked(&self, user_id: i32) -> Result<bool, AuthError> {
        let cutoff = (Utc::now()
            - Duration::seconds(i64::try_from(self.lockout.ban_duration_seconds).unwrap_or(0)))
        .to_rfc3339();

        let failed = self.store.failed_attempts_since(user_id, &cutoff).await?;
        Ok(failed >= u64::from(self.lockout.max_failed_attempts))
    }

    fn emit_rejection(&self, username: &str, ip_address: &str, reason: &str) {
        let _ = self.event_bus.send(AuditEvent::LoginRejected {
            username: username.to_string(),
            ip_address: ip_address.to_string(),
            reason: reason.to_string(),
        });
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn verify_credentials(
        &self,
        username: &str,
        password_input: &str,
        ip_address: &str,
    ) -> Result<users::Model, AuthError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            // No user id to attach a ledger row to
            self.emit_rejection(username, ip_address, "unknown_user");
            return Err(AuthError::UnknownUser);
        };

        // Locked accounts reject even a correct password, so that lockout
        // does not leak credential validity.
        if self.is_locked(user.id).await? {
            self.store
                .record_login_attempt(user.id, false, ip_address)
                .await?;
            self.emit_rejection(username, ip_address, "account_locked");
            warn!(username, "login rejected: account locked");
            return Err(AuthError::AccountLocked);
        }

        if !user.is_active {
            self.store
                .record_login_attempt(user.id, false, ip_address)
                .await?;
            self.emit_rejection(username, ip_address, "inactive");
            return Err(AuthError::Inactive);
        }

        if !password::verify_password(&user.salt, password_input, &user.password_hash) {
            self.store
                .record_login_attempt(user.id, false, ip_address)
                .await?;
            self.emit_rejection(username, ip_address, "bad_password");
            return Err(AuthError::BadPassword);
        }

        self.store
            .record_login_attempt(user.id, true, ip_address)
            .await?;
        let _ = self.event_bus.send(AuditEvent::LoginSucceeded {
            username: username.to_string(),
            ip_address: ip_address.to_string(),
        });

        Ok(user)
    }

    async fn register(
        &self,
        username: &str,
        password_input: &str,
        role_level: i32,
        email: Option<String>,
    ) -> Result<users::Model, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }

        if password_input.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if Role::from_level(role_level).is_none() {
            return Err(AuthError::Validation(format!(
                "Unknown role level: {role_level}"
            )));
        }

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let user = self
            .store
            .create_user(username, password_input, role_level, email)
            .await?;

        let _ = self.event_bus.send(AuditEvent::UserRegistered {
            username: user.username.clone(),
            role_level,
        });

        Ok(user)
    }

    async fn change_password(
        &self,
        user: &users::Model,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if !password::verify_password(&user.salt, old_password, &user.password_hash) {
            return Err(AuthError::BadPassword);
        }

        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        self.store
            .update_user_password(user.id, new_password)
            .await?;

        let _ = self
            .event_bus
            .send(AuditEvent::PasswordChanged { user_id: user.id });

        Ok(())
    }
}

//! Domain service for credential verification and account registration.

use thiserror::Error;

use crate::entities::users;

/// Errors specific to authentication operations. The HTTP boundary collapses
/// the credential kinds into one uniform message; the audit log keeps them
/// distinct.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Too many recent failures; rejected without consulting the password.
    #[error("account is locked")]
    AccountLocked,

    #[error("unknown user")]
    UnknownUser,

    #[error("bad password")]
    BadPassword,

    #[error("account is deactivated")]
    Inactive,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials against the store.
    ///
    /// Order is fixed: lockout first (using the attempt history as it stood
    /// before this call), then user existence, then a constant-time digest
    /// comparison. Every call appends exactly one ledger row except the
    /// unknown-username case, which has no user id to attach it to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccountLocked`], [`AuthError::UnknownUser`],
    /// [`AuthError::BadPassword`] or [`AuthError::Inactive`].
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
    ) -> Result<users::Model, AuthError>;

    /// Creates a user with a fresh salt and digest.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] for duplicates and
    /// [`AuthError::Validation`] for malformed input.
    async fn register(
        &self,
        username: &str,
        password: &str,
        role_level: i32,
        email: Option<String>,
    ) -> Result<users::Model, AuthError>;

    /// Rotates a credential after verifying the current password. Salt and
    /// digest are replaced together in one write.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::BadPassword`] when the current password does not
    /// match and [`AuthError::Validation`] for a weak replacement.
    async fn change_password(
        &self,
        user: &users::Model,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

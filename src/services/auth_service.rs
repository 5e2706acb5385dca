//! Domain service for registration, login and account management.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("{message}")]
    Validation {
        /// Form field the message belongs to ("username", "email", ...).
        field: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// The caller's own profile plus account basics, as shown on /profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    pub username: String,
    pub email: String,
    pub color: String,
}

/// Domain service trait for identity.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a user and its profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with the offending field for
    /// duplicate usernames/emails, malformed emails and short passwords.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserInfo, AuthError>;

    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on a bad username or a bad
    /// password; the two cases are indistinguishable to the caller.
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError>;

    /// The caller's profile (display color) and account basics.
    async fn get_profile(&self, user_id: i32) -> Result<ProfileInfo, AuthError>;

    /// Updates the caller's own display color and/or email address.
    async fn update_profile(
        &self,
        user_id: i32,
        color: Option<String>,
        email: Option<String>,
    ) -> Result<ProfileInfo, AuthError>;

    /// Changes a password after verifying the current one.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

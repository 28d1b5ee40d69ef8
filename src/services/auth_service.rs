//! Domain service for registration, login and API-key authentication.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;
use crate::models::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /api/users/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `PUT /api/users/password`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// A user together with the bearer token to present on later requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and returns it with a fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for missing or malformed fields and
    /// [`AuthError::Conflict`] when the email is already registered.
    async fn register(&self, request: RegisterRequest) -> Result<AuthenticatedUser, AuthError>;

    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Resolves a bearer token or API key to its user.
    async fn authenticate(&self, token: &str) -> Result<Option<User>, AuthError>;

    async fn get_user(&self, id: UserId) -> Result<User, AuthError>;

    /// Replaces the password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the current password is wrong
    /// or the new one is too short or unchanged.
    async fn change_password(
        &self,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Issues a new API key. The previous key stops working at once.
    async fn regenerate_api_key(&self, id: UserId) -> Result<String, AuthError>;
}

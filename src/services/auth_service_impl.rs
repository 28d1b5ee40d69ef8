//! Store-backed implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::SupportStore;
use crate::db::repositories::user::{generate_api_key, hash_password, verify_password};
use crate::domain::UserId;
use crate::models::{NewUser, User, UserCredentials};
use crate::services::auth_service::{
    AuthError, AuthService, AuthenticatedUser, RegisterRequest,
};
use crate::services::validation;

pub struct DefaultAuthService {
    store: Arc<dyn SupportStore>,
    security: SecurityConfig,
}

impl DefaultAuthService {
    #[must_use]
    pub fn new(store: Arc<dyn SupportStore>, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Verifies off the async workers. A hash that cannot be parsed counts
    /// as a mismatch and is logged.
    async fn check_password(
        credentials: &UserCredentials,
        password: &str,
    ) -> Result<bool, AuthError> {
        let password = password.to_string();
        let hash = credentials.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password check task failed: {e}")))?;

        Ok(verified.unwrap_or_else(|e| {
            tracing::warn!(
                user_id = %credentials.user.id,
                "Stored password hash is unusable: {e:#}"
            );
            false
        }))
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let security = self.security.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(AuthError::from)
    }
}

#[async_trait]
impl AuthService for DefaultAuthService {
    async fn register(&self, request: RegisterRequest) -> Result<AuthenticatedUser, AuthError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AuthError::Validation("Please add a name".to_string()));
        }
        let email = validation::email(&request.email).map_err(AuthError::Validation)?;
        validation::password(&request.password, self.security.min_password_length)
            .map_err(AuthError::Validation)?;

        if self.store.get_user_credentials(&email).await?.is_some() {
            return Err(AuthError::Conflict("User already exists".to_string()));
        }

        // Argon2 is CPU bound; keep it off the async workers
        let password_hash = self.hash(request.password).await?;

        let api_key = generate_api_key();
        let user = self
            .store
            .create_user(NewUser {
                name,
                email,
                password_hash,
                api_key: api_key.clone(),
                is_admin: false,
            })
            .await
            .map_err(|e| {
                if format!("{e:#}").contains("UNIQUE") {
                    AuthError::Conflict("User already exists".to_string())
                } else {
                    AuthError::from(e)
                }
            })?;

        info!("Registered user {} ({})", user.id, user.email);
        Ok(AuthenticatedUser {
            user,
            token: api_key,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        let Some(credentials) = self.store.get_user_credentials(email.trim()).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !Self::check_password(&credentials, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(AuthenticatedUser {
            user: credentials.user,
            token: credentials.api_key,
        })
    }

    async fn authenticate(&self, token: &str) -> Result<Option<User>, AuthError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.store.get_user_by_api_key(token).await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, AuthError> {
        self.store.get_user(id).await?.ok_or(AuthError::UserNotFound)
    }

    async fn change_password(
        &self,
        id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validation::password(new_password, self.security.min_password_length)
            .map_err(AuthError::Validation)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let user = self.get_user(id).await?;
        let credentials = self
            .store
            .get_user_credentials(&user.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !Self::check_password(&credentials, current_password).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = self.hash(new_password.to_string()).await?;
        if !self.store.update_user_password(id, password_hash).await? {
            return Err(AuthError::UserNotFound);
        }

        info!("Password changed for user {id}");
        Ok(())
    }

    async fn regenerate_api_key(&self, id: UserId) -> Result<String, AuthError> {
        let api_key = generate_api_key();
        if !self.store.update_user_api_key(id, api_key.clone()).await? {
            return Err(AuthError::UserNotFound);
        }

        info!("API key regenerated for user {id}");
        Ok(api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    fn service() -> DefaultAuthService {
        // Cheap hashing parameters keep the tests fast
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        DefaultAuthService::new(Arc::new(InMemoryStore::new()), security)
    }

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Robin".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service();
        let registered = service
            .register(request("Robin@Example.com", "correct horse"))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "robin@example.com");
        assert!(!registered.user.is_admin);
        assert_eq!(registered.token.len(), 64);

        let logged_in = service
            .login("robin@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert_eq!(logged_in.token, registered.token);

        let resolved = service.authenticate(&registered.token).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(registered.user.id));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let service = service();
        service
            .register(request("dup@example.com", "password1"))
            .await
            .unwrap();
        let err = service
            .register(request("DUP@example.com", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let service = service();
        assert!(matches!(
            service.register(request("nope", "password1")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service.register(request("a@b.co", "short")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            service
                .register(RegisterRequest {
                    name: "  ".to_string(),
                    ..request("a@b.co", "password1")
                })
                .await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn password_change_requires_the_current_password() {
        let service = service();
        let account = service
            .register(request("kim@example.com", "first-password"))
            .await
            .unwrap();
        let id = account.user.id;

        for (current, new) in [
            ("wrong-password", "second-password"),
            ("first-password", "short"),
            ("first-password", "first-password"),
        ] {
            assert!(matches!(
                service.change_password(id, current, new).await,
                Err(AuthError::Validation(_))
            ));
        }

        service
            .change_password(id, "first-password", "second-password")
            .await
            .unwrap();
        assert!(matches!(
            service.login("kim@example.com", "first-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(
            service
                .login("kim@example.com", "second-password")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn regenerated_key_replaces_the_old_one() {
        let service = service();
        let account = service
            .register(request("lee@example.com", "password1"))
            .await
            .unwrap();

        let fresh = service.regenerate_api_key(account.user.id).await.unwrap();
        assert_eq!(fresh.len(), 64);
        assert_ne!(fresh, account.token);
        assert!(service.authenticate(&account.token).await.unwrap().is_none());
        assert_eq!(
            service.authenticate(&fresh).await.unwrap().map(|u| u.id),
            Some(account.user.id)
        );

        assert!(matches!(
            service.regenerate_api_key(UserId::new(999)).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_fails_login() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_user(NewUser {
                name: "Ash".to_string(),
                email: "ash@example.com".to_string(),
                password_hash: "not-a-phc-string".to_string(),
                api_key: generate_api_key(),
                is_admin: false,
            })
            .await
            .unwrap();
        let service = DefaultAuthService::new(store, SecurityConfig::default());

        assert!(matches!(
            service.login("ash@example.com", "anything").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let service = service();
        service
            .register(request("sam@example.com", "password1"))
            .await
            .unwrap();

        assert!(matches!(
            service.login("sam@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("ghost@example.com", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(service.authenticate("not-a-key").await.unwrap().is_none());
        assert!(service.authenticate("").await.unwrap().is_none());
    }
}

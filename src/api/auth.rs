use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiKeyResponse, ApiResponse, AppState};
use crate::domain::UserId;
use crate::models::User;
use crate::services::{AuthenticatedUser, ChangePasswordRequest, LoginRequest, RegisterRequest};

const SESSION_USER_KEY: &str = "user_id";

/// Identity of the authenticated caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(Some(id)) = session.get::<i32>(SESSION_USER_KEY).await {
        let user_id = UserId::new(id);
        tracing::Span::current().record("user_id", id);
        request.extensions_mut().insert(CurrentUser(user_id));
        return next.run(request).await;
    }

    if let Some(key) = extract_api_key(&headers) {
        match state.auth().authenticate(&key).await {
            Ok(Some(user)) => {
                tracing::Span::current().record("user_id", user.id.value());
                request.extensions_mut().insert(CurrentUser(user.id));
                return next.run(request).await;
            }
            Ok(None) => tracing::debug!("Rejected unknown API key"),
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    ApiError::unauthorized("Not authorized, no token").into_response()
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthenticatedUser>), ApiError> {
    let registered = state.auth().register(payload).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// POST /users/login
/// Verifies credentials, starts a session and returns the user with its token
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthenticatedUser>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Please add an email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Please add a password"));
    }

    let authenticated = state
        .auth()
        .login(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_USER_KEY, authenticated.user.id.value())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = authenticated.user.id.value(), "User logged in");
    Ok(Json(authenticated))
}

/// POST /users/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session: {e}");
    }
    Json(ApiResponse::ok())
}

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<User>, ApiError> {
    let user = state.auth().get_user(user_id).await?;
    Ok(Json(user))
}

/// PUT /users/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    state
        .auth()
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

/// POST /users/api-key/regenerate
/// Sessions keep working; only the old key is revoked
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let token = state.auth().regenerate_api_key(user_id).await?;
    Ok(Json(ApiKeyResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn api_key_header_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_static("from-header"));
        headers.insert("Authorization", HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer  abc123 "));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("abc123"));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(extract_api_key(&headers), None);
    }
}

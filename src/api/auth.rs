use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{
    ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, UpdateProfileRequest,
};
use crate::services::{ProfileInfo, UserInfo};

const SESSION_USER_ID: &str = "user_id";
const SESSION_USERNAME: &str = "user";

/// The authenticated caller, resolved by the middleware and attached to the
/// request for handlers to extract.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login/register)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Session first (fastest path for browser clients)
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_ID).await {
        let username = session
            .get::<String>(SESSION_USERNAME)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        tracing::Span::current().record("user_id", user_id);
        request.extensions_mut().insert(CurrentUser {
            id: user_id,
            username,
        });
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(&headers)
        && let Ok(Some(user)) = state.store.verify_api_key(&key).await
    {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser {
            id: user.id,
            username: user.username,
        });
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

/// Extract an API key from headers.
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

async fn start_session(session: &Session, user: &UserInfo) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USERNAME, &user.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create a user with its profile and log the new user in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state
        .auth_service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    start_session(&session, &user).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    start_session(&session, &user).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/logout
/// Invalidate the current session.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user = state.auth_service.get_user_info(&caller.username).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// PUT /auth/password
/// Change password (requires current password verification).
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service
        .change_password(
            &caller.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// GET /profile
/// The caller's own profile and account basics.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ProfileInfo>>, ApiError> {
    let profile = state.auth_service.get_profile(caller.id).await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// POST /profile
/// Update the caller's display color and/or email.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileInfo>>, ApiError> {
    let profile = state
        .auth_service
        .update_profile(caller.id, payload.color, payload.email)
        .await?;

    Ok(Json(ApiResponse::success(profile)))
}

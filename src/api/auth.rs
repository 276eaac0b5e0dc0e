//! Registration and login endpoints

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{Session, create_session_token};
use crate::data::User;
use crate::error::AppError;
use crate::service::AccountService;

use super::dto::AuthResponse;

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
///
/// `identifier` accepts a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    let session = Session::for_user(&user.id, &user.username, state.config.auth.session_max_age);
    create_session_token(&session, &state.config.auth.session_secret)
}

async fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let token = issue_token(state, user)?;
    let counts = state.db.get_user_counts(&user.id).await?;
    Ok(AuthResponse {
        token,
        user: crate::api::user_to_response(user, &counts),
    })
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let service = AccountService::new(
        state.db.clone(),
        state.feed_cache.clone(),
        state.notifier.clone(),
    );
    let user = service
        .register(&request.username, &request.email, &request.password)
        .await?;

    let response = auth_response(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let service = AccountService::new(
        state.db.clone(),
        state.feed_cache.clone(),
        state.notifier.clone(),
    );
    let user = service.login(&request.identifier, &request.password).await?;

    let response = auth_response(&state, &user).await?;
    Ok(Json(response))
}

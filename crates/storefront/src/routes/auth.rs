//! Account route handlers: register, login, logout, me.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthService, Registration};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn session_error(e: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session: {e}"))
}

async fn sign_in(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user)
        .await
        .map_err(session_error)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and sign it in.
#[instrument(skip(state, session, payload))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let Json(form) = payload?;
    let user = AuthService::new(state.pool()).register(&form).await?;
    let current = CurrentUser::from(&user);

    sign_in(&session, &current).await?;
    tracing::info!(user_id = %current.id, "account registered");

    Ok((StatusCode::CREATED, Json(current)))
}

/// Sign in with email and password.
#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<CurrentUser>> {
    let Json(request) = payload?;
    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;
    let current = CurrentUser::from(&user);

    sign_in(&session, &current).await?;
    tracing::info!(user_id = %current.id, "signed in");

    Ok(Json(current))
}

/// Sign out. Succeeds whether or not anyone was signed in.
#[instrument(skip(session, user))]
pub async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Json<Value>> {
    clear_current_user(&session).await.map_err(session_error)?;
    session.flush().await.map_err(session_error)?;
    clear_sentry_user();

    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "signed out");
    }

    Ok(Json(json!({ "success": true, "message": "Signed out" })))
}

/// The signed-in user, reloaded from the database.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(Json(CurrentUser::from(&user)))
}

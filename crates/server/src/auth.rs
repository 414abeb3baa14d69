//! Login, password reset and the caller's own account.

use api_types::auth::{Accepted, Login, PasswordChange, PasswordResetConfirm, PasswordResetRequest};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{Account, EngineError};

use crate::{ServerError, server::ServerState};

/// Message returned for every reset request, known email or not.
const RESET_ACCEPTED: &str = "if the email is registered, reset instructions have been sent";

/// Handle requests for checking credentials without calling another route.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Account>, ServerError> {
    match state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await
    {
        Ok(account) => {
            tracing::info!(account_id = %account.id, "login");
            Ok(Json(account))
        }
        Err(err) => {
            if matches!(err, EngineError::Unauthorized(_)) {
                tracing::warn!("rejected login");
            }
            Err(err.into())
        }
    }
}

/// Starts a password reset. Always answers `202 Accepted`.
pub async fn request_password_reset(
    State(state): State<ServerState>,
    Json(payload): Json<PasswordResetRequest>,
) -> (StatusCode, Json<Accepted>) {
    match state
        .engine
        .request_password_reset(&payload.email, Utc::now())
        .await
    {
        Ok(Some(token)) => {
            tracing::info!(
                target: "bawasa::outbox",
                to = %payload.email.trim(),
                %token,
                "password reset token issued"
            );
        }
        Ok(None) => {}
        Err(err) => tracing::error!("password reset request failed: {err}"),
    }

    (
        StatusCode::ACCEPTED,
        Json(Accepted {
            message: RESET_ACCEPTED.to_string(),
        }),
    )
}

pub async fn confirm_password_reset(
    State(state): State<ServerState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .reset_password(&payload.token, &payload.new_password, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(Extension(account): Extension<Account>) -> Json<Account> {
    Json(account)
}

pub async fn change_password(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .change_password(&account, &payload.current_password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

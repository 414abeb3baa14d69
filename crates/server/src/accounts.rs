use api_types::account::{AccountNew, AccountQuery};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Account, NewAccount, Role};

use crate::{ServerError, convert, server::ServerState};

/// Handle requests for creating a new administrator
pub async fn account_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<Account>), ServerError> {
    let account = state
        .engine
        .create_account(
            &actor,
            NewAccount {
                email: payload.email,
                password: payload.password,
                full_name: payload.full_name,
                role: Role::Admin,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<Vec<Account>>, ServerError> {
    let role = query.role.map(convert::role).transpose()?;
    Ok(Json(state.engine.list_accounts(&actor, role).await?))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ServerError> {
    Ok(Json(state.engine.account(&actor, &id).await?))
}

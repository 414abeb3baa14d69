use api_types::issue::{IssueNew, IssueQuery, IssueStatusUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Account, IssueReport, NewIssue};

use crate::{ServerError, convert, server::ServerState};

pub async fn issue_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<IssueNew>,
) -> Result<(StatusCode, Json<IssueReport>), ServerError> {
    let issue = state
        .engine
        .create_issue(
            &actor,
            NewIssue {
                issue_type: payload.issue_type,
                description: payload.description,
                priority: convert::issue_priority(payload.priority)?,
                consumer_id: payload.consumer_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<IssueQuery>,
) -> Result<Json<Vec<IssueReport>>, ServerError> {
    let status = query.status.map(convert::issue_status).transpose()?;
    Ok(Json(state.engine.list_issues(&actor, status).await?))
}

pub async fn update_status(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<IssueStatusUpdate>,
) -> Result<Json<IssueReport>, ServerError> {
    let status = convert::issue_status(payload.status)?;
    Ok(Json(
        state.engine.update_issue_status(&actor, &id, status).await?,
    ))
}

use api_types::assignment::{AssignmentNew, AssignmentQuery, AssignmentStatusUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Account, Assignment, AssignmentFilter};

use crate::{ServerError, convert, server::ServerState};

pub async fn assign(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<AssignmentNew>,
) -> Result<(StatusCode, Json<Vec<Assignment>>), ServerError> {
    let assignments = state
        .engine
        .assign_reader(&actor, &payload.reader_id, &payload.consumer_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(assignments)))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<Vec<Assignment>>, ServerError> {
    let filter = AssignmentFilter {
        reader_id: query.reader_id,
        status: query.status.map(convert::assignment_status).transpose()?,
    };
    Ok(Json(state.engine.list_assignments(&actor, filter).await?))
}

pub async fn update_status(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AssignmentStatusUpdate>,
) -> Result<Json<Assignment>, ServerError> {
    let status = convert::assignment_status(payload.status)?;
    let assignment = state
        .engine
        .update_assignment_status(&actor, &id, status)
        .await?;
    Ok(Json(assignment))
}

use api_types::staff::{CashierNew, MeterReaderNew};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Account, Cashier, MeterReader};

use crate::{ServerError, server::ServerState};

pub async fn cashier_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<CashierNew>,
) -> Result<(StatusCode, Json<Cashier>), ServerError> {
    let cashier = state
        .engine
        .register_cashier(
            &actor,
            &payload.email,
            &payload.password,
            &payload.full_name,
            &payload.employee_no,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(cashier)))
}

pub async fn cashiers(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Cashier>>, ServerError> {
    Ok(Json(state.engine.list_cashiers(&actor).await?))
}

pub async fn meter_reader_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<MeterReaderNew>,
) -> Result<(StatusCode, Json<MeterReader>), ServerError> {
    let reader = state
        .engine
        .register_meter_reader(
            &actor,
            &payload.email,
            &payload.password,
            &payload.full_name,
            payload.assigned_area.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

pub async fn meter_readers(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<MeterReader>>, ServerError> {
    Ok(Json(state.engine.list_meter_readers(&actor).await?))
}

/// Handle requests for the meter reader profile of the caller
pub async fn my_meter_reader(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<MeterReader>, ServerError> {
    Ok(Json(state.engine.my_meter_reader(&actor).await?))
}

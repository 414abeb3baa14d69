//! Billing cycles and meter readings.

use api_types::{
    cycle::{Cycle, CycleResult},
    reading::{PresentReading, ReadingQuery},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use engine::{Account, MeterReading, ReadingFilter};

use crate::{ServerError, server::ServerState};

/// Handle requests for opening the reading cycle of a month
pub async fn open_cycle(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<Cycle>,
) -> Result<Json<CycleResult>, ServerError> {
    let created = state
        .engine
        .open_billing_cycle(&actor, payload.month)
        .await?;
    Ok(Json(CycleResult {
        month: payload.month,
        created,
    }))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<ReadingQuery>,
) -> Result<Json<Vec<MeterReading>>, ServerError> {
    let readings = state
        .engine
        .list_readings(
            &actor,
            ReadingFilter {
                month: query.month,
                consumer_id: query.consumer_id,
            },
        )
        .await?;
    Ok(Json(readings))
}

/// Handle requests for recording the present value of a reading
pub async fn record(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PresentReading>,
) -> Result<Json<MeterReading>, ServerError> {
    let reading_date = payload
        .reading_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let reading = state
        .engine
        .record_present_reading(
            &actor,
            &id,
            payload.present_reading,
            reading_date,
            payload.remarks.as_deref(),
        )
        .await?;
    Ok(Json(reading))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<MeterReading>, ServerError> {
    Ok(Json(state.engine.reading(&actor, &id).await?))
}

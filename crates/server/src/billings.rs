//! Billing API endpoints

use api_types::{
    billing::{BillingQuery, OverdueResult, OverdueSweep, PaymentStatusUpdate},
    cycle::{Cycle, CycleResult},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use engine::{Account, Billing, BillingFilter};
use serde::Serialize;

use crate::{ServerError, convert, server::ServerState};

/// One line of the billing CSV export.
#[derive(Serialize)]
struct BillingRow<'a> {
    id: &'a str,
    consumer_id: &'a str,
    billing_month: NaiveDate,
    consumption_m3: i64,
    years_of_service: u32,
    discount_percent: u8,
    total_amount_due_minor: i64,
    amount_paid_minor: i64,
    outstanding_minor: i64,
    due_date: NaiveDate,
    payment_status: &'static str,
}

impl<'a> From<&'a Billing> for BillingRow<'a> {
    fn from(billing: &'a Billing) -> Self {
        Self {
            id: &billing.id,
            consumer_id: &billing.consumer_id,
            billing_month: billing.billing_month,
            consumption_m3: billing.breakdown.consumption_m3,
            years_of_service: billing.breakdown.years_of_service,
            discount_percent: billing.breakdown.discount_percent,
            total_amount_due_minor: billing.total_amount_due(),
            amount_paid_minor: billing.amount_paid,
            outstanding_minor: billing.outstanding(),
            due_date: billing.due_date,
            payment_status: billing.payment_status.as_str(),
        }
    }
}

fn to_filter(query: BillingQuery) -> Result<BillingFilter, ServerError> {
    Ok(BillingFilter {
        consumer_id: query.consumer_id,
        month: query.month,
        status: query.status.map(convert::payment_status).transpose()?,
    })
}

fn to_csv(billings: &[Billing]) -> Result<Vec<u8>, String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for billing in billings {
        writer
            .serialize(BillingRow::from(billing))
            .map_err(|err| err.to_string())?;
    }
    writer.into_inner().map_err(|err| err.to_string())
}

/// Handle requests for billing every read reading of a month
pub async fn bill_cycle(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<Cycle>,
) -> Result<Json<CycleResult>, ServerError> {
    let created = state
        .engine
        .generate_cycle_billings(&actor, payload.month)
        .await?;
    Ok(Json(CycleResult {
        month: payload.month,
        created,
    }))
}

/// Handle requests for billing a single reading
pub async fn generate(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(reading_id): Path<String>,
) -> Result<(StatusCode, Json<Billing>), ServerError> {
    let billing = state.engine.generate_billing(&actor, &reading_id).await?;
    Ok((StatusCode::CREATED, Json(billing)))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<BillingQuery>,
) -> Result<Json<Vec<Billing>>, ServerError> {
    let billings = state
        .engine
        .list_billings(&actor, to_filter(query)?)
        .await?;
    Ok(Json(billings))
}

/// Billings of the calling consumer.
pub async fn mine(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Billing>>, ServerError> {
    Ok(Json(state.engine.my_billings(&actor).await?))
}

/// Same filters as [`list`], rendered as `text/csv`.
pub async fn export(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<BillingQuery>,
) -> Result<Response, ServerError> {
    let billings = state
        .engine
        .list_billings(&actor, to_filter(query)?)
        .await?;

    let body = match to_csv(&billings) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!("failed to render billing export: {err}");
            return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"billings.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn mark_overdue(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<OverdueSweep>,
) -> Result<Json<OverdueResult>, ServerError> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let flagged = state.engine.mark_overdue_billings(&actor, today).await?;
    Ok(Json(OverdueResult { flagged }))
}

pub async fn set_status(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> Result<Json<Billing>, ServerError> {
    let status = convert::payment_status(payload.status)?;
    Ok(Json(
        state.engine.set_payment_status(&actor, &id, status).await?,
    ))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Billing>, ServerError> {
    Ok(Json(state.engine.billing(&actor, &id).await?))
}

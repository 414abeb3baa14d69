use api_types::payment::PaymentNew;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Account, Billing, Payment};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

/// Response of a recorded payment: the ledger row and the updated billing.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub payment: Payment,
    pub billing: Billing,
}

pub async fn payment_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(billing_id): Path<String>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<PaymentRecorded>), ServerError> {
    let (billing, payment) = state
        .engine
        .record_payment(
            &actor,
            &billing_id,
            payload.amount_minor,
            payload.reference.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentRecorded { payment, billing })))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(billing_id): Path<String>,
) -> Result<Json<Vec<Payment>>, ServerError> {
    Ok(Json(state.engine.list_payments(&actor, &billing_id).await?))
}

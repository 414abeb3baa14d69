//! Reports API endpoints

use api_types::report::{DashboardQuery, RevenueQuery};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::{Account, DashboardSummary, RevenueReport};

use crate::{ServerError, server::ServerState};

/// Handle requests for the collected revenue of a year, month by month
pub async fn revenue(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, ServerError> {
    Ok(Json(state.engine.revenue_for_year(&actor, query.year).await?))
}

pub async fn dashboard(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, ServerError> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.engine.dashboard_summary(&actor, today).await?))
}

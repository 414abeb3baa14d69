//! Consumer API endpoints

use api_types::consumer::{ConsumerNew, ConsumerQuery, ConsumerUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Account, Consumer, NewConsumer};

use crate::{ServerError, server::ServerState};

pub async fn consumer_new(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<ConsumerNew>,
) -> Result<(StatusCode, Json<Consumer>), ServerError> {
    let consumer = state
        .engine
        .register_consumer(
            &actor,
            NewConsumer {
                email: payload.email,
                password: payload.password,
                full_name: payload.full_name,
                water_meter_no: payload.water_meter_no,
                address: payload.address,
                phone: payload.phone,
                registered_voter: payload.registered_voter,
                initial_reading: payload.initial_reading.unwrap_or(0),
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(consumer)))
}

pub async fn list(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Query(query): Query<ConsumerQuery>,
) -> Result<Json<Vec<Consumer>>, ServerError> {
    let consumers = state
        .engine
        .list_consumers(&actor, query.search.as_deref())
        .await?;
    Ok(Json(consumers))
}

pub async fn get(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Consumer>, ServerError> {
    Ok(Json(state.engine.consumer(&actor, &id).await?))
}

pub async fn update(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ConsumerUpdate>,
) -> Result<Json<Consumer>, ServerError> {
    let consumer = state
        .engine
        .update_consumer(
            &actor,
            &id,
            engine::ConsumerUpdate {
                full_name: payload.full_name,
                water_meter_no: payload.water_meter_no,
                address: payload.address,
                phone: payload.phone,
                registered_voter: payload.registered_voter,
            },
        )
        .await?;
    Ok(Json(consumer))
}

pub async fn mine(
    Extension(actor): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<Consumer>, ServerError> {
    Ok(Json(state.engine.my_consumer(&actor).await?))
}

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{
    ServerError, accounts, assignments, auth, billings, consumers, issues, payments, readings,
    reports, staff,
};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolves HTTP Basic credentials to an [`engine::Account`] and stores it in
/// the request extensions.
async fn authenticate(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(credentials)) = auth_header else {
        return ServerError::Engine(EngineError::Unauthorized(
            "missing credentials".to_string(),
        ))
        .into_response();
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return ServerError::Engine(EngineError::Unauthorized(
            "missing credentials".to_string(),
        ))
        .into_response();
    }

    let account = match state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await
    {
        Ok(account) => account,
        Err(err) => {
            if matches!(err, EngineError::Unauthorized(_)) {
                tracing::warn!(path = %request.uri().path(), "rejected credentials");
            }
            return ServerError::from(err).into_response();
        }
    };

    request.extensions_mut().insert(account);
    next.run(request).await
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/me/password", post(auth::change_password))
        .route("/me/consumer", get(consumers::mine))
        .route("/me/billings", get(billings::mine))
        .route("/me/meter-reader", get(staff::my_meter_reader))
        .route("/accounts", post(accounts::account_new).get(accounts::list))
        .route("/accounts/{id}", get(accounts::get))
        .route("/consumers", post(consumers::consumer_new).get(consumers::list))
        .route(
            "/consumers/{id}",
            get(consumers::get).patch(consumers::update),
        )
        .route("/cashiers", post(staff::cashier_new).get(staff::cashiers))
        .route(
            "/meter-readers",
            post(staff::meter_reader_new).get(staff::meter_readers),
        )
        .route("/cycles", post(readings::open_cycle))
        .route("/cycles/billings", post(billings::bill_cycle))
        .route("/readings", get(readings::list))
        .route(
            "/readings/{id}",
            get(readings::get).put(readings::record),
        )
        .route("/readings/{id}/billing", post(billings::generate))
        .route(
            "/assignments",
            post(assignments::assign).get(assignments::list),
        )
        .route("/assignments/{id}", patch(assignments::update_status))
        .route("/billings", get(billings::list))
        .route("/billings/export", get(billings::export))
        .route("/billings/overdue", post(billings::mark_overdue))
        .route("/billings/{id}", get(billings::get))
        .route("/billings/{id}/status", patch(billings::set_status))
        .route(
            "/billings/{id}/payments",
            post(payments::payment_new).get(payments::list),
        )
        .route("/issues", post(issues::issue_new).get(issues::list))
        .route("/issues/{id}", patch(issues::update_status))
        .route("/reports/revenue", get(reports::revenue))
        .route("/reports/dashboard", get(reports::dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

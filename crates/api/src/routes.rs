use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
    Router,
};
use runtime::{DriverError, SessionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use wagers::Direction;

use crate::{state::AppState, ws};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(snapshot))
        .route("/assets", get(assets))
        .route("/asset", post(switch_asset))
        .route("/wagers", post(submit_wager))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SubmitWagerRequest {
    pub direction: Direction,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct SwitchAssetRequest {
    pub symbol: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] DriverError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DriverError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            DriverError::Session(SessionError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            DriverError::Session(SessionError::UnknownAsset(_)) => StatusCode::NOT_FOUND,
            DriverError::Session(SessionError::Stopped) => StatusCode::CONFLICT,
            DriverError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

async fn snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.snapshot())
}

async fn assets(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.assets())
}

async fn submit_wager(
    State(state): State<AppState>,
    Json(request): Json<SubmitWagerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wager = state
        .session()
        .submit_wager(request.direction, request.amount)
        .await?;
    let location = format!("/wagers/{}", wager.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(wager),
    ))
}

async fn switch_asset(
    State(state): State<AppState>,
    Json(request): Json<SwitchAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = state.session().switch_asset(request.symbol).await?;
    Ok(Json(quote))
}

//! Dashboard widget endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{success, ApiResult};
use crate::auth::Session;
use crate::integrations::{TranslateRequest, Translation};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyQuery {
    /// ISO 4217 base currency (default: USD).
    #[serde(default = "default_base")]
    pub base: String,
}

fn default_base() -> String {
    "USD".to_string()
}

/// GET /api/integrations/weather?lat=&lon= - Daily forecast.
pub async fn weather(
    State(state): State<AppState>,
    _session: Session,
    Query(params): Query<WeatherQuery>,
) -> ApiResult<Value> {
    success(state.integrations.weather(params.lat, params.lon).await?)
}

/// POST /api/integrations/translate - Translate a snippet of text.
pub async fn translate(
    State(state): State<AppState>,
    _session: Session,
    Json(request): Json<TranslateRequest>,
) -> ApiResult<Translation> {
    success(state.integrations.translate(&request).await?)
}

/// GET /api/integrations/flights/:flight - Live flight status.
pub async fn flight_status(
    State(state): State<AppState>,
    session: Session,
    Path(flight): Path<String>,
) -> ApiResult<Value> {
    tracing::debug!("User {} looked up flight {}", session.user_id, flight);
    success(state.integrations.flight(&flight).await?)
}

/// GET /api/integrations/currency?base= - Exchange rates.
pub async fn currency(
    State(state): State<AppState>,
    _session: Session,
    Query(params): Query<CurrencyQuery>,
) -> ApiResult<Value> {
    success(state.integrations.currency(&params.base).await?)
}

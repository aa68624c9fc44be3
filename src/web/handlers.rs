//! HTTP handlers for API endpoints.
//!
//! Mutation endpoints accept enum-valued fields as uppercase strings and
//! answer every failure with a structured `{kind, message}` envelope.

use crate::auth::ActorIdentity;
use crate::error::PinError;
use crate::gpio::board::PinCapabilities;
use crate::gpio::state::{PinMutation, PinState, SlewRate};
use crate::host;
use crate::web::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Error envelope returned by every failing endpoint.
pub struct ApiError(pub PinError);

impl From<PinError> for ApiError {
    fn from(err: PinError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PinError::UnknownPin(_) => StatusCode::NOT_FOUND,
            PinError::UnsupportedFunction(_)
            | PinError::NotInputMode(_)
            | PinError::InvalidEnumValue(_)
            | PinError::OutOfRange(_) => StatusCode::BAD_REQUEST,
            PinError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PinError::HardwareFault(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "kind": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// One pin with its static capabilities and live state.
#[derive(Debug, Serialize)]
pub struct PinReport {
    pub pin: u8,
    pub capabilities: PinCapabilities,
    pub state: PinState,
}

/// Successful mutation response carrying the resulting state.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub state: PinState,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn authorize(state: &SharedState, headers: &HeaderMap) -> Result<ActorIdentity, ApiError> {
    Ok(state.registry.authorize(bearer_token(headers))?)
}

async fn mutate(
    state: &SharedState,
    headers: &HeaderMap,
    pin: u8,
    mutation: PinMutation,
) -> Result<Json<MutationResponse>, ApiError> {
    let actor = authorize(state, headers)?;
    let new_state = state.store.apply(pin, mutation, &actor).await?;
    Ok(Json(MutationResponse {
        success: true,
        state: new_state,
    }))
}

/// List every managed pin with capabilities and state, in table order.
pub async fn list_pins(State(state): State<SharedState>) -> Result<Json<Vec<PinReport>>, ApiError> {
    let mut reports = Vec::new();
    for (pin, pin_state) in state.store.get_all().await {
        let capabilities = state.store.board().capabilities_of(pin)?.clone();
        reports.push(PinReport {
            pin,
            capabilities,
            state: pin_state,
        });
    }
    Ok(Json(reports))
}

/// Get one pin's capabilities and state.
pub async fn get_pin(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
) -> Result<Json<PinReport>, ApiError> {
    let capabilities = state.store.board().capabilities_of(pin)?.clone();
    let pin_state = state.store.get(pin).await?;
    Ok(Json(PinReport {
        pin,
        capabilities,
        state: pin_state,
    }))
}

/// The static capability table.
pub async fn board(State(state): State<SharedState>) -> Json<Vec<PinCapabilities>> {
    Json(state.store.board().entries().to_vec())
}

#[derive(Debug, Deserialize)]
pub struct LevelRequest {
    pub level: String,
}

/// Drive a GPIO pin high or low.
pub async fn set_level(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<LevelRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let level = body.level.parse()?;
    mutate(&state, &headers, pin, PinMutation::SetLevel(level)).await
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

/// Switch a pin between input and output.
pub async fn set_mode(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<ModeRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let mode = body.mode.parse()?;
    mutate(&state, &headers, pin, PinMutation::SetMode(mode)).await
}

#[derive(Debug, Deserialize)]
pub struct FunctionRequest {
    pub function: String,
}

/// Mux a pin to an electrical function.
pub async fn set_function(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<FunctionRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let function = body.function.parse()?;
    mutate(&state, &headers, pin, PinMutation::SetFunction(function)).await
}

#[derive(Debug, Deserialize)]
pub struct PwmRequest {
    pub frequency: Option<i64>,
    pub duty_cycle: Option<f64>,
}

/// Reconfigure an active PWM waveform.
pub async fn set_pwm(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<PwmRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let frequency_hz = body
        .frequency
        .map(|f| {
            u32::try_from(f).map_err(|_| PinError::out_of_range("PWM frequency is out of range"))
        })
        .transpose()?;
    let mutation = PinMutation::SetPwm {
        frequency_hz,
        duty_cycle: body.duty_cycle,
    };
    mutate(&state, &headers, pin, mutation).await
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub pull: String,
}

/// Configure the internal pull resistor; forces input mode.
pub async fn set_pull(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<PullRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let pull = body.pull.parse()?;
    mutate(&state, &headers, pin, PinMutation::SetPull(pull)).await
}

#[derive(Debug, Deserialize)]
pub struct EdgeRequest {
    pub edge: String,
}

/// Arm or disarm edge detection on an input pin.
pub async fn set_edge(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<EdgeRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let edge = body.edge.parse()?;
    mutate(&state, &headers, pin, PinMutation::SetEdge(edge)).await
}

#[derive(Debug, Deserialize)]
pub struct AdvancedRequest {
    pub drive_strength_ma: Option<u8>,
    pub slew_rate: Option<String>,
    pub hysteresis: Option<bool>,
}

/// Tune the pad's electrical output stage.
pub async fn set_advanced(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<AdvancedRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let slew_rate = body
        .slew_rate
        .as_deref()
        .map(str::parse::<SlewRate>)
        .transpose()?;
    let mutation = PinMutation::SetAdvanced {
        drive_strength_ma: body.drive_strength_ma,
        slew_rate,
        hysteresis: body.hysteresis,
    };
    mutate(&state, &headers, pin, mutation).await
}

#[derive(Debug, Deserialize)]
pub struct MetadataRequest {
    pub label: Option<String>,
    pub description: Option<String>,
}

/// Attach a label and description to a pin.
pub async fn set_metadata(
    State(state): State<SharedState>,
    Path(pin): Path<u8>,
    headers: HeaderMap,
    Json(body): Json<MetadataRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let mutation = PinMutation::SetMetadata {
        label: body.label,
        description: body.description,
    };
    mutate(&state, &headers, pin, mutation).await
}

/// Opaque host telemetry map.
pub async fn host_telemetry() -> Json<std::collections::HashMap<String, String>> {
    Json(host::read_host_telemetry())
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// Recent audit records, newest first.
pub async fn audit_log(
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> Json<Vec<crate::gpio::audit::AuditRecord>> {
    Json(state.audit.recent(query.limit.unwrap_or(50)))
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "pin_pilot",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

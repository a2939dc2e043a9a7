use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use std::time::Instant;
use tracing::warn;

use crate::error::GatewayError;
use crate::generation::LanguageModel;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{GenerationRequest, GenerationResult, ModelInfo};
use crate::proxy::Upstream;
use crate::state::SharedState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, error: impl ToString) -> ErrorResponse {
    (status, Json(serde_json::json!({ "error": error.to_string() })))
}

impl From<GatewayError> for ErrorResponse {
    fn from(err: GatewayError) -> Self {
        let status = match err {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Generation(_) => StatusCode::BAD_GATEWAY,
        };
        error_response(status, err)
    }
}

/// Always generates with the model loaded at startup; pick another model by
/// restarting with `--model`.
pub async fn generate_handler<M: LanguageModel, U: Upstream>(
    State(state): State<SharedState<M, U>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>, ErrorResponse> {
    REQUEST_TOTAL.inc();

    let Json(request) = payload.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;

    let start_time = Instant::now();
    let result = state.generation.generate(&request).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    result.map(Json).map_err(|e| {
        warn!(error = %e, "generation request failed");
        e.into()
    })
}

pub async fn model_info_handler<M: LanguageModel, U: Upstream>(
    State(state): State<SharedState<M, U>>,
) -> Json<ModelInfo> {
    Json(state.generation.model_info())
}

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{FieldDescriptor, LoanField, RawFieldSet};
use super::orchestrator::{ErrorKind, PredictionOrchestrator, RequestState, SubmitOutcome};
use super::transport::PredictionTransport;

/// HTTP adapter so a browser front-end can drive the orchestrator.
pub fn prediction_router<T>(orchestrator: Arc<PredictionOrchestrator<T>>) -> Router
where
    T: PredictionTransport + 'static,
{
    Router::new()
        .route("/api/v1/predictions", post(submit_handler::<T>))
        .route("/api/v1/predictions/state", get(state_handler::<T>))
        .route("/api/v1/predictions/reset", post(reset_handler::<T>))
        .route("/api/v1/predictions/resubmit", post(resubmit_handler::<T>))
        .route("/api/v1/predictions/fields", get(fields_handler))
        .with_state(orchestrator)
}

pub(crate) async fn submit_handler<T>(
    State(orchestrator): State<Arc<PredictionOrchestrator<T>>>,
    Json(fields): Json<RawFieldSet>,
) -> Response
where
    T: PredictionTransport + 'static,
{
    outcome_response(orchestrator.submit(fields).await)
}

pub(crate) async fn resubmit_handler<T>(
    State(orchestrator): State<Arc<PredictionOrchestrator<T>>>,
) -> Response
where
    T: PredictionTransport + 'static,
{
    match orchestrator.resubmit().await {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn state_handler<T>(
    State(orchestrator): State<Arc<PredictionOrchestrator<T>>>,
) -> Json<RequestState>
where
    T: PredictionTransport + 'static,
{
    Json(orchestrator.state())
}

pub(crate) async fn reset_handler<T>(
    State(orchestrator): State<Arc<PredictionOrchestrator<T>>>,
) -> Json<RequestState>
where
    T: PredictionTransport + 'static,
{
    orchestrator.reset();
    Json(orchestrator.state())
}

pub(crate) async fn fields_handler() -> Json<Vec<FieldDescriptor>> {
    Json(
        LoanField::ordered()
            .into_iter()
            .map(LoanField::descriptor)
            .collect(),
    )
}

pub(crate) fn outcome_response(outcome: SubmitOutcome) -> Response {
    match outcome {
        SubmitOutcome::Settled(state) => {
            let status = match &state {
                RequestState::Failed { failure } => match failure.kind {
                    ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::Network | ErrorKind::Server | ErrorKind::Parse => {
                        StatusCode::BAD_GATEWAY
                    }
                },
                _ => StatusCode::OK,
            };
            (status, Json(state)).into_response()
        }
        SubmitOutcome::Superseded { request_id } => {
            let payload = json!({
                "error": "request superseded by a newer submission",
                "request_id": request_id,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
    }
}

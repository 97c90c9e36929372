use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use fieldwise_agent::{AdvisorRuntime, ChatTurnRequest, ChatTurnResponse};
use fieldwise_core::errors::InterfaceError;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    advisor: Arc<AdvisorRuntime>,
}

pub fn router(advisor: Arc<AdvisorRuntime>) -> Router {
    Router::new().route("/api/chat", post(chat)).with_state(ChatState { advisor })
}

async fn chat(
    State(state): State<ChatState>,
    payload: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    let Json(turn) = payload.map_err(rejection_error)?;
    Ok(Json(state.advisor.handle_turn(&turn).await))
}

fn rejection_error(rejection: JsonRejection) -> ApiError {
    let correlation_id = Uuid::new_v4().to_string();
    warn!(
        event_name = "advisor.request.rejected",
        correlation_id = %correlation_id,
        error = %rejection.body_text(),
        "chat request rejected"
    );

    // Every rejection, an oversized body included, is the client's fault.
    ApiError(InterfaceError::bad_request(rejection.body_text(), correlation_id))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    correlation_id: &'a str,
}

pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body =
            ErrorBody { error: self.0.user_message(), correlation_id: self.0.correlation_id() };
        (status, Json(body)).into_response()
    }
}

use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use marquee_service::{ChatResponse, Error, Message};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/conversations", post(create_conversation))
		.route("/v1/conversations/{thread_id}", get(history))
		.route("/v1/conversations/{thread_id}/messages", post(chat))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
	pub input: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationCreated {
	pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
	pub thread_id: String,
	pub messages: Vec<Message>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_conversation(
	State(state): State<AppState>,
) -> (StatusCode, Json<ConversationCreated>) {
	let thread_id = state.service.start_conversation();

	(StatusCode::CREATED, Json(ConversationCreated { thread_id }))
}

async fn chat(
	State(state): State<AppState>,
	Path(thread_id): Path<String>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat(&thread_id, &payload.input).await?;

	Ok(Json(response))
}

async fn history(
	State(state): State<AppState>,
	Path(thread_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
	let messages = state.service.history(&thread_id).await?;

	Ok(Json(HistoryResponse { thread_id, messages }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "not_found", message),
			Error::Provider { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "provider_error", message),
			Error::Timeout { .. } => Self::new(StatusCode::GATEWAY_TIMEOUT, "timeout", message),
			Error::IterationLimit { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "iteration_limit", message),
			Error::Storage { .. } | Error::Qdrant { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message),
			Error::DuplicateTool { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(
				error_code = self.error_code,
				message = %self.message,
				"Request failed."
			);
		}

		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

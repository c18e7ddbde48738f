use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};

use drip_service::{Error, FeedbackRequest, FeedbackResponse, RetrievalRequest, RetrievalResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/healthz", get(healthz))
		.route("/rag", post(rag))
		.route("/feedback", post(feedback))
		.with_state(state)
}

async fn healthz() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

async fn rag(
	State(state): State<AppState>,
	payload: Result<Json<RetrievalRequest>, JsonRejection>,
) -> Result<Json<RetrievalResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.rag(payload).await?;

	Ok(Json(response))
}

async fn feedback(
	State(state): State<AppState>,
	payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
	let Json(payload) = payload?;
	let response = state.service.ingest_feedback(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidQuery { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_query", message, None),
			Error::UnauthorizedQuery { message } =>
				ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized_query", message, None),
			Error::Validation { field, message } => ApiError::new(
				StatusCode::UNPROCESSABLE_ENTITY,
				"validation_error",
				message,
				Some(vec![field]),
			),
			Error::RetrievalUnavailable { message, .. } => ApiError::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"retrieval_unavailable",
				message,
				None,
			),
			Error::IngestionUnavailable { message, .. } => ApiError::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"ingestion_unavailable",
				message,
				None,
			),
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", err.body_text(), None)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

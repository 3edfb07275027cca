use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use bandi_service::{Candidate, IngestOutcome, QueryRequest, QueryResponse, RecordView, ServiceError};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/bandi", get(list))
		.route("/bandi/{id}", get(detail))
		.route("/bandi/ingest", post(ingest))
		.route("/regioni", get(regions))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

/// Query parameters mirror the public catalogue API: `page`, `size`,
/// `status`, `search`, `regione`.
#[derive(Debug, Deserialize)]
struct ListParams {
	page: Option<u32>,
	size: Option<u32>,
	status: Option<String>,
	search: Option<String>,
	regione: Option<String>,
}

async fn list(
	State(state): State<AppState>,
	Query(params): Query<ListParams>,
) -> Result<Json<QueryResponse>, ApiError> {
	let request = QueryRequest {
		page: params.page.unwrap_or(1),
		page_size: params.size,
		status: params.status,
		search: params.search,
		region: params.regione,
	};
	let response = state.service.query(request).await?;

	Ok(Json(response))
}

async fn detail(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<Json<RecordView>, ApiError> {
	let record = state.service.get(id).await?;

	Ok(Json(record))
}

async fn ingest(
	State(state): State<AppState>,
	Json(candidate): Json<Candidate>,
) -> Result<Json<IngestOutcome>, ApiError> {
	let outcome = state.service.ingest(candidate).await?;

	Ok(Json(outcome))
}

async fn regions(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
	let regions = state.service.regions().await?;

	Ok(Json(regions))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(error_code = %self.error_code, message = %self.message, "Request failed.");
		}

		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

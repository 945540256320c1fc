use std::sync::Arc;

use aide::{
	axum::{routing::get, ApiRouter},
	openapi::OpenApi,
};
use axum::{
	response::{IntoResponse, Response},
	Extension,
};

use crate::AppState;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().route("/api.json", get(serve_docs))
}

/// Serves the generated OpenAPI document.
async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> Response {
	axum::Json(api.as_ref()).into_response()
}

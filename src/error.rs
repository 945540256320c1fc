use std::borrow::Cow;

use axum::{
	body::Body,
	extract::rejection::{PathRejection, QueryRejection},
	http::{Response, StatusCode},
	response::IntoResponse,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::store::StoreError;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single client-facing error message.
///
/// `content` is a stable, machine-readable code such as `unknown_user`.
/// Nothing in here should ever contain internal details.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	pub content: Cow<'static, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub errors: Vec<Message>,
}

/// Describes how a route-specific error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn into_errors(self) -> Vec<Message>;
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error")]
	Json(JsonSchemaRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("password hashing error: {0}")]
	Argon(#[from] argon2::Error),
	#[error("rate limited")]
	RateLimit(GovernorError),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl From<GovernorError> for AppError {
	fn from(error: GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

fn respond(status: StatusCode, errors: Vec<Message>) -> Response<Body> {
	(status, axum::Json(ErrorResponse { errors })).into_response()
}

fn internal() -> Response<Body> {
	respond(
		StatusCode::INTERNAL_SERVER_ERROR,
		Message::new("internal_server_error").into_vec(),
	)
}

/// Renders body rejections in the same shape as every other error.
fn json_rejection(rejection: JsonSchemaRejection) -> Response<Body> {
	match rejection {
		JsonSchemaRejection::Json(rejection) => respond(
			rejection.status(),
			Message::new("invalid_body")
				.detail("reason", rejection.body_text())
				.into_vec(),
		),
		JsonSchemaRejection::Serde(error) => {
			let message = Message::new("invalid_body").detail("reason", error.inner().to_string());
			let path = error.path().to_string();

			match path.as_str() {
				"" | "." => respond(StatusCode::BAD_REQUEST, message.into_vec()),
				_ => respond(StatusCode::BAD_REQUEST, message.field(path).into_vec()),
			}
		}
		JsonSchemaRejection::Schema(errors) => respond(
			StatusCode::BAD_REQUEST,
			Message::new("invalid_body")
				.detail("schema", serde_json::to_value(errors).unwrap_or_default())
				.into_vec(),
		),
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => respond(
				StatusCode::BAD_REQUEST,
				errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							Message::new(error.code.clone()).field(field.to_string())
						})
					})
					.collect(),
			),
			Self::Json(rejection) => json_rejection(rejection),
			Self::Query(rejection) => respond(
				StatusCode::BAD_REQUEST,
				Message::new("invalid_query")
					.detail("reason", rejection.body_text())
					.into_vec(),
			),
			Self::Path(rejection) => respond(
				StatusCode::BAD_REQUEST,
				Message::new("invalid_path")
					.detail("reason", rejection.body_text())
					.into_vec(),
			),
			Self::Store(StoreError::Duplicate(constraint)) => respond(
				StatusCode::BAD_REQUEST,
				Message::new("already_exists")
					.detail("constraint", constraint.as_str())
					.into_vec(),
			),
			Self::Store(StoreError::NotFound) => respond(
				StatusCode::NOT_FOUND,
				Message::new("not_found").into_vec(),
			),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => respond(
				StatusCode::TOO_MANY_REQUESTS,
				Message::new("too_many_requests")
					.detail("retry_after", wait_time)
					.into_vec(),
			),
			Self::RateLimit(GovernorError::Other { code, .. }) => {
				respond(code, Message::new("request_rejected").into_vec())
			}
			error => {
				tracing::error!(%error, "internal error");
				internal()
			}
		}
	}
}

/// The error type returned by route handlers.
///
/// Either a route-specific error `E` or one of the shared [`AppError`]s.
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<StoreError> for RouteError<E> {
	fn from(error: StoreError) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<argon2::Error> for RouteError<E> {
	fn from(error: argon2::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route error");
				}

				respond(status, error.into_errors())
			}
		}
	}
}

impl<E> aide::OperationOutput for RouteError<E> {
	type Inner = ErrorResponse;
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_message_builder() {
		let message = Message::new("unknown_user")
			.field("id")
			.detail("user", "abc");

		let value = serde_json::to_value(&message).unwrap();

		assert_eq!(value["content"], "unknown_user");
		assert_eq!(value["field"], "id");
		assert_eq!(value["details"]["user"], "abc");
	}

	#[test]
	fn test_message_skips_empty_fields() {
		let value = serde_json::to_value(Message::new("nope")).unwrap();

		assert!(value.get("field").is_none());
		assert!(value.get("details").is_none());
	}
}

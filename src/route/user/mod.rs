use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(Uuid),
	#[error("not allowed to modify this user")]
	Forbidden,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/users", get_with(list_users, list_users_docs))
		.api_route(
			"/users/:id",
			get_with(get_user, get_user_docs)
				.put_with(update_user, update_user_docs)
				.delete_with(delete_user, delete_user_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::EmailTaken => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		match self {
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.detail("user", user.to_string())
				.into_vec(),
			Self::Forbidden => error::Message::new("forbidden").into_vec(),
			Self::EmailTaken => error::Message::new("email_taken").field("email").into_vec(),
		}
	}
}

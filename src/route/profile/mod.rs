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
	#[error("no profile for user {0}")]
	UnknownProfile(Uuid),
	#[error("no preferences for user {0}")]
	UnknownPreferences(Uuid),
	#[error("not allowed to modify this user")]
	Forbidden,
	#[error("min age is greater than max age")]
	InvalidAgeRange,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/users/:id/profile",
			get_with(get_profile, get_profile_docs).put_with(update_profile, update_profile_docs),
		)
		.api_route(
			"/users/:id/preferences",
			get_with(get_preferences, get_preferences_docs)
				.put_with(update_preferences, update_preferences_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) | Self::UnknownProfile(..) | Self::UnknownPreferences(..) => {
				StatusCode::NOT_FOUND
			}
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::InvalidAgeRange => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		match self {
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.detail("user", user.to_string())
				.into_vec(),
			Self::UnknownProfile(user) => error::Message::new("unknown_profile")
				.detail("user", user.to_string())
				.into_vec(),
			Self::UnknownPreferences(user) => error::Message::new("unknown_preferences")
				.detail("user", user.to_string())
				.into_vec(),
			Self::Forbidden => error::Message::new("forbidden").into_vec(),
			Self::InvalidAgeRange => error::Message::new("invalid_age_range")
				.field("maxAge")
				.into_vec(),
		}
	}
}

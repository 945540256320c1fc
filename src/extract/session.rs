use std::str::FromStr;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::RouteError,
	model,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_SESSION},
	route::auth,
	session,
	store::SessionRepository,
	Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Extracts the session and related user from the request.
///
/// The session id is read from the `Authorization: Bearer` header if present,
/// otherwise from the session cookie.
///
/// If neither exists, a [`auth::Error::NoSession`] is returned.
/// If the session is unknown or malformed, a [`auth::Error::InvalidSession`] is returned.
/// If the account has been deactivated, a [`auth::Error::AccountDisabled`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: model::User,
}

fn bearer_token(parts: &request::Parts) -> Option<Result<Uuid, auth::Error>> {
	let value = parts.headers.get(header::AUTHORIZATION)?;

	Some(
		value
			.to_str()
			.ok()
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.and_then(|token| Uuid::from_str(token.trim()).ok())
			.ok_or(auth::Error::InvalidSession),
	)
}

fn session_cookie(parts: &request::Parts) -> Result<Uuid, auth::Error> {
	let cookies = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok());

	let session_id = cookies
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.ok_or(auth::Error::NoSession)?;

	Uuid::parse_str(session_id.value()).map_err(|_| auth::Error::InvalidSession)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session_id = match bearer_token(parts) {
			Some(token) => token?,
			None => session_cookie(parts)?,
		};

		let database = Database::from_ref(state);
		let user = database
			.find_session_user(session_id)
			.await?
			.ok_or(auth::Error::InvalidSession)?;

		if !user.is_active {
			return Err(auth::Error::AccountDisabled.into());
		}

		Ok(Session {
			id: session_id,
			user,
		})
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}

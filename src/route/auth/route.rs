use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	model::NewUser,
	openapi::tag,
	session,
	store::{Constraint, SessionRepository, StoreError, UserRepository},
	AppState, Database,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Log in
/// Verifies the credentials and opens a new session, returned both in the body and as a cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::AuthResponse>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let Some(user) = state.database.find_user_by_email(&auth.email).await? else {
		return Err(Error::InvalidEmailOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &auth.password, &user.id)?;

	if user.password != hashed {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	if !user.is_active {
		return Err(Error::AccountDisabled.into());
	}

	let session = state.database.create_session(user.id).await?;
	let cookie = session::create_cookie(session.id);

	tracing::info!(user = %user.id, "logged in");

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Json(model::AuthResponse { user, session }),
	)
		.into_response())
}

/// Log out
/// Ends the current session and clears the session cookie.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(database): State<Database>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	database.delete_session(session.id).await?;

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	)
		.into_response())
}

/// Register account
/// Creates a new account and opens a session for it, returned both in the body and as a cookie.
#[route(tag = tag::AUTH, response(status = 201, description = "Registered successfully.", shape = "Json<model::AuthResponse>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &user_id)?;

	let (user, session) = state
		.database
		.create_user_with_session(NewUser {
			id: user_id,
			email: auth.email,
			password: hashed.to_vec(),
			name: auth.name,
		})
		.await
		.map_err(|e| match e {
			StoreError::Duplicate(Constraint::Email) => RouteError::from(Error::EmailTaken),
			e => RouteError::from(e),
		})?;

	let cookie = session::create_cookie(session.id);

	tracing::info!(user = %user.id, "registered");

	Ok((
		StatusCode::CREATED,
		[(header::SET_COOKIE, cookie.to_string())],
		Json(model::AuthResponse { user, session }),
	)
		.into_response())
}

/// Get current user
/// Returns the user that owns the current session.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

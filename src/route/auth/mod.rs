use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("no session cookie or bearer token")]
	NoSession,
	#[error("invalid session")]
	InvalidSession,
	#[error("account disabled")]
	AccountDisabled,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword | Self::NoSession | Self::InvalidSession => {
				StatusCode::UNAUTHORIZED
			}
			Self::AccountDisabled => StatusCode::FORBIDDEN,
			Self::EmailTaken => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		let code = match self {
			Self::InvalidEmailOrPassword => "invalid_email_or_password",
			Self::NoSession => "no_session",
			Self::InvalidSession => "invalid_session",
			Self::AccountDisabled => "account_disabled",
			Self::EmailTaken => "email_taken",
		};

		let message = error::Message::new(code);

		match self {
			Self::EmailTaken => message.field("email").into_vec(),
			_ => message.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"name": "John",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 201);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let session = session_id(&response.json::<Value>());
		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, bearer(&session))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["name"], "John");
	}

	#[tokio::test]
	async fn test_register_returns_defaults() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "A@X.com",
				"password": "secret1",
				"name": "A",
			}))
			.await;

		assert_eq!(response.status_code(), 201);

		let body = response.json::<Value>();
		let user = &body["user"];

		assert!(user["id"].as_str().is_some());
		assert_eq!(user["email"], "a@x.com");
		assert_eq!(user["role"], "user");
		assert_eq!(user["isVerified"], false);
		assert_eq!(user["isActive"], true);
		assert!(user.get("password").is_none());
		assert!(body["session"]["sessionId"].as_str().is_some());
	}

	#[tokio::test]
	async fn test_register_blank_name_fails() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "a@x.com",
				"password": "secret1",
				"name": "   ",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_register_duplicate_email_is_case_insensitive() {
		let (app, _) = app();

		register(&app, "ada@x.com", "Ada").await;

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "ADA@x.com",
				"password": "secret1",
				"name": "Ada",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"email_taken"
		);
	}

	#[tokio::test]
	async fn test_register_short_password_fails() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "ada@x.com",
				"password": "short",
				"name": "Ada",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_register_invalid_email_fails() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "not-an-email",
				"password": "secret1",
				"name": "Ada",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_register_email_needs_dotted_domain() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "ada@localhost",
				"password": "secret1",
				"name": "Ada",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "email");
	}

	#[tokio::test]
	async fn test_malformed_body_uses_error_shape() {
		let (app, _) = app();

		let response = app
			.post("/auth/register")
			.bytes("{\"email\":".into())
			.content_type("application/json")
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"invalid_body"
		);

		let response = app
			.post("/auth/register")
			.json(&json!({ "email": "ada@x.com" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"invalid_body"
		);
	}

	#[tokio::test]
	async fn test_wrong_content_type_keeps_status() {
		let (app, _) = app();

		let response = app.post("/auth/register").text("hello").await;

		assert_eq!(response.status_code(), 415);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"invalid_body"
		);
	}

	#[tokio::test]
	async fn test_login_rejects_bad_credentials() {
		let (app, _) = app();

		register(&app, "ada@x.com", "Ada").await;

		let wrong_password = app
			.post("/auth/login")
			.json(&json!({ "email": "ada@x.com", "password": "wrong-password" }))
			.await;

		let unknown_email = app
			.post("/auth/login")
			.json(&json!({ "email": "nobody@x.com", "password": "wrong-password" }))
			.await;

		assert_eq!(wrong_password.status_code(), 401);
		assert_eq!(unknown_email.status_code(), 401);
		assert_eq!(
			wrong_password.json::<Value>(),
			unknown_email.json::<Value>()
		);
	}

	#[tokio::test]
	async fn test_logout_invalidates_session() {
		let (app, _) = app();
		let (_, session) = register(&app, "ada@x.com", "Ada").await;

		let response = app
			.get("/auth/logout")
			.add_header(AUTHORIZATION, bearer(&session))
			.await;

		assert_eq!(response.status_code(), 204);

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, bearer(&session))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_me_requires_session() {
		let (app, _) = app();

		let response = app.get("/auth/me").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "no_session");
	}
}

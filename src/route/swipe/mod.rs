use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(Uuid),
	#[error("cannot swipe on yourself")]
	SelfSwipe,
	#[error("already swiped on user {0}")]
	AlreadySwiped(Uuid),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/swipes", post_with(create_swipe, create_swipe_docs))
		.api_route("/matches", get_with(get_matches, get_matches_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::SelfSwipe | Self::AlreadySwiped(..) => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		match self {
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.field("swipedId")
				.detail("user", user.to_string())
				.into_vec(),
			Self::SelfSwipe => error::Message::new("self_swipe")
				.field("swipedId")
				.into_vec(),
			Self::AlreadySwiped(user) => error::Message::new("already_swiped")
				.field("swipedId")
				.detail("user", user.to_string())
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn swipe(app: &TestServer, session: &str, swiped: &Value, action: &str) -> TestResponse {
		app.post("/swipes")
			.add_header(AUTHORIZATION, bearer(session))
			.json(&json!({ "swipedId": id(swiped), "action": action }))
			.await
	}

	#[tokio::test]
	async fn test_one_sided_like_has_no_match() {
		let (app, _) = app();
		let (_, ada) = register(&app, "ada@x.com", "Ada").await;
		let (bob, _) = register(&app, "bob@x.com", "Bob").await;

		let response = swipe(&app, &ada, &bob, "like").await;

		assert_eq!(response.status_code(), 201);

		let body = response.json::<Value>();

		assert_eq!(body["swipe"]["action"], "like");
		assert_eq!(body["swipe"]["swipedId"], bob["id"]);
		assert_eq!(body["match"], Value::Null);
	}

	#[tokio::test]
	async fn test_mutual_like_creates_match() {
		let (app, _) = app();
		let (ada, ada_session) = register(&app, "ada@x.com", "Ada").await;
		let (bob, bob_session) = register(&app, "bob@x.com", "Bob").await;

		swipe(&app, &ada_session, &bob, "like").await;

		let response = swipe(&app, &bob_session, &ada, "like").await;

		assert_eq!(response.status_code(), 201);

		let matched = &response.json::<Value>()["match"];
		let users = matched["users"].as_array().unwrap();

		assert_eq!(users.len(), 2);
		assert!(users.contains(&ada["id"]));
		assert!(users.contains(&bob["id"]));

		for session in [&ada_session, &bob_session] {
			let matches = app
				.get("/matches")
				.add_header(AUTHORIZATION, bearer(session))
				.await
				.json::<Vec<Value>>();

			assert_eq!(matches.len(), 1);
			assert_eq!(matches[0]["id"], matched["id"]);
		}
	}

	#[tokio::test]
	async fn test_pass_does_not_match() {
		let (app, _) = app();
		let (ada, ada_session) = register(&app, "ada@x.com", "Ada").await;
		let (bob, bob_session) = register(&app, "bob@x.com", "Bob").await;

		swipe(&app, &ada_session, &bob, "pass").await;

		let response = swipe(&app, &bob_session, &ada, "like").await;

		assert_eq!(response.json::<Value>()["match"], Value::Null);
	}

	#[tokio::test]
	async fn test_duplicate_swipe_is_rejected() {
		let (app, _) = app();
		let (_, ada) = register(&app, "ada@x.com", "Ada").await;
		let (bob, _) = register(&app, "bob@x.com", "Bob").await;

		assert_eq!(swipe(&app, &ada, &bob, "like").await.status_code(), 201);

		let response = swipe(&app, &ada, &bob, "pass").await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"already_swiped"
		);
	}

	#[tokio::test]
	async fn test_self_swipe_is_rejected() {
		let (app, _) = app();
		let (ada, session) = register(&app, "ada@x.com", "Ada").await;

		let response = swipe(&app, &session, &ada, "like").await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"self_swipe"
		);
	}

	#[tokio::test]
	async fn test_swipe_on_unknown_user() {
		let (app, _) = app();
		let (_, session) = register(&app, "ada@x.com", "Ada").await;
		let ghost = json!({ "id": uuid::Uuid::new_v4() });

		let response = swipe(&app, &session, &ghost, "like").await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_invalid_action_is_rejected() {
		let (app, _) = app();
		let (_, session) = register(&app, "ada@x.com", "Ada").await;
		let (bob, _) = register(&app, "bob@x.com", "Bob").await;

		let response = swipe(&app, &session, &bob, "superlike").await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();

		assert_eq!(body["errors"][0]["content"], "invalid_body");
		assert!(body.get("error").is_none());
	}

	#[tokio::test]
	async fn test_matches_require_session() {
		let (app, _) = app();

		assert_eq!(app.get("/matches").await.status_code(), 401);
	}
}

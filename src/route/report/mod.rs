use aide::axum::{
	routing::{get_with, put_with},
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
	#[error("unknown report {0}")]
	UnknownReport(Uuid),
	#[error("cannot report yourself")]
	SelfReport,
	#[error("already reported user {0}")]
	AlreadyReported(Uuid),
	#[error("admin access required")]
	Forbidden,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/reports",
			get_with(get_reports, get_reports_docs).post_with(create_report, create_report_docs),
		)
		.api_route(
			"/reports/:id/status",
			put_with(update_report_status, update_report_status_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) | Self::UnknownReport(..) => StatusCode::NOT_FOUND,
			Self::SelfReport | Self::AlreadyReported(..) => StatusCode::BAD_REQUEST,
			Self::Forbidden => StatusCode::FORBIDDEN,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		match self {
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.field("reportedId")
				.detail("user", user.to_string())
				.into_vec(),
			Self::UnknownReport(report) => error::Message::new("unknown_report")
				.detail("report", report.to_string())
				.into_vec(),
			Self::SelfReport => error::Message::new("self_report")
				.field("reportedId")
				.into_vec(),
			Self::AlreadyReported(user) => error::Message::new("already_reported")
				.field("reportedId")
				.detail("user", user.to_string())
				.into_vec(),
			Self::Forbidden => error::Message::new("forbidden").into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn report(app: &TestServer, session: &str, reported: &Value) -> TestResponse {
		app.post("/reports")
			.add_header(AUTHORIZATION, bearer(session))
			.json(&json!({ "reportedId": id(reported), "reason": "spam" }))
			.await
	}

	#[tokio::test]
	async fn test_report_lifecycle() {
		let (app, store) = app();
		let (_, ada) = register(&app, "ada@x.com", "Ada").await;
		let (bob, _) = register(&app, "bob@x.com", "Bob").await;
		let (_, root) = admin(&app, &store, "root@x.com").await;

		let response = report(&app, &ada, &bob).await;

		assert_eq!(response.status_code(), 201);

		let created = response.json::<Value>();

		assert_eq!(created["status"], "pending");
		assert_eq!(created["reportedId"], bob["id"]);

		let response = app
			.put(&format!("/reports/{}/status", id(&created)))
			.add_header(AUTHORIZATION, bearer(&root))
			.json(&json!({ "status": "resolved" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["status"], "resolved");

		let pending = app
			.get("/reports")
			.add_query_param("status", "pending")
			.add_header(AUTHORIZATION, bearer(&root))
			.await
			.json::<Vec<Value>>();

		assert!(pending.is_empty());

		let all = app
			.get("/reports")
			.add_header(AUTHORIZATION, bearer(&root))
			.await
			.json::<Vec<Value>>();

		assert_eq!(all.len(), 1);
	}

	#[tokio::test]
	async fn test_duplicate_report_is_rejected() {
		let (app, _) = app();
		let (_, ada) = register(&app, "ada@x.com", "Ada").await;
		let (bob, _) = register(&app, "bob@x.com", "Bob").await;

		assert_eq!(report(&app, &ada, &bob).await.status_code(), 201);

		let response = report(&app, &ada, &bob).await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"already_reported"
		);
	}

	#[tokio::test]
	async fn test_self_and_unknown_reports() {
		let (app, _) = app();
		let (ada, session) = register(&app, "ada@x.com", "Ada").await;

		assert_eq!(report(&app, &session, &ada).await.status_code(), 400);

		let ghost = json!({ "id": uuid::Uuid::new_v4() });

		assert_eq!(report(&app, &session, &ghost).await.status_code(), 404);
	}

	#[tokio::test]
	async fn test_empty_reason_is_rejected() {
		let (app, _) = app();
		let (_, session) = register(&app, "ada@x.com", "Ada").await;
		let (bob, _) = register(&app, "bob@x.com", "Bob").await;

		let response = app
			.post("/reports")
			.add_header(AUTHORIZATION, bearer(&session))
			.json(&json!({ "reportedId": id(&bob), "reason": "" }))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_moderation_needs_admin() {
		let (app, store) = app();
		let (_, session) = register(&app, "ada@x.com", "Ada").await;
		let (_, root) = admin(&app, &store, "root@x.com").await;

		let response = app
			.get("/reports")
			.add_header(AUTHORIZATION, bearer(&session))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.put(&format!("/reports/{}/status", uuid::Uuid::new_v4()))
			.add_header(AUTHORIZATION, bearer(&root))
			.json(&json!({ "status": "reviewed" }))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}

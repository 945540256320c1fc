use axum::{extract::State, http::StatusCode};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Path, Query, Session},
	model::{Report, ReportStatus},
	openapi::tag,
	route::IdInput,
	store::{Constraint, ReportRepository, StoreError, UserRepository},
	Database,
};

use super::{model, Error, RouteError};

/// Report a user
/// Files an abuse report against another user. Each user can report another user once.
#[route(tag = tag::REPORT, response(status = 201, description = "Report filed.", shape = "Json<model::Report>"))]
pub async fn create_report(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateReport>,
) -> Result<(StatusCode, Json<model::Report>), RouteError> {
	let reported_id = input.reported_id;

	if reported_id == session.user.id {
		return Err(Error::SelfReport.into());
	}

	if database.find_user(reported_id).await?.is_none() {
		return Err(Error::UnknownUser(reported_id).into());
	}

	let now = chrono::Utc::now();
	let report = Report {
		id: Uuid::new_v4(),
		reporter_id: session.user.id,
		reported_id,
		reason: input.reason,
		status: ReportStatus::default(),
		created_at: now,
		updated_at: now,
	};

	let report = database.create_report(report).await.map_err(|e| match e {
		StoreError::Duplicate(Constraint::Report) => {
			RouteError::from(Error::AlreadyReported(reported_id))
		}
		StoreError::NotFound => RouteError::from(Error::UnknownUser(reported_id)),
		e => RouteError::from(e),
	})?;

	tracing::info!(report = %report.id, reported = %reported_id, "report filed");

	Ok((StatusCode::CREATED, Json(report)))
}

/// List reports
/// Returns all reports, newest first, optionally filtered by status. Admins only.
#[route(tag = tag::REPORT)]
pub async fn get_reports(
	State(database): State<Database>,
	session: Session,
	Query(filter): Query<model::ReportFilter>,
) -> Result<Json<Vec<model::Report>>, RouteError> {
	if !session.user.is_admin() {
		return Err(Error::Forbidden.into());
	}

	let reports = database.list_reports(filter.status).await?;

	Ok(Json(reports))
}

/// Update report status
/// Moves a report to a new review status. Admins only.
#[route(tag = tag::REPORT)]
pub async fn update_report_status(
	State(database): State<Database>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
	Json(input): Json<model::UpdateReportStatusInput>,
) -> Result<Json<model::Report>, RouteError> {
	if !session.user.is_admin() {
		return Err(Error::Forbidden.into());
	}

	let report = database
		.update_report_status(id, input.status)
		.await?
		.ok_or(Error::UnknownReport(id))?;

	tracing::info!(report = %id, status = report.status.as_str(), "report status changed");

	Ok(Json(report))
}

use axum::{extract::State, http::StatusCode};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	model::Swipe,
	openapi::tag,
	store::{Constraint, StoreError, SwipeRepository, UserRepository},
	Database,
};

use super::{model, Error, RouteError};

/// Swipe on a user
/// Likes or passes on another user. If they already liked you back, a match is created
/// and returned alongside the swipe.
#[route(tag = tag::SWIPE, response(status = 201, description = "Swipe recorded.", shape = "Json<model::SwipeResponse>"))]
pub async fn create_swipe(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateSwipe>,
) -> Result<(StatusCode, Json<model::SwipeResponse>), RouteError> {
	let swiped_id = input.swiped_id;

	if swiped_id == session.user.id {
		return Err(Error::SelfSwipe.into());
	}

	// deactivated accounts cannot be swiped on
	match database.find_user(swiped_id).await? {
		Some(user) if user.is_active => {}
		_ => return Err(Error::UnknownUser(swiped_id).into()),
	}

	let swipe = Swipe {
		id: Uuid::new_v4(),
		swiper_id: session.user.id,
		swiped_id,
		action: input.action,
		created_at: chrono::Utc::now(),
	};

	let outcome = database.record_swipe(swipe).await.map_err(|e| match e {
		StoreError::Duplicate(Constraint::Swipe) => {
			RouteError::from(Error::AlreadySwiped(swiped_id))
		}
		StoreError::NotFound => RouteError::from(Error::UnknownUser(swiped_id)),
		e => RouteError::from(e),
	})?;

	if let Some(matched) = &outcome.matched {
		tracing::info!(
			swiper = %session.user.id,
			swiped = %swiped_id,
			match_id = %matched.id,
			"users matched"
		);
	}

	Ok((
		StatusCode::CREATED,
		Json(model::SwipeResponse {
			swipe: outcome.swipe,
			matched: outcome.matched,
		}),
	))
}

/// Get own matches
/// Returns every match you are part of, newest first.
#[route(tag = tag::SWIPE)]
pub async fn get_matches(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Vec<model::Match>>, RouteError> {
	let matches = database.list_matches(session.user.id).await?;

	Ok(Json(matches))
}

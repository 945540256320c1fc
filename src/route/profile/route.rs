use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Path, Session},
	model::{Preferences, Profile},
	openapi::tag,
	route::IdInput,
	store::{ProfileRepository, StoreError},
	Database,
};

use super::{model, Error, RouteError};

fn saved<T>(result: Result<T, StoreError>, user_id: Uuid) -> Result<T, RouteError> {
	result.map_err(|e| match e {
		StoreError::NotFound => RouteError::from(Error::UnknownUser(user_id)),
		e => RouteError::from(e),
	})
}

/// Get profile
/// Returns the profile of a user.
#[route(tag = tag::PROFILE)]
pub async fn get_profile(
	State(database): State<Database>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::Profile>, RouteError> {
	let profile = database
		.find_profile(id)
		.await?
		.ok_or(Error::UnknownProfile(id))?;

	Ok(Json(profile))
}

/// Update profile
/// Creates the profile if it does not exist yet, then applies the provided fields.
#[route(tag = tag::PROFILE)]
pub async fn update_profile(
	State(database): State<Database>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
	Json(input): Json<model::UpdateProfileInput>,
) -> Result<Json<model::Profile>, RouteError> {
	if !session.user.can_manage(id) {
		return Err(Error::Forbidden.into());
	}

	let mut profile = database
		.find_profile(id)
		.await?
		.unwrap_or_else(|| Profile::empty(id));

	input.apply(&mut profile);

	let profile = saved(database.save_profile(profile).await, id)?;

	Ok(Json(profile))
}

/// Get preferences
/// Returns the matching preferences of a user.
#[route(tag = tag::PROFILE)]
pub async fn get_preferences(
	State(database): State<Database>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::Preferences>, RouteError> {
	let preferences = database
		.find_preferences(id)
		.await?
		.ok_or(Error::UnknownPreferences(id))?;

	Ok(Json(preferences))
}

/// Update preferences
/// Creates the preferences if they do not exist yet, then applies the provided fields.
/// The resulting minimum age may not exceed the maximum age.
#[route(tag = tag::PROFILE)]
pub async fn update_preferences(
	State(database): State<Database>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
	Json(input): Json<model::UpdatePreferencesInput>,
) -> Result<Json<model::Preferences>, RouteError> {
	if !session.user.can_manage(id) {
		return Err(Error::Forbidden.into());
	}

	let mut preferences = database
		.find_preferences(id)
		.await?
		.unwrap_or_else(|| Preferences::empty(id));

	input.apply(&mut preferences);

	if !model::valid_age_range(&preferences) {
		return Err(Error::InvalidAgeRange.into());
	}

	let preferences = saved(database.save_preferences(preferences).await, id)?;

	Ok(Json(preferences))
}

use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Query, Session},
	model::UserPatch,
	openapi::tag,
	route::{auth::route::hash_password, IdInput, Paginate},
	store::{Constraint, StoreError, UserRepository},
	AppState, Database,
};

use super::{model, Error, RouteError};

/// List users
/// Returns a paginated list of all users, oldest first.
#[route(tag = tag::USER)]
pub async fn list_users(
	State(database): State<Database>,
	Query(paginate): Query<Paginate>,
) -> Result<Json<Vec<model::User>>, RouteError> {
	let users = database
		.list_users(paginate.limit(), paginate.offset())
		.await?;

	Ok(Json(users))
}

/// Get single user
/// Returns a single user by their unique id.
#[route(tag = tag::USER)]
pub async fn get_user(
	State(database): State<Database>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::UserResponse>, RouteError> {
	let user = database.find_user(id).await?.ok_or(Error::UnknownUser(id))?;

	Ok(Json(model::UserResponse { user }))
}

/// Update user
/// Applies a partial update to a user. Users may update themselves, admins may update anyone.
#[route(tag = tag::USER)]
pub async fn update_user(
	State(state): State<AppState>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
	Json(input): Json<model::UpdateUserInput>,
) -> Result<Json<model::UserResponse>, RouteError> {
	if !session.user.can_manage(id) || (input.is_privileged() && !session.user.is_admin()) {
		return Err(Error::Forbidden.into());
	}

	let password = match &input.password {
		Some(password) => Some(hash_password(&state.hasher, password, &id)?.to_vec()),
		None => None,
	};

	let patch = UserPatch {
		email: input.email,
		password,
		name: input.name,
		profile_image: input.profile_image,
		role: input.role,
		is_verified: input.is_verified,
		is_active: input.is_active,
	};

	let user = state
		.database
		.update_user(id, patch)
		.await
		.map_err(|e| match e {
			StoreError::Duplicate(Constraint::Email) => RouteError::from(Error::EmailTaken),
			e => RouteError::from(e),
		})?
		.ok_or(Error::UnknownUser(id))?;

	tracing::info!(user = %id, by = %session.user.id, "updated user");

	Ok(Json(model::UserResponse { user }))
}

/// Delete user
/// Deletes a user along with their sessions, profile, swipes, matches and reports.
#[route(tag = tag::USER)]
pub async fn delete_user(
	State(database): State<Database>,
	session: Session,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::MessageResponse>, RouteError> {
	if !session.user.can_manage(id) {
		return Err(Error::Forbidden.into());
	}

	if !database.delete_user(id).await? {
		return Err(Error::UnknownUser(id).into());
	}

	tracing::info!(user = %id, by = %session.user.id, "deleted user");

	Ok(Json(model::MessageResponse {
		message: "User deleted successfully".into(),
	}))
}

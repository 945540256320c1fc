use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::model::{normalize, validate_email_domain};

pub use crate::model::{Session, User};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[serde(deserialize_with = "normalize::email")]
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	/// Compared case-insensitively; stored trimmed and lowercased.
	#[serde(deserialize_with = "normalize::email")]
	#[validate(email, custom(function = "validate_email_domain"))]
	pub email: String,
	#[validate(length(min = 6, max = 128))]
	pub password: String,
	/// The name that is displayed to other users.
	#[serde(deserialize_with = "normalize::trimmed")]
	#[validate(length(min = 1, max = 20))]
	pub name: String,
}

/// Returned after registering or logging in.
#[derive(Serialize, JsonSchema)]
pub struct AuthResponse {
	pub user: User,
	pub session: Session,
}

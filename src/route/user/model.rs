use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::model::{normalize, validate_email_domain};

pub use crate::model::{Role, User};

/// A partial update to a user. Omitted fields are left untouched.
///
/// `role`, `isVerified` and `isActive` may only be set by admins.
#[derive(Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
	#[serde(default, deserialize_with = "normalize::optional_email")]
	#[validate(email, custom(function = "validate_email_domain"))]
	pub email: Option<String>,
	#[validate(length(min = 6, max = 128))]
	pub password: Option<String>,
	#[serde(default, deserialize_with = "normalize::optional_trimmed")]
	#[validate(length(min = 1, max = 20))]
	pub name: Option<String>,
	#[validate(url)]
	pub profile_image: Option<String>,
	pub role: Option<Role>,
	pub is_verified: Option<bool>,
	pub is_active: Option<bool>,
}

impl UpdateUserInput {
	/// Whether the update touches fields reserved for admins.
	pub fn is_privileged(&self) -> bool {
		self.role.is_some() || self.is_verified.is_some() || self.is_active.is_some()
	}
}

#[derive(Serialize, JsonSchema)]
pub struct UserResponse {
	pub user: User,
}

#[derive(Serialize, JsonSchema)]
pub struct MessageResponse {
	pub message: String,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_privileged_fields() {
		let input = UpdateUserInput {
			name: Some("Ada".into()),
			..Default::default()
		};

		assert!(!input.is_privileged());

		let input = UpdateUserInput {
			is_active: Some(false),
			..Default::default()
		};

		assert!(input.is_privileged());
	}

	#[test]
	fn test_update_input_validates_present_fields_only() {
		let input: UpdateUserInput =
			serde_json::from_value(serde_json::json!({ "name": "  Ada " })).unwrap();

		assert_eq!(input.name.as_deref(), Some("Ada"));
		assert!(input.validate().is_ok());

		let input: UpdateUserInput =
			serde_json::from_value(serde_json::json!({ "profileImage": "not a url" })).unwrap();

		assert!(input.validate().is_err());
	}
}

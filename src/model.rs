use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PROFILE_IMAGE: &str = "https://via.placeholder.com/150";
pub const DEFAULT_MAX_DISTANCE: i32 = 50;
pub const MIN_AGE: i32 = 18;

/// The permission level of a user.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
	Admin,
	#[default]
	User,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::User => "user",
		}
	}
}

/// A single user account.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The user's email address, stored trimmed and lowercased.
	pub email: String,
	/// The argon2 hash of the password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The name that is displayed to other users.
	pub name: String,
	pub role: Role,
	pub profile_image: String,
	pub is_verified: bool,
	pub is_active: bool,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// Whether this user may modify the account with the given id.
	pub fn can_manage(&self, user_id: Uuid) -> bool {
		self.id == user_id || self.is_admin()
	}
}

/// The fields needed to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub password: Vec<u8>,
	pub name: String,
}

/// A validated, partial update to a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
	pub email: Option<String>,
	pub password: Option<Vec<u8>>,
	pub name: Option<String>,
	pub profile_image: Option<String>,
	pub role: Option<Role>,
	pub is_verified: Option<bool>,
	pub is_active: Option<bool>,
}

/// The public-facing profile of a user.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	pub user_id: Uuid,
	pub bio: String,
	pub skills: Vec<String>,
	pub languages: Vec<String>,
	pub github: String,
	pub photos: Vec<String>,
	pub location: String,
	pub age: Option<i32>,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Profile {
	pub fn empty(user_id: Uuid) -> Self {
		let now = chrono::Utc::now();

		Self {
			user_id,
			bio: String::new(),
			skills: Vec::new(),
			languages: Vec::new(),
			github: String::new(),
			photos: Vec::new(),
			location: String::new(),
			age: None,
			created_at: now,
			updated_at: now,
		}
	}
}

/// The matching filters of a user.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
	pub user_id: Uuid,
	pub preferred_languages: Vec<String>,
	pub preferred_skills: Vec<String>,
	pub max_distance: i32,
	pub min_age: Option<i32>,
	pub max_age: Option<i32>,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Preferences {
	pub fn empty(user_id: Uuid) -> Self {
		let now = chrono::Utc::now();

		Self {
			user_id,
			preferred_languages: Vec::new(),
			preferred_skills: Vec::new(),
			max_distance: DEFAULT_MAX_DISTANCE,
			min_age: None,
			max_age: None,
			created_at: now,
			updated_at: now,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "swipe_action", rename_all = "lowercase")]
pub enum SwipeAction {
	Like,
	Pass,
}

impl SwipeAction {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Like => "like",
			Self::Pass => "pass",
		}
	}
}

/// A like or pass from one user towards another.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user who swiped.
	#[serde(skip_deserializing)]
	pub swiper_id: Uuid,
	/// The user who was swiped on.
	pub swiped_id: Uuid,
	pub action: SwipeAction,
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Two users who liked each other.
///
/// `users` is always sorted, so a pair has exactly one representation.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Match {
	pub id: Uuid,
	pub users: [Uuid; 2],
	pub matched_at: chrono::DateTime<chrono::Utc>,
}

impl Match {
	pub fn new(a: Uuid, b: Uuid) -> Self {
		Self {
			id: Uuid::new_v4(),
			users: ordered_pair(a, b),
			matched_at: chrono::Utc::now(),
		}
	}

	pub fn includes(&self, user_id: Uuid) -> bool {
		self.users.contains(&user_id)
	}
}

/// Sorts a pair of user ids so that `(a, b)` and `(b, a)` map to the same key.
pub fn ordered_pair(a: Uuid, b: Uuid) -> [Uuid; 2] {
	if a <= b {
		[a, b]
	} else {
		[b, a]
	}
}

/// The moderation state of a report.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
pub enum ReportStatus {
	#[default]
	Pending,
	Reviewed,
	Resolved,
}

impl ReportStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Reviewed => "reviewed",
			Self::Resolved => "resolved",
		}
	}
}

/// An abuse report filed by one user against another.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
	#[serde(skip_deserializing)]
	pub id: Uuid,
	#[serde(skip_deserializing)]
	pub reporter_id: Uuid,
	pub reported_id: Uuid,
	/// Why the user is being reported.
	#[validate(length(min = 1, max = 500))]
	pub reason: String,
	#[serde(skip_deserializing)]
	pub status: ReportStatus,
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
	#[serde(skip_deserializing)]
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A login session.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	#[serde(rename = "sessionId")]
	pub id: Uuid,
	#[serde(skip)]
	pub user_id: Uuid,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_ordered_pair() {
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();

		assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
		assert!(ordered_pair(a, b)[0] <= ordered_pair(a, b)[1]);
	}

	#[test]
	fn test_match_includes_both_users() {
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();
		let m = Match::new(a, b);

		assert!(m.includes(a));
		assert!(m.includes(b));
		assert!(!m.includes(Uuid::new_v4()));
	}

	#[test]
	fn test_create_swipe_deserializes_camel_case() {
		let swiped = Uuid::new_v4();
		let input: CreateSwipe = serde_json::from_value(serde_json::json!({
			"swipedId": swiped,
			"action": "like",
		}))
		.unwrap();

		assert_eq!(input.swiped_id, swiped);
		assert_eq!(input.action, SwipeAction::Like);
	}

	#[test]
	fn test_create_report_validates_reason() {
		let input = CreateReport {
			reported_id: Uuid::new_v4(),
			reason: "x".repeat(501),
		};

		assert!(input.validate().is_err());

		let input = CreateReport {
			reported_id: Uuid::new_v4(),
			reason: "spam".into(),
		};

		assert!(input.validate().is_ok());
	}

	#[test]
	fn test_user_serialization_hides_password() {
		let now = chrono::Utc::now();
		let user = User {
			id: Uuid::new_v4(),
			email: "a@x.com".into(),
			password: vec![1, 2, 3],
			name: "A".into(),
			role: Role::User,
			profile_image: DEFAULT_PROFILE_IMAGE.into(),
			is_verified: false,
			is_active: true,
			created_at: now,
			updated_at: now,
		};

		let value = serde_json::to_value(&user).unwrap();

		assert!(value.get("password").is_none());
		assert_eq!(value["role"], "user");
		assert_eq!(value["isVerified"], false);
		assert_eq!(value["isActive"], true);
		assert_eq!(value["profileImage"], DEFAULT_PROFILE_IMAGE);
	}
}

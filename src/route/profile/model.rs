use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::route::model::normalize;

pub use crate::model::{Preferences, Profile};

/// A partial update to a profile. Omitted fields are left untouched.
#[derive(Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
	#[validate(length(max = 500))]
	pub bio: Option<String>,
	pub skills: Option<Vec<String>>,
	pub languages: Option<Vec<String>>,
	/// A GitHub username or profile URL.
	#[serde(default, deserialize_with = "normalize::optional_trimmed")]
	#[validate(length(max = 100))]
	pub github: Option<String>,
	pub photos: Option<Vec<String>>,
	#[serde(default, deserialize_with = "normalize::optional_trimmed")]
	#[validate(length(max = 100))]
	pub location: Option<String>,
	#[validate(range(min = 18, max = 150))]
	pub age: Option<i32>,
}

impl UpdateProfileInput {
	pub fn apply(self, profile: &mut Profile) {
		if let Some(bio) = self.bio {
			profile.bio = bio;
		}

		if let Some(skills) = self.skills {
			profile.skills = skills;
		}

		if let Some(languages) = self.languages {
			profile.languages = languages;
		}

		if let Some(github) = self.github {
			profile.github = github;
		}

		if let Some(photos) = self.photos {
			profile.photos = photos;
		}

		if let Some(location) = self.location {
			profile.location = location;
		}

		if self.age.is_some() {
			profile.age = self.age;
		}
	}
}

/// A partial update to matching preferences. Omitted fields are left untouched.
#[derive(Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesInput {
	pub preferred_languages: Option<Vec<String>>,
	pub preferred_skills: Option<Vec<String>>,
	/// In kilometres.
	#[validate(range(min = 0))]
	pub max_distance: Option<i32>,
	#[validate(range(min = 18, max = 150))]
	pub min_age: Option<i32>,
	#[validate(range(min = 18, max = 150))]
	pub max_age: Option<i32>,
}

impl UpdatePreferencesInput {
	pub fn apply(self, preferences: &mut Preferences) {
		if let Some(languages) = self.preferred_languages {
			preferences.preferred_languages = languages;
		}

		if let Some(skills) = self.preferred_skills {
			preferences.preferred_skills = skills;
		}

		if let Some(max_distance) = self.max_distance {
			preferences.max_distance = max_distance;
		}

		if self.min_age.is_some() {
			preferences.min_age = self.min_age;
		}

		if self.max_age.is_some() {
			preferences.max_age = self.max_age;
		}
	}
}

/// Whether the age bounds of the merged preferences are consistent.
pub fn valid_age_range(preferences: &Preferences) -> bool {
	match (preferences.min_age, preferences.max_age) {
		(Some(min), Some(max)) => min <= max,
		_ => true,
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use super::*;

	#[test]
	fn test_apply_keeps_omitted_fields() {
		let mut profile = Profile::empty(Uuid::new_v4());
		profile.bio = "hello".into();

		UpdateProfileInput {
			skills: Some(vec!["rust".into()]),
			..Default::default()
		}
		.apply(&mut profile);

		assert_eq!(profile.bio, "hello");
		assert_eq!(profile.skills, ["rust"]);
	}

	#[test]
	fn test_age_range_checked_after_merge() {
		let mut preferences = Preferences::empty(Uuid::new_v4());
		preferences.max_age = Some(30);

		UpdatePreferencesInput {
			min_age: Some(40),
			..Default::default()
		}
		.apply(&mut preferences);

		assert!(!valid_age_range(&preferences));

		preferences.max_age = None;

		assert!(valid_age_range(&preferences));
	}

	#[test]
	fn test_underage_is_rejected() {
		let input = UpdateProfileInput {
			age: Some(17),
			..Default::default()
		};

		assert!(input.validate().is_err());
	}
}

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MAX_PAGE: i64 = 10_000;
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Optional paging. Without `page` or `size`, every row is returned.
#[derive(Default, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 10_000))]
	pub page: Option<i64>,
	/// The number of items to return per page. Defaults to 100 when `page` is given.
	#[validate(range(min = 1, max = 100))]
	pub size: Option<i64>,
}

impl Paginate {
	/// `None` means no limit.
	pub fn limit(&self) -> Option<i64> {
		match (self.page, self.size) {
			(_, Some(size)) => Some(size),
			(Some(_), None) => Some(DEFAULT_PAGE_SIZE),
			(None, None) => None,
		}
	}

	pub fn offset(&self) -> i64 {
		let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);

		(page - 1).saturating_mul(self.limit().unwrap_or(0))
	}
}

/// Requires a dot in the domain part, which `#[validate(email)]` alone does not.
pub fn validate_email_domain(email: &str) -> Result<(), ValidationError> {
	let dotted = email
		.rsplit_once('@')
		.and_then(|(_, domain)| domain.rsplit_once('.'))
		.is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());

	if !dotted {
		return Err(ValidationError::new("email"));
	}

	Ok(())
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

/// Deserializers that canonicalize user input before it is validated.
pub mod normalize {
	use super::{Deserialize, Deserializer};

	/// Trims surrounding whitespace and lowercases, so emails compare case-insensitively.
	pub fn email<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
		String::deserialize(deserializer).map(|email| email.trim().to_lowercase())
	}

	pub fn optional_email<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<String>, D::Error> {
		Option::<String>::deserialize(deserializer)
			.map(|email| email.map(|email| email.trim().to_lowercase()))
	}

	pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
		String::deserialize(deserializer).map(|value| value.trim().to_string())
	}

	pub fn optional_trimmed<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<String>, D::Error> {
		Option::<String>::deserialize(deserializer)
			.map(|value| value.map(|value| value.trim().to_string()))
	}
}

#[cfg(test)]
mod test {
	use serde::Deserialize;
	use validator::Validate;

	use super::normalize;

	#[test]
	fn test_paginate_offset() {
		let mut paginate = super::Paginate {
			page: Some(1),
			size: Some(10),
		};

		assert_eq!(paginate.offset(), 0);

		paginate.page = Some(2);

		assert_eq!(paginate.offset(), 10);

		paginate.size = Some(5);

		assert_eq!(paginate.offset(), 5);

		paginate.page = Some(3);

		assert_eq!(paginate.offset(), 10);
	}

	#[test]
	fn test_paginate_limit() {
		let paginate = super::Paginate {
			page: None,
			size: Some(10),
		};

		assert_eq!(paginate.limit(), Some(10));

		let paginate = super::Paginate {
			page: Some(2),
			size: None,
		};

		assert_eq!(paginate.limit(), Some(super::DEFAULT_PAGE_SIZE));
		assert_eq!(paginate.offset(), super::DEFAULT_PAGE_SIZE);
	}

	#[test]
	fn test_email_domain_needs_a_dot() {
		assert!(super::validate_email_domain("a@x.com").is_ok());
		assert!(super::validate_email_domain("a@localhost").is_err());
		assert!(super::validate_email_domain("a@x.").is_err());
		assert!(super::validate_email_domain("a@.com").is_err());
	}

	#[test]
	fn test_paginate_absent_is_unlimited() {
		let paginate = super::Paginate::default();

		assert_eq!(paginate.limit(), None);
		assert_eq!(paginate.offset(), 0);
	}

	#[test]
	fn test_paginate_huge_page_does_not_overflow() {
		let paginate = super::Paginate {
			page: Some(i64::MAX),
			size: Some(100),
		};

		assert!(paginate.validate().is_err());
		assert!(paginate.offset() >= 0);
	}

	#[derive(Deserialize)]
	struct Normalized {
		#[serde(deserialize_with = "normalize::email")]
		email: String,
		#[serde(default, deserialize_with = "normalize::optional_trimmed")]
		name: Option<String>,
	}

	#[test]
	fn test_normalize_email_and_name() {
		let value: Normalized = serde_json::from_value(serde_json::json!({
			"email": "  A@X.Com ",
			"name": "  Ada  ",
		}))
		.unwrap();

		assert_eq!(value.email, "a@x.com");
		assert_eq!(value.name.as_deref(), Some("Ada"));
	}

	#[test]
	fn test_normalize_missing_optional() {
		let value: Normalized =
			serde_json::from_value(serde_json::json!({ "email": "a@x.com" })).unwrap();

		assert!(value.name.is_none());
	}
}

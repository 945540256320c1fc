use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";
pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const USER: &str = "User";
	pub const PROFILE: &str = "Profile";
	pub const SWIPE: &str = "Swipe";
	pub const REPORT: &str = "Report";
}

fn tag(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Matchmaker API")
		.summary("Accounts, profiles, swipes, matches and reports")
		.description(include_str!("../README.md"))
		.tag(tag(tag::AUTH, "Registration and sessions"))
		.tag(tag(tag::USER, "User accounts"))
		.tag(tag(tag::PROFILE, "Profiles and matching preferences"))
		.tag(tag(tag::SWIPE, "Swipes and matches"))
		.tag(tag(tag::REPORT, "Abuse reports and moderation"))
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Header,
				name: "Authorization".into(),
				description: Some("`Bearer <session id>`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				errors: error::Message::new("error_code")
					.field("optional field")
					.detail("key", "value")
					.into_vec(),
			})
		})
}

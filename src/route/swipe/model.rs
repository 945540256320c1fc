use schemars::JsonSchema;
use serde::Serialize;

pub use crate::model::{CreateSwipe, Match, Swipe};

/// The recorded swipe, and the match it completed if any.
#[derive(Serialize, JsonSchema)]
pub struct SwipeResponse {
	pub swipe: Swipe,
	#[serde(rename = "match")]
	pub matched: Option<Match>,
}

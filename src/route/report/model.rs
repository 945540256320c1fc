use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

pub use crate::model::{CreateReport, Report, ReportStatus};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ReportFilter {
	/// Only return reports with this status.
	pub status: Option<ReportStatus>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdateReportStatusInput {
	pub status: ReportStatus,
}

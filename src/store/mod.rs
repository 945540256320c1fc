//! Data-access context.
//!
//! Route handlers only ever talk to a [`Store`]. It is opened once at startup,
//! shared through the axum state and closed on shutdown.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
	Match, NewUser, Preferences, Profile, Report, ReportStatus, Session, Swipe, User, UserPatch,
};

/// A uniqueness rule enforced by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
	Email,
	Swipe,
	Report,
}

impl Constraint {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Email => "email",
			Self::Swipe => "swipe",
			Self::Report => "report",
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("duplicate {}", .0.as_str())]
	Duplicate(Constraint),
	/// A referenced row does not exist (e.g. a foreign key target was deleted).
	#[error("referenced row not found")]
	NotFound,
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The outcome of recording a swipe.
#[derive(Debug, Clone)]
pub struct SwipeOutcome {
	pub swipe: Swipe,
	/// The match for the pair, if both users have now liked each other.
	pub matched: Option<Match>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
	/// Inserts a new user, failing with [`Constraint::Email`] if the email is taken.
	async fn create_user(&self, user: NewUser) -> StoreResult<User>;

	/// Inserts a new user and opens their first session in one transaction.
	async fn create_user_with_session(&self, user: NewUser) -> StoreResult<(User, Session)>;

	/// Lists users, oldest first. A `limit` of `None` returns every user past `offset`.
	async fn list_users(&self, limit: Option<i64>, offset: i64) -> StoreResult<Vec<User>>;

	async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

	async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

	/// Applies a patch, returning the updated user or `None` if it does not exist.
	async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>>;

	/// Deletes a user and everything that references it.
	/// Returns `false` if the user did not exist.
	async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
	async fn create_session(&self, user_id: Uuid) -> StoreResult<Session>;

	/// Returns the user that owns the session.
	async fn find_session_user(&self, session_id: Uuid) -> StoreResult<Option<User>>;

	async fn delete_session(&self, session_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
	async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;

	/// Inserts or replaces the profile of `profile.user_id`.
	async fn save_profile(&self, profile: Profile) -> StoreResult<Profile>;

	async fn find_preferences(&self, user_id: Uuid) -> StoreResult<Option<Preferences>>;

	/// Inserts or replaces the preferences of `preferences.user_id`.
	async fn save_preferences(&self, preferences: Preferences) -> StoreResult<Preferences>;
}

#[async_trait]
pub trait SwipeRepository: Send + Sync {
	/// Records a swipe and, if it completes a mutual like, creates the match
	/// in the same transaction.
	///
	/// A second swipe for the same ordered pair fails with [`Constraint::Swipe`].
	async fn record_swipe(&self, swipe: Swipe) -> StoreResult<SwipeOutcome>;

	/// Lists the matches of a user, newest first.
	async fn list_matches(&self, user_id: Uuid) -> StoreResult<Vec<Match>>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
	/// Inserts a report, failing with [`Constraint::Report`] if the reporter
	/// already reported that user.
	async fn create_report(&self, report: Report) -> StoreResult<Report>;

	/// Lists reports, newest first.
	async fn list_reports(&self, status: Option<ReportStatus>) -> StoreResult<Vec<Report>>;

	async fn update_report_status(
		&self,
		id: Uuid,
		status: ReportStatus,
	) -> StoreResult<Option<Report>>;
}

/// Everything a route handler can ask of the persistence layer.
#[async_trait]
pub trait Store:
	UserRepository + SessionRepository + ProfileRepository + SwipeRepository + ReportRepository
{
	/// Releases the underlying resources. Called once on shutdown.
	async fn close(&self);
}

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::model::{
	self, Match, NewUser, Preferences, Profile, Report, ReportStatus, Role, Session, Swipe,
	SwipeAction, User, UserPatch,
};

use super::{
	Constraint, ProfileRepository, ReportRepository, SessionRepository, Store, StoreError,
	StoreResult, SwipeOutcome, SwipeRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	profiles: HashMap<Uuid, Profile>,
	preferences: HashMap<Uuid, Preferences>,
	/// Keyed by (swiper, swiped).
	swipes: HashMap<(Uuid, Uuid), Swipe>,
	/// Keyed by the ordered pair of user ids.
	matches: HashMap<[Uuid; 2], Match>,
	reports: HashMap<Uuid, Report>,
}

impl Tables {
	fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
		if self.email_taken(&user.email, None) {
			return Err(StoreError::Duplicate(Constraint::Email));
		}

		let now = chrono::Utc::now();
		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			name: user.name,
			role: Role::User,
			profile_image: model::DEFAULT_PROFILE_IMAGE.into(),
			is_verified: false,
			is_active: true,
			created_at: now,
			updated_at: now,
		};

		self.users.insert(user.id, user.clone());
		Ok(user)
	}

	fn insert_session(&mut self, user_id: Uuid) -> StoreResult<Session> {
		if !self.users.contains_key(&user_id) {
			return Err(StoreError::NotFound);
		}

		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: chrono::Utc::now(),
		};

		self.sessions.insert(session.id, session.clone());
		Ok(session)
	}

	fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
		self.users
			.values()
			.any(|user| user.email == email && Some(user.id) != except)
	}
}

/// A store that keeps everything in process memory.
///
/// All tables sit behind a single lock, so every operation is atomic
/// with respect to every other one.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Changes the role of a user, bypassing the API.
	#[cfg(test)]
	pub fn set_role(&self, id: Uuid, role: Role) -> bool {
		match self.tables.write().users.get_mut(&id) {
			Some(user) => {
				user.role = role;
				true
			}
			None => false,
		}
	}
}

#[async_trait]
impl UserRepository for MemoryStore {
	async fn create_user(&self, user: NewUser) -> StoreResult<User> {
		self.tables.write().insert_user(user)
	}

	async fn create_user_with_session(&self, user: NewUser) -> StoreResult<(User, Session)> {
		let mut tables = self.tables.write();
		let user = tables.insert_user(user)?;
		let session = tables.insert_session(user.id)?;

		Ok((user, session))
	}

	async fn list_users(&self, limit: Option<i64>, offset: i64) -> StoreResult<Vec<User>> {
		let tables = self.tables.read();
		let mut users = tables.users.values().cloned().collect::<Vec<_>>();

		users.sort_by_key(|user| (user.created_at, user.id));

		Ok(users
			.into_iter()
			.skip(usize::try_from(offset).unwrap_or(0))
			.take(limit.map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(0)))
			.collect())
	}

	async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
		Ok(self.tables.read().users.get(&id).cloned())
	}

	async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
		Ok(self
			.tables
			.read()
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
		let mut tables = self.tables.write();

		if let Some(email) = &patch.email {
			if tables.email_taken(email, Some(id)) {
				return Err(StoreError::Duplicate(Constraint::Email));
			}
		}

		let Some(user) = tables.users.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(email) = patch.email {
			user.email = email;
		}
		if let Some(password) = patch.password {
			user.password = password;
		}
		if let Some(name) = patch.name {
			user.name = name;
		}
		if let Some(profile_image) = patch.profile_image {
			user.profile_image = profile_image;
		}
		if let Some(role) = patch.role {
			user.role = role;
		}
		if let Some(is_verified) = patch.is_verified {
			user.is_verified = is_verified;
		}
		if let Some(is_active) = patch.is_active {
			user.is_active = is_active;
		}

		user.updated_at = chrono::Utc::now();

		Ok(Some(user.clone()))
	}

	async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
		let mut tables = self.tables.write();

		if tables.users.remove(&id).is_none() {
			return Ok(false);
		}

		tables.sessions.retain(|_, session| session.user_id != id);
		tables.profiles.remove(&id);
		tables.preferences.remove(&id);
		tables
			.swipes
			.retain(|(swiper, swiped), _| *swiper != id && *swiped != id);
		tables.matches.retain(|_, m| !m.includes(id));
		tables
			.reports
			.retain(|_, report| report.reporter_id != id && report.reported_id != id);

		Ok(true)
	}
}

#[async_trait]
impl SessionRepository for MemoryStore {
	async fn create_session(&self, user_id: Uuid) -> StoreResult<Session> {
		self.tables.write().insert_session(user_id)
	}

	async fn find_session_user(&self, session_id: Uuid) -> StoreResult<Option<User>> {
		let tables = self.tables.read();

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|session| tables.users.get(&session.user_id))
			.cloned())
	}

	async fn delete_session(&self, session_id: Uuid) -> StoreResult<bool> {
		Ok(self.tables.write().sessions.remove(&session_id).is_some())
	}
}

#[async_trait]
impl ProfileRepository for MemoryStore {
	async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
		Ok(self.tables.read().profiles.get(&user_id).cloned())
	}

	async fn save_profile(&self, mut profile: Profile) -> StoreResult<Profile> {
		let mut tables = self.tables.write();

		if !tables.users.contains_key(&profile.user_id) {
			return Err(StoreError::NotFound);
		}

		if let Some(existing) = tables.profiles.get(&profile.user_id) {
			profile.created_at = existing.created_at;
		}

		profile.updated_at = chrono::Utc::now();
		tables.profiles.insert(profile.user_id, profile.clone());

		Ok(profile)
	}

	async fn find_preferences(&self, user_id: Uuid) -> StoreResult<Option<Preferences>> {
		Ok(self.tables.read().preferences.get(&user_id).cloned())
	}

	async fn save_preferences(&self, mut preferences: Preferences) -> StoreResult<Preferences> {
		let mut tables = self.tables.write();

		if !tables.users.contains_key(&preferences.user_id) {
			return Err(StoreError::NotFound);
		}

		if let Some(existing) = tables.preferences.get(&preferences.user_id) {
			preferences.created_at = existing.created_at;
		}

		preferences.updated_at = chrono::Utc::now();
		tables
			.preferences
			.insert(preferences.user_id, preferences.clone());

		Ok(preferences)
	}
}

#[async_trait]
impl SwipeRepository for MemoryStore {
	async fn record_swipe(&self, swipe: Swipe) -> StoreResult<SwipeOutcome> {
		let mut tables = self.tables.write();

		if !tables.users.contains_key(&swipe.swiper_id)
			|| !tables.users.contains_key(&swipe.swiped_id)
		{
			return Err(StoreError::NotFound);
		}

		let key = (swipe.swiper_id, swipe.swiped_id);

		if tables.swipes.contains_key(&key) {
			return Err(StoreError::Duplicate(Constraint::Swipe));
		}

		tables.swipes.insert(key, swipe.clone());

		if swipe.action != SwipeAction::Like {
			return Ok(SwipeOutcome {
				swipe,
				matched: None,
			});
		}

		let reciprocal = tables
			.swipes
			.get(&(swipe.swiped_id, swipe.swiper_id))
			.is_some_and(|other| other.action == SwipeAction::Like);

		let matched = reciprocal.then(|| {
			tables
				.matches
				.entry(model::ordered_pair(swipe.swiper_id, swipe.swiped_id))
				.or_insert_with(|| Match::new(swipe.swiper_id, swipe.swiped_id))
				.clone()
		});

		Ok(SwipeOutcome { swipe, matched })
	}

	async fn list_matches(&self, user_id: Uuid) -> StoreResult<Vec<Match>> {
		let tables = self.tables.read();
		let mut matches = tables
			.matches
			.values()
			.filter(|m| m.includes(user_id))
			.cloned()
			.collect::<Vec<_>>();

		matches.sort_by(|a, b| b.matched_at.cmp(&a.matched_at));
		Ok(matches)
	}
}

#[async_trait]
impl ReportRepository for MemoryStore {
	async fn create_report(&self, report: Report) -> StoreResult<Report> {
		let mut tables = self.tables.write();

		if !tables.users.contains_key(&report.reporter_id)
			|| !tables.users.contains_key(&report.reported_id)
		{
			return Err(StoreError::NotFound);
		}

		if tables.reports.values().any(|existing| {
			existing.reporter_id == report.reporter_id && existing.reported_id == report.reported_id
		}) {
			return Err(StoreError::Duplicate(Constraint::Report));
		}

		tables.reports.insert(report.id, report.clone());
		Ok(report)
	}

	async fn list_reports(&self, status: Option<ReportStatus>) -> StoreResult<Vec<Report>> {
		let tables = self.tables.read();
		let mut reports = tables
			.reports
			.values()
			.filter(|report| status.map_or(true, |status| report.status == status))
			.cloned()
			.collect::<Vec<_>>();

		reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(reports)
	}

	async fn update_report_status(
		&self,
		id: Uuid,
		status: ReportStatus,
	) -> StoreResult<Option<Report>> {
		let mut tables = self.tables.write();

		Ok(tables.reports.get_mut(&id).map(|report| {
			report.status = status;
			report.updated_at = chrono::Utc::now();
			report.clone()
		}))
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn close(&self) {}
}

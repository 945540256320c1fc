use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgExecutor, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::model::{
	self, Match, NewUser, Preferences, Profile, Report, ReportStatus, Session, Swipe, SwipeAction,
	User, UserPatch,
};

use super::{
	Constraint, ProfileRepository, ReportRepository, SessionRepository, Store, StoreError,
	StoreResult, SwipeOutcome, SwipeRepository, UserRepository,
};

/// Maps unique violations to [`StoreError::Duplicate`] and foreign key
/// violations to [`StoreError::NotFound`].
fn map_violation(error: sqlx::Error, constraint: Constraint) -> StoreError {
	if let Some(db) = error.as_database_error() {
		if db.is_unique_violation() {
			return StoreError::Duplicate(constraint);
		}

		if db.is_foreign_key_violation() {
			return StoreError::NotFound;
		}
	}

	StoreError::Database(error)
}

fn map_foreign_key(error: sqlx::Error) -> StoreError {
	match error.as_database_error() {
		Some(db) if db.is_foreign_key_violation() => StoreError::NotFound,
		_ => StoreError::Database(error),
	}
}

/// Folds an ordered pair of user ids into a transaction-scoped advisory lock key.
fn pair_lock_key(pair: [Uuid; 2]) -> i64 {
	let hash = pair[0].as_u128() ^ pair[1].as_u128().rotate_left(64);

	(hash as i64) ^ ((hash >> 64) as i64)
}

async fn insert_user<'e, E: PgExecutor<'e>>(executor: E, user: NewUser) -> StoreResult<User> {
	sqlx::query_as::<_, User>(
		r#"
			INSERT INTO "user" (id, email, password, name, profile_image)
			VALUES ($1, $2, $3, $4, $5)
			RETURNING *
		"#,
	)
	.bind(user.id)
	.bind(user.email)
	.bind(user.password)
	.bind(user.name)
	.bind(model::DEFAULT_PROFILE_IMAGE)
	.fetch_one(executor)
	.await
	.map_err(|e| map_violation(e, Constraint::Email))
}

async fn insert_session<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid) -> StoreResult<Session> {
	sqlx::query_as::<_, Session>("INSERT INTO session (id, user_id) VALUES ($1, $2) RETURNING *")
		.bind(Uuid::new_v4())
		.bind(user_id)
		.fetch_one(executor)
		.await
		.map_err(map_foreign_key)
}

#[derive(sqlx::FromRow)]
struct MatchRow {
	id: Uuid,
	user_a: Uuid,
	user_b: Uuid,
	matched_at: chrono::DateTime<chrono::Utc>,
}

impl From<MatchRow> for Match {
	fn from(row: MatchRow) -> Self {
		Self {
			id: row.id,
			users: [row.user_a, row.user_b],
			matched_at: row.matched_at,
		}
	}
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the database and runs any pending migrations.
	pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}

	#[cfg(test)]
	pub fn from_pool(pool: PgPool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl UserRepository for PgStore {
	#[instrument(skip(self, user))]
	async fn create_user(&self, user: NewUser) -> StoreResult<User> {
		insert_user(&self.pool, user).await
	}

	#[instrument(skip(self, user))]
	async fn create_user_with_session(&self, user: NewUser) -> StoreResult<(User, Session)> {
		let mut tx = self.pool.begin().await?;

		let user = insert_user(&mut *tx, user).await?;
		let session = insert_session(&mut *tx, user.id).await?;

		tx.commit().await?;

		Ok((user, session))
	}

	#[instrument(skip(self))]
	async fn list_users(&self, limit: Option<i64>, offset: i64) -> StoreResult<Vec<User>> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user"
				ORDER BY created_at, id
				LIMIT $1 OFFSET $2
			"#,
		)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?)
	}

	#[instrument(skip(self))]
	async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
				.bind(id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	#[instrument(skip(self))]
	async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	#[instrument(skip(self, patch))]
	async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
		sqlx::query_as::<_, User>(
			r#"
				UPDATE "user"
				SET email = COALESCE($1, email),
					password = COALESCE($2, password),
					name = COALESCE($3, name),
					profile_image = COALESCE($4, profile_image),
					role = COALESCE($5, role),
					is_verified = COALESCE($6, is_verified),
					is_active = COALESCE($7, is_active),
					updated_at = NOW()
				WHERE id = $8
				RETURNING *
			"#,
		)
		.bind(patch.email)
		.bind(patch.password)
		.bind(patch.name)
		.bind(patch.profile_image)
		.bind(patch.role)
		.bind(patch.is_verified)
		.bind(patch.is_active)
		.bind(id)
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| map_violation(e, Constraint::Email))
	}

	#[instrument(skip(self))]
	async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
		let status = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}
}

#[async_trait]
impl SessionRepository for PgStore {
	#[instrument(skip(self))]
	async fn create_session(&self, user_id: Uuid) -> StoreResult<Session> {
		insert_session(&self.pool, user_id).await
	}

	#[instrument(skip_all)]
	async fn find_session_user(&self, session_id: Uuid) -> StoreResult<Option<User>> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	#[instrument(skip_all)]
	async fn delete_session(&self, session_id: Uuid) -> StoreResult<bool> {
		let status = sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}
}

#[async_trait]
impl ProfileRepository for PgStore {
	#[instrument(skip(self))]
	async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
		Ok(
			sqlx::query_as::<_, Profile>("SELECT * FROM user_profile WHERE user_id = $1")
				.bind(user_id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	#[instrument(skip(self, profile), fields(user_id = %profile.user_id))]
	async fn save_profile(&self, profile: Profile) -> StoreResult<Profile> {
		sqlx::query_as::<_, Profile>(
			r#"
				INSERT INTO user_profile (user_id, bio, skills, languages, github, photos, location, age)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
				ON CONFLICT (user_id) DO UPDATE SET
					bio = EXCLUDED.bio,
					skills = EXCLUDED.skills,
					languages = EXCLUDED.languages,
					github = EXCLUDED.github,
					photos = EXCLUDED.photos,
					location = EXCLUDED.location,
					age = EXCLUDED.age,
					updated_at = NOW()
				RETURNING *
			"#,
		)
		.bind(profile.user_id)
		.bind(profile.bio)
		.bind(profile.skills)
		.bind(profile.languages)
		.bind(profile.github)
		.bind(profile.photos)
		.bind(profile.location)
		.bind(profile.age)
		.fetch_one(&self.pool)
		.await
		.map_err(map_foreign_key)
	}

	#[instrument(skip(self))]
	async fn find_preferences(&self, user_id: Uuid) -> StoreResult<Option<Preferences>> {
		Ok(
			sqlx::query_as::<_, Preferences>("SELECT * FROM user_preferences WHERE user_id = $1")
				.bind(user_id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	#[instrument(skip(self, preferences), fields(user_id = %preferences.user_id))]
	async fn save_preferences(&self, preferences: Preferences) -> StoreResult<Preferences> {
		sqlx::query_as::<_, Preferences>(
			r#"
				INSERT INTO user_preferences
					(user_id, preferred_languages, preferred_skills, max_distance, min_age, max_age)
				VALUES ($1, $2, $3, $4, $5, $6)
				ON CONFLICT (user_id) DO UPDATE SET
					preferred_languages = EXCLUDED.preferred_languages,
					preferred_skills = EXCLUDED.preferred_skills,
					max_distance = EXCLUDED.max_distance,
					min_age = EXCLUDED.min_age,
					max_age = EXCLUDED.max_age,
					updated_at = NOW()
				RETURNING *
			"#,
		)
		.bind(preferences.user_id)
		.bind(preferences.preferred_languages)
		.bind(preferences.preferred_skills)
		.bind(preferences.max_distance)
		.bind(preferences.min_age)
		.bind(preferences.max_age)
		.fetch_one(&self.pool)
		.await
		.map_err(map_foreign_key)
	}
}

#[async_trait]
impl SwipeRepository for PgStore {
	#[instrument(skip(self, swipe), fields(swiper = %swipe.swiper_id, swiped = %swipe.swiped_id))]
	async fn record_swipe(&self, swipe: Swipe) -> StoreResult<SwipeOutcome> {
		let pair = model::ordered_pair(swipe.swiper_id, swipe.swiped_id);
		let mut tx = self.pool.begin().await?;

		// Serializes concurrent swipes within a pair, so two crossing likes
		// always see each other.
		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(pair_lock_key(pair))
			.execute(&mut *tx)
			.await?;

		let swipe = sqlx::query_as::<_, Swipe>(
			r#"
				INSERT INTO swipe (id, swiper_id, swiped_id, action)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(swipe.id)
		.bind(swipe.swiper_id)
		.bind(swipe.swiped_id)
		.bind(swipe.action)
		.fetch_one(&mut *tx)
		.await
		.map_err(|e| map_violation(e, Constraint::Swipe))?;

		let mut matched = None;

		if swipe.action == SwipeAction::Like {
			let reciprocal = sqlx::query_scalar::<_, bool>(
				r#"
					SELECT EXISTS(
						SELECT 1 FROM swipe
						WHERE swiper_id = $1 AND swiped_id = $2 AND action = 'like'
					)
				"#,
			)
			.bind(swipe.swiped_id)
			.bind(swipe.swiper_id)
			.fetch_one(&mut *tx)
			.await?;

			if reciprocal {
				let inserted = sqlx::query_as::<_, MatchRow>(
					r#"
						INSERT INTO "match" (id, user_a, user_b)
						VALUES ($1, $2, $3)
						ON CONFLICT (user_a, user_b) DO NOTHING
						RETURNING *
					"#,
				)
				.bind(Uuid::new_v4())
				.bind(pair[0])
				.bind(pair[1])
				.fetch_optional(&mut *tx)
				.await?;

				let row = match inserted {
					Some(row) => row,
					None => {
						sqlx::query_as::<_, MatchRow>(
							r#"SELECT * FROM "match" WHERE user_a = $1 AND user_b = $2"#,
						)
						.bind(pair[0])
						.bind(pair[1])
						.fetch_one(&mut *tx)
						.await?
					}
				};

				matched = Some(Match::from(row));
			}
		}

		tx.commit().await?;

		Ok(SwipeOutcome { swipe, matched })
	}

	#[instrument(skip(self))]
	async fn list_matches(&self, user_id: Uuid) -> StoreResult<Vec<Match>> {
		let rows = sqlx::query_as::<_, MatchRow>(
			r#"
				SELECT * FROM "match"
				WHERE user_a = $1 OR user_b = $1
				ORDER BY matched_at DESC
			"#,
		)
		.bind(user_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(Match::from).collect())
	}
}

#[async_trait]
impl ReportRepository for PgStore {
	#[instrument(skip(self, report), fields(reporter = %report.reporter_id, reported = %report.reported_id))]
	async fn create_report(&self, report: Report) -> StoreResult<Report> {
		sqlx::query_as::<_, Report>(
			r#"
				INSERT INTO report (id, reporter_id, reported_id, reason, status)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(report.id)
		.bind(report.reporter_id)
		.bind(report.reported_id)
		.bind(report.reason)
		.bind(report.status)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| map_violation(e, Constraint::Report))
	}

	#[instrument(skip(self))]
	async fn list_reports(&self, status: Option<ReportStatus>) -> StoreResult<Vec<Report>> {
		Ok(sqlx::query_as::<_, Report>(
			r#"
				SELECT * FROM report
				WHERE $1::report_status IS NULL OR status = $1
				ORDER BY created_at DESC
			"#,
		)
		.bind(status)
		.fetch_all(&self.pool)
		.await?)
	}

	#[instrument(skip(self))]
	async fn update_report_status(
		&self,
		id: Uuid,
		status: ReportStatus,
	) -> StoreResult<Option<Report>> {
		Ok(sqlx::query_as::<_, Report>(
			r#"
				UPDATE report SET status = $1, updated_at = NOW()
				WHERE id = $2
				RETURNING *
			"#,
		)
		.bind(status)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?)
	}
}

#[async_trait]
impl Store for PgStore {
	async fn close(&self) {
		self.pool.close().await;
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn new_user(email: &str) -> NewUser {
		NewUser {
			id: Uuid::new_v4(),
			email: email.into(),
			password: vec![0; 32],
			name: "Tester".into(),
		}
	}

	fn swipe(swiper: Uuid, swiped: Uuid, action: SwipeAction) -> Swipe {
		Swipe {
			id: Uuid::new_v4(),
			swiper_id: swiper,
			swiped_id: swiped,
			action,
			created_at: chrono::Utc::now(),
		}
	}

	#[test]
	fn test_pair_lock_key_is_symmetric() {
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();

		assert_eq!(
			pair_lock_key(model::ordered_pair(a, b)),
			pair_lock_key(model::ordered_pair(b, a))
		);
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL"]
	async fn test_email_constraint(pool: PgPool) {
		let store = PgStore::from_pool(pool);

		store.create_user(new_user("a@x.com")).await.unwrap();

		assert!(matches!(
			store.create_user(new_user("a@x.com")).await,
			Err(StoreError::Duplicate(Constraint::Email))
		));
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL"]
	async fn test_mutual_like_creates_match(pool: PgPool) {
		let store = PgStore::from_pool(pool);
		let a = store.create_user(new_user("a@x.com")).await.unwrap();
		let b = store.create_user(new_user("b@x.com")).await.unwrap();

		let first = store
			.record_swipe(swipe(a.id, b.id, SwipeAction::Like))
			.await
			.unwrap();
		assert!(first.matched.is_none());

		let second = store
			.record_swipe(swipe(b.id, a.id, SwipeAction::Like))
			.await
			.unwrap();
		assert!(second.matched.is_some());

		assert!(matches!(
			store.record_swipe(swipe(a.id, b.id, SwipeAction::Like)).await,
			Err(StoreError::Duplicate(Constraint::Swipe))
		));

		assert_eq!(store.list_matches(a.id).await.unwrap().len(), 1);
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL"]
	async fn test_crossing_likes_create_one_match(pool: PgPool) {
		let store = PgStore::from_pool(pool);
		let a = store.create_user(new_user("a@x.com")).await.unwrap();
		let b = store.create_user(new_user("b@x.com")).await.unwrap();

		let (forward, backward) = tokio::join!(
			store.record_swipe(swipe(a.id, b.id, SwipeAction::Like)),
			store.record_swipe(swipe(b.id, a.id, SwipeAction::Like)),
		);

		let outcomes = [forward.unwrap(), backward.unwrap()];

		assert!(outcomes.iter().any(|outcome| outcome.matched.is_some()));
		assert_eq!(store.list_matches(a.id).await.unwrap().len(), 1);
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL"]
	async fn test_user_with_session_rolls_back_on_duplicate(pool: PgPool) {
		let store = PgStore::from_pool(pool);

		store
			.create_user_with_session(new_user("a@x.com"))
			.await
			.unwrap();

		assert!(matches!(
			store.create_user_with_session(new_user("a@x.com")).await,
			Err(StoreError::Duplicate(Constraint::Email))
		));
		assert_eq!(store.list_users(None, 0).await.unwrap().len(), 1);
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL"]
	async fn test_delete_user_cascades(pool: PgPool) {
		let store = PgStore::from_pool(pool);
		let a = store.create_user(new_user("a@x.com")).await.unwrap();

		let session = store.create_session(a.id).await.unwrap();
		store.save_profile(Profile::empty(a.id)).await.unwrap();
		store.save_preferences(Preferences::empty(a.id)).await.unwrap();

		assert!(store.delete_user(a.id).await.unwrap());
		assert!(store.find_session_user(session.id).await.unwrap().is_none());
		assert!(store.find_profile(a.id).await.unwrap().is_none());
		assert!(store.find_preferences(a.id).await.unwrap().is_none());
	}
}

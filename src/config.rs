use std::{env, fmt::Display, net::IpAddr, str::FromStr};

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: {reason}")]
pub struct ConfigError {
	key: &'static str,
	reason: String,
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// A Postgres connection string, or `memory://` for the in-memory store.
	pub database_url: String,
	pub database_max_connections: u32,
	pub rate_limit_replenish_seconds: u64,
	pub rate_limit_burst: u32,
	pub otlp_export: bool,
	/// Keys that were not set and fell back to their default.
	pub defaulted: Vec<&'static str>,
}

impl Config {
	/// Loads the configuration from the environment (and `.env`, if present).
	///
	/// This runs before the tracing subscriber exists, so nothing is logged here.
	/// Callers can report [`Config::defaulted`] once logging is up.
	pub fn load() -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();

		let mut defaulted = Vec::new();

		Ok(Self {
			host: try_load("HOST", "127.0.0.1", &mut defaulted)?,
			port: try_load("PORT", "4000", &mut defaulted)?,
			database_url: try_load(
				"DATABASE_URL",
				"postgres://localhost:5432/ddapp",
				&mut defaulted,
			)?,
			database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "10", &mut defaulted)?,
			rate_limit_replenish_seconds: try_load(
				"RATE_LIMIT_REPLENISH_SECONDS",
				"1",
				&mut defaulted,
			)?,
			rate_limit_burst: try_load("RATE_LIMIT_BURST", "50", &mut defaulted)?,
			otlp_export: try_load("OTLP_EXPORT", "false", &mut defaulted)?,
			defaulted,
		})
	}

	pub fn uses_memory_store(&self) -> bool {
		self.database_url == MEMORY_DATABASE_URL
	}
}

fn try_load<T: FromStr>(
	key: &'static str,
	default: &str,
	defaulted: &mut Vec<&'static str>,
) -> Result<T, ConfigError>
where
	T::Err: Display,
{
	let value = env::var(key).unwrap_or_else(|_| {
		defaulted.push(key);
		default.to_string()
	});

	value.parse().map_err(|e: T::Err| ConfigError {
		key,
		reason: e.to_string(),
	})
}

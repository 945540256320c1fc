#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{extract::Request, Extension, Router, ServiceExt};
use tower::{Layer, ServiceBuilder};
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{config::Config, store::Store};

/// The data-access context shared by every handler.
pub type Database = Arc<dyn Store>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store and the hash configuration.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
	#[error(transparent)]
	Config(#[from] config::ConfigError),
	#[error(transparent)]
	Trace(#[from] trace::TraceError),
	#[error(transparent)]
	Store(#[from] store::StoreError),
	#[error("server error: {0}")]
	Io(#[from] std::io::Error),
}

/// Builds the router with every route and the layers that do not need a socket.
fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	let router = ApiRouter::new()
		.nest("/auth", route::auth::routes())
		.merge(route::user::routes())
		.merge(route::profile::routes())
		.merge(route::swipe::routes())
		.merge(route::report::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs);

	router
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

async fn open_store(config: &Config) -> Result<Database, store::StoreError> {
	if config.uses_memory_store() {
		tracing::warn!("using the in-memory store, nothing will be persisted");

		return Ok(Arc::new(store::MemoryStore::new()));
	}

	let store =
		store::PgStore::connect(&config.database_url, config.database_max_connections).await?;

	Ok(Arc::new(store))
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutting down");
}

async fn run() -> Result<(), StartupError> {
	let config = Config::load()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_export)?;

	for key in &config.defaulted {
		tracing::warn!(key, "not set, using the default");
	}

	let database = open_store(&config).await?;
	let state = State {
		database: database.clone(),
		hasher: Argon2::default(),
	};

	let mut router = app(state);

	match ratelimit::from_config(&config) {
		Some(limiter) => {
			ratelimit::cleanup_old_limits(&[&limiter]);
			router = router.layer(GovernorLayer { config: limiter });
		}
		None => tracing::warn!("rate limiting disabled"),
	}

	let app = NormalizePathLayer::trim_trailing_slash().layer(router);
	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!(
		address = %listener.local_addr()?,
		store = if config.uses_memory_store() { "memory" } else { "postgres" },
		"listening"
	);

	let served = axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await;

	database.close().await;
	tracing::info!("store closed");

	Ok(served?)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
	match run().await {
		Ok(()) => std::process::ExitCode::SUCCESS,
		Err(error) => {
			// the subscriber may not be installed yet
			eprintln!("fatal: {error}");
			std::process::ExitCode::FAILURE
		}
	}
}

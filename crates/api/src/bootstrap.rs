//! Wiring of the credential backend selected by configuration.
//!
//! With `DATABASE_URL` set, users and sessions live in PostgreSQL and
//! migrations are applied at startup. Without it both live in process memory
//! and vanish on restart.

use std::sync::Arc;

use warden_core::clock::Clock;
use warden_core::error::CoreError;
use warden_core::memory::{InMemorySessionStore, InMemoryUserDirectory};
use warden_core::password::PasswordHasher;
use warden_core::ports::{SessionStore, UserDirectory};
use warden_core::service::AuthService;
use warden_core::token::TokenGenerator;
use warden_db::{PgSessionStore, PgUserDirectory};

use crate::config::{AuthConfig, ServerConfig};

/// Startup failures. Each one aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to run database migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to initialise auth service: {0}")]
    Auth(#[from] CoreError),
}

/// Build the [`AuthService`] over whichever backend `config` selects.
pub async fn build_auth_service(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> Result<AuthService, BootstrapError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory user and session stores");
        return Ok(in_memory_auth_service(&config.auth, clock)?);
    };

    let pool = warden_db::create_pool(database_url).await?;
    tracing::info!("Database connection pool created");

    warden_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    warden_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let users = Arc::new(PgUserDirectory::new(pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(pool, Arc::clone(&clock)));
    Ok(assemble(users, sessions, &config.auth, clock)?)
}

/// [`AuthService`] over the in-memory directory and session store.
pub fn in_memory_auth_service(
    auth: &AuthConfig,
    clock: Arc<dyn Clock>,
) -> Result<AuthService, CoreError> {
    let users = Arc::new(InMemoryUserDirectory::new(Arc::clone(&clock)));
    let sessions = Arc::new(InMemorySessionStore::new(Arc::clone(&clock)));
    assemble(users, sessions, auth, clock)
}

fn assemble(
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    auth: &AuthConfig,
    clock: Arc<dyn Clock>,
) -> Result<AuthService, CoreError> {
    AuthService::new(
        users,
        sessions,
        PasswordHasher::new(auth.hash_cost)?,
        TokenGenerator::os(),
        clock,
        auth.settings(),
    )
}

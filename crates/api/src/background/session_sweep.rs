//! Periodic removal of expired and revoked sessions.
//!
//! Reads already treat expired sessions as absent; the sweep only bounds how
//! long dead records occupy the store.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use warden_core::service::AuthService;

/// Shortest accepted sweep period. `tokio::time::interval` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Run the session sweep loop until `cancel` is triggered.
///
/// The first sweep runs immediately. Periods below one second are raised
/// to one second.
pub async fn run(auth: Arc<AuthService>, every: Duration, cancel: CancellationToken) {
    if every < MIN_INTERVAL {
        tracing::warn!(
            requested_ms = every.as_millis() as u64,
            "Session sweep interval too short, using 1s"
        );
    }
    let every = every.max(MIN_INTERVAL);
    tracing::info!(interval_secs = every.as_secs(), "Session sweep job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                match auth.purge_expired_sessions().await {
                    Ok(0) => tracing::debug!("Session sweep: nothing to purge"),
                    Ok(purged) => tracing::info!(purged, "Session sweep: purged dead sessions"),
                    Err(e) => tracing::error!(error = %e, "Session sweep: purge failed"),
                }
            }
        }
    }
}

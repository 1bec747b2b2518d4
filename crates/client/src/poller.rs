//! Status poller: periodically reconciles session state with the server.
//!
//! Runs on a fixed interval until cancelled. Each tick reads the status for
//! the current user and, on success, replaces the shared session state
//! wholesale. Failed ticks are skipped; the next tick is the retry.
//!
//! Ticks are not serialized against lifecycle operations. A read that
//! overlaps a create or delete may briefly publish stale state, which the
//! following tick corrects.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::session::{SessionState, SharedSession, StatusDecodeError};
use crate::settings::PersistedSettings;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Why a status refresh left the session state untouched
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Decode(#[from] StatusDecodeError),
}

/// Read the status for `user` and publish it. On error nothing is published.
pub async fn refresh_status(
    api: &ApiClient,
    user: &str,
    session: &SharedSession,
) -> Result<(), RefreshError> {
    let items = api.read_status(user).await?;
    let state = SessionState::from_status(&items)?;
    session.store(Arc::new(state));
    Ok(())
}

/// Handle to the running poll task. Dropping it cancels the task.
pub struct StatusPoller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    pub fn spawn(
        api: ApiClient,
        settings: Arc<PersistedSettings>,
        session: SharedSession,
        interval: Duration,
    ) -> Self {
        // tokio intervals panic on a zero period
        let interval = if interval.is_zero() {
            warn!(
                component = "poller",
                event = "poller.zero_interval",
                fallback_ms = DEFAULT_POLL_INTERVAL.as_millis() as u64,
                "Poll interval must be non-zero, using the default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(api, settings, session, interval, cancel.clone()));

        info!(
            component = "poller",
            event = "poller.started",
            interval_ms = interval.as_millis() as u64,
        );

        Self { cancel, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!(
                component = "poller",
                event = "poller.join_failed",
                error = %e,
                "Status poller task did not exit cleanly"
            );
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    api: ApiClient,
    settings: Arc<PersistedSettings>,
    session: SharedSession,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let user = settings.user();
        // A tick in progress is abandoned on cancel rather than awaited
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = refresh_status(&api, &user, &session) => {
                if let Err(e) = result {
                    debug!(
                        component = "poller",
                        event = "poller.tick_skipped",
                        user = %user,
                        error = %e,
                    );
                }
            }
        }
    }

    info!(component = "poller", event = "poller.stopped");
}

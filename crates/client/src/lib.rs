//! Assistant Playground Client
//!
//! Client-side orchestration for a server-hosted assistant session: create
//! the session, poll its status, send prompts, keep the transcript and tear
//! the session down.
//!
//! - [`Orchestrator`] is the façade; every lifecycle operation goes through it.
//! - [`RequestGate`] keeps create/process/delete mutually exclusive.
//! - [`StatusPoller`] reconciles [`SessionState`] with the server on a timer.
//! - [`PersistedSettings`] and [`TranscriptStore`] survive restarts via SQLite.

pub mod api;
pub mod gate;
mod migration_runner;
pub mod orchestrator;
pub mod persistence;
pub mod poller;
pub mod session;
pub mod settings;
pub mod transcript;

pub use api::{ApiClient, ApiError};
pub use gate::{GateGuard, RequestGate};
pub use orchestrator::{Orchestrator, Outcome, Rejection, StatusView, CONFIRM_DELETE_PROMPT};
pub use persistence::{Database, StoreError};
pub use poller::{RefreshError, StatusPoller, DEFAULT_POLL_INTERVAL};
pub use session::{AttachedFile, SessionState, StatusDecodeError, StatusIndicator};
pub use settings::{PersistedSettings, Settings, SettingsField, SAMPLE_PROMPT};
pub use transcript::{TranscriptEntry, TranscriptStore};

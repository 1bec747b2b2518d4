//! Session orchestrator: the single entry point for lifecycle operations.
//!
//! Owns every mutation of session state, transcript and prompt buffer.
//! create/process/delete are mutually exclusive through the `RequestGate`;
//! a call that finds the gate held returns `Outcome::Busy` without touching
//! the network. The status poller runs beside these operations and is not
//! gated.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use playground_protocol::{CreateAssistantRequest, PromptRequest};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::gate::RequestGate;
use crate::persistence::StoreError;
use crate::poller::{refresh_status, RefreshError, StatusPoller};
use crate::session::{AttachedFile, SessionState, SharedSession, StatusIndicator};
use crate::settings::{PersistedSettings, Settings, SAMPLE_PROMPT};
use crate::transcript::{TranscriptEntry, TranscriptStore};

/// Question shown before a delete is carried out.
pub const CONFIRM_DELETE_PROMPT: &str = "Are you sure you want to delete the AI Assistant?";

/// A precondition failed before any network call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("An AI Assistant is already running. Please delete it before creating a new one.")]
    SessionExists,

    #[error(
        "User ID, Assistant Name, Instructions and files are required to create an AI Assistant."
    )]
    MissingFields,
}

/// How a lifecycle operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Another operation held the gate; nothing was done.
    Busy,
    /// The user did not confirm; nothing was done.
    Declined,
    /// Transport, server or storage failure. Details are in the log only;
    /// local state is unchanged.
    Failed,
}

/// Point-in-time view for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub indicator: StatusIndicator,
    pub assistant_id: String,
    pub thread_id: String,
    pub files: Vec<AttachedFile>,
}

pub struct Orchestrator {
    api: ApiClient,
    settings: Arc<PersistedSettings>,
    session: SharedSession,
    transcript: Mutex<TranscriptStore>,
    prompt: ArcSwap<String>,
    gate: RequestGate,
    poller: Option<StatusPoller>,
}

impl Orchestrator {
    /// Build an orchestrator with an empty session and no poller running.
    pub fn new(api: ApiClient, settings: PersistedSettings, transcript: TranscriptStore) -> Self {
        Self {
            api,
            settings: Arc::new(settings),
            session: Arc::new(ArcSwap::from_pointee(SessionState::empty())),
            transcript: Mutex::new(transcript),
            prompt: ArcSwap::from_pointee(String::new()),
            gate: RequestGate::new(),
            poller: None,
        }
    }

    /// Start the background status poller. A poller already running is
    /// replaced (and cancelled).
    pub fn start_polling(&mut self, interval: Duration) {
        self.poller = Some(StatusPoller::spawn(
            self.api.clone(),
            self.settings.clone(),
            self.session.clone(),
            interval,
        ));
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(StatusPoller::is_running)
    }

    /// Stop the poller and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        info!(component = "orchestrator", event = "orchestrator.shutdown");
    }

    // -- Lifecycle operations --

    /// Create a remote assistant from the current settings.
    ///
    /// Session state is populated by a status read after the create call
    /// succeeds, never from the create response.
    pub async fn create(&self) -> Result<Outcome, Rejection> {
        let Some(_guard) = self.gate.try_enter() else {
            debug!(component = "orchestrator", event = "create.busy");
            return Ok(Outcome::Busy);
        };

        if self.session.load().is_active() {
            return Err(Rejection::SessionExists);
        }

        let settings = self.settings.get();
        if !settings.is_complete() {
            return Err(Rejection::MissingFields);
        }

        let request = CreateAssistantRequest {
            file_urls: settings.file_urls(),
            user_name: settings.user,
            name: settings.name,
            instructions: settings.instructions,
        };

        info!(
            component = "orchestrator",
            event = "create.requested",
            user = %request.user_name,
            name = %request.name,
            file_count = request.file_urls.len(),
        );

        if let Err(e) = self.api.create_assistant(&request).await {
            warn!(
                component = "orchestrator",
                event = "create.failed",
                user = %request.user_name,
                error = %e,
                "Create assistant failed"
            );
            return Ok(Outcome::Failed);
        }

        if let Err(e) = refresh_status(&self.api, &request.user_name, &self.session).await {
            // The poller picks the new session up on its next tick.
            warn!(
                component = "orchestrator",
                event = "create.status_failed",
                user = %request.user_name,
                error = %e,
                "Status read after create failed"
            );
        }

        Ok(Outcome::Completed)
    }

    /// Send `prompt` to the assistant and append the reply to the transcript.
    ///
    /// Empty prompts are sent as-is. On success the prompt buffer is cleared.
    pub async fn process(&self, prompt: impl Into<String>) -> Outcome {
        let Some(_guard) = self.gate.try_enter() else {
            debug!(component = "orchestrator", event = "process.busy");
            return Outcome::Busy;
        };

        let request = PromptRequest {
            user_name: self.settings.user(),
            prompt: prompt.into(),
        };

        debug!(
            component = "orchestrator",
            event = "process.requested",
            user = %request.user_name,
            prompt_len = request.prompt.len(),
        );

        let messages = match self.api.process_prompt(&request).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    component = "orchestrator",
                    event = "process.failed",
                    user = %request.user_name,
                    error = %e,
                    "Process prompt failed"
                );
                return Outcome::Failed;
            }
        };

        let entries: Vec<TranscriptEntry> =
            messages.into_iter().map(TranscriptEntry::from).collect();
        let appended = entries.len();

        if let Err(e) = self.transcript.lock().await.append(entries).await {
            warn!(
                component = "orchestrator",
                event = "process.persist_failed",
                error = %e,
                "Failed to persist transcript entries"
            );
            return Outcome::Failed;
        }

        self.prompt.store(Arc::new(String::new()));
        info!(
            component = "orchestrator",
            event = "process.completed",
            user = %request.user_name,
            appended = appended,
        );
        Outcome::Completed
    }

    /// Send whatever is in the prompt buffer.
    pub async fn process_pending(&self) -> Outcome {
        let prompt = self.prompt();
        self.process(prompt).await
    }

    /// Delete the remote assistant after `confirm` resolves to true.
    ///
    /// The request is always sent; local session state may lag the server.
    /// When no session was known locally a server failure is tolerated and
    /// local state is still cleared. The transcript is cleared before the
    /// session and prompt are reset, so a storage failure leaves local state
    /// as it was.
    pub async fn delete<F, Fut>(&self, confirm: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.gate.is_held() {
            debug!(component = "orchestrator", event = "delete.busy");
            return Outcome::Busy;
        }

        if !confirm().await {
            debug!(component = "orchestrator", event = "delete.declined");
            return Outcome::Declined;
        }

        let Some(_guard) = self.gate.try_enter() else {
            debug!(component = "orchestrator", event = "delete.busy");
            return Outcome::Busy;
        };

        let user = self.settings.user();
        let known_session = self.session.load().is_active();
        if let Err(e) = self.api.delete_assistant(&user).await {
            if known_session {
                warn!(
                    component = "orchestrator",
                    event = "delete.failed",
                    user = %user,
                    error = %e,
                    "Delete assistant failed"
                );
                return Outcome::Failed;
            }
            debug!(
                component = "orchestrator",
                event = "delete.no_session",
                user = %user,
                error = %e,
                "Delete failed with no known session, clearing local state"
            );
        }

        if let Err(e) = self.transcript.lock().await.clear().await {
            warn!(
                component = "orchestrator",
                event = "delete.clear_failed",
                user = %user,
                error = %e,
                "Failed to clear transcript"
            );
            return Outcome::Failed;
        }

        self.prompt.store(Arc::new(String::new()));
        self.session.store(Arc::new(SessionState::empty()));

        info!(component = "orchestrator", event = "delete.completed", user = %user);
        Outcome::Completed
    }

    // -- Status --

    /// One status read outside the poll schedule.
    pub async fn sync_status(&self) -> Result<(), RefreshError> {
        refresh_status(&self.api, &self.settings.user(), &self.session).await
    }

    /// True while a lifecycle operation is in flight.
    pub fn is_processing(&self) -> bool {
        self.gate.is_held()
    }

    pub fn status_indicator(&self) -> StatusIndicator {
        StatusIndicator::derive(self.is_processing(), &self.session.load())
    }

    pub fn session(&self) -> Arc<SessionState> {
        self.session.load_full()
    }

    pub fn status_view(&self) -> StatusView {
        let session = self.session.load_full();
        StatusView {
            indicator: StatusIndicator::derive(self.is_processing(), &session),
            assistant_id: session.assistant_id().to_string(),
            thread_id: session.thread_id().to_string(),
            files: session.files().to_vec(),
        }
    }

    // -- Transcript, prompt, settings --

    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().await.all().to_vec()
    }

    pub fn prompt(&self) -> String {
        self.prompt.load().as_ref().clone()
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.prompt.store(Arc::new(prompt.into()));
    }

    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<(), StoreError> {
        self.settings.set(settings).await
    }

    /// Replace the settings with the sample preset and load the sample prompt.
    pub async fn load_sample(&self) -> Result<(), StoreError> {
        self.settings.set(Settings::sample()).await?;
        self.set_prompt(SAMPLE_PROMPT);
        Ok(())
    }
}

//! Session state derived from the server's status records.
//!
//! The assistant id, thread id and file list form one fact: either all are
//! present or the state is empty. Fields are private so the only ways to build
//! a non-empty state are a successful status decode or the test helper.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use playground_protocol::{keys, FileRecord, KvStoreItem};
use thiserror::Error;

/// A file attached to the remote assistant
pub type AttachedFile = FileRecord;

/// Shared, wholesale-replaceable session state (lock-free reads).
pub type SharedSession = Arc<ArcSwap<SessionState>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    assistant_id: String,
    thread_id: String,
    files: Vec<AttachedFile>,
}

/// Why a status response could not be turned into a `SessionState`
#[derive(Debug, Error)]
pub enum StatusDecodeError {
    #[error("status response contained no records")]
    Empty,

    #[error("status response has no '{0}' record")]
    MissingKey(&'static str),

    #[error("status response has {count} '{key}' records, expected one")]
    DuplicateKey { key: &'static str, count: usize },

    #[error("status record '{0}' has an empty value")]
    EmptyValue(&'static str),

    #[error("undecodable file record {value:?}: {source}")]
    InvalidFile {
        value: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionState {
    /// The "no session" state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode the key/value records returned by a status read.
    ///
    /// Fails closed: any missing, duplicated or malformed record rejects the
    /// whole response.
    pub fn from_status(items: &[KvStoreItem]) -> Result<Self, StatusDecodeError> {
        if items.is_empty() {
            return Err(StatusDecodeError::Empty);
        }

        let assistant_id = single_value(items, keys::ASSISTANT)?;
        let thread_id = single_value(items, keys::THREAD)?;

        let files = items
            .iter()
            .filter(|item| item.key == keys::FILE)
            .map(|item| {
                FileRecord::from_record_value(&item.value).map_err(|source| {
                    StatusDecodeError::InvalidFile {
                        value: item.value.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            assistant_id,
            thread_id,
            files,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.assistant_id.is_empty()
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn files(&self) -> &[AttachedFile] {
        &self.files
    }

    #[cfg(test)]
    pub(crate) fn active(assistant_id: &str, thread_id: &str, files: Vec<AttachedFile>) -> Self {
        assert!(!assistant_id.is_empty() && !thread_id.is_empty());
        Self {
            assistant_id: assistant_id.to_string(),
            thread_id: thread_id.to_string(),
            files,
        }
    }
}

fn single_value(items: &[KvStoreItem], key: &'static str) -> Result<String, StatusDecodeError> {
    let mut matches = items.iter().filter(|item| item.key == key);
    let first = matches.next().ok_or(StatusDecodeError::MissingKey(key))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(StatusDecodeError::DuplicateKey {
            key,
            count: extra + 1,
        });
    }
    if first.value.is_empty() {
        return Err(StatusDecodeError::EmptyValue(key));
    }
    Ok(first.value.clone())
}

/// Three-way indicator shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    /// A lifecycle operation is in flight
    Busy,
    IdleNoSession,
    IdleSessionActive,
}

impl StatusIndicator {
    /// Busy wins over everything; otherwise it reflects whether a session exists.
    pub fn derive(processing: bool, session: &SessionState) -> Self {
        if processing {
            StatusIndicator::Busy
        } else if !session.is_active() {
            StatusIndicator::IdleNoSession
        } else {
            StatusIndicator::IdleSessionActive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusIndicator::Busy => "busy",
            StatusIndicator::IdleNoSession => "idle-no-session",
            StatusIndicator::IdleSessionActive => "idle-session-active",
        }
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Append-only conversation transcript, mirrored to SQLite.

use playground_protocol::{ResponseMessage, Role};

use crate::persistence::{Database, StoreError};

/// One exchanged message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    /// Markdown text
    pub content: String,
    pub image: Option<String>,
}

impl From<ResponseMessage> for TranscriptEntry {
    fn from(message: ResponseMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.unwrap_or_default(),
            image: message.image_content.filter(|uri| !uri.is_empty()),
        }
    }
}

pub struct TranscriptStore {
    db: Database,
    entries: Vec<TranscriptEntry>,
}

impl TranscriptStore {
    /// Load the persisted transcript.
    pub async fn load(db: Database) -> Result<Self, StoreError> {
        let entries = db.load_transcript().await?;
        Ok(Self { db, entries })
    }

    /// Add entries at the tail. Memory is only updated once the write lands.
    pub async fn append(&mut self, entries: Vec<TranscriptEntry>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.db.append_transcript(entries.clone()).await?;
        self.entries.extend(entries);
        Ok(())
    }

    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.db.clear_transcript().await?;
        self.entries.clear();
        Ok(())
    }

    pub fn all(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: Role, content: &str) -> TranscriptEntry {
        TranscriptEntry {
            role,
            content: content.to_string(),
            image: None,
        }
    }

    async fn open_store(dir: &tempfile::TempDir) -> TranscriptStore {
        let db = Database::open(dir.path().join("playground.db")).await.unwrap();
        TranscriptStore::load(db).await.unwrap()
    }

    #[test]
    fn response_message_maps_missing_content_and_blank_image() {
        let entry = TranscriptEntry::from(ResponseMessage {
            role: Role::Assistant,
            content: None,
            image_content: Some(String::new()),
        });
        assert_eq!(entry.content, "");
        assert_eq!(entry.image, None);
    }

    #[tokio::test]
    async fn append_extends_tail_and_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir).await;

        store
            .append(vec![entry(Role::User, "q1"), entry(Role::Assistant, "a1")])
            .await
            .unwrap();
        let before = store.all().to_vec();

        store.append(vec![entry(Role::User, "q2")]).await.unwrap();
        assert_eq!(&store.all()[..before.len()], before.as_slice());
        assert_eq!(store.len(), 3);

        let reloaded = open_store(&dir).await;
        assert_eq!(reloaded.all(), store.all());
    }

    #[tokio::test]
    async fn empty_append_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir).await;
        store.append(Vec::new()).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_memory_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir).await;
        store.append(vec![entry(Role::User, "q1")]).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.is_empty());
        assert!(open_store(&dir).await.is_empty());
    }
}

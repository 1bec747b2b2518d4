//! Persistence layer - local SQLite store for settings and transcript.
//!
//! Uses `spawn_blocking` for async-safe SQLite access. Each operation opens
//! its own connection; the database is only ever touched by this client.

use std::path::{Path, PathBuf};

use playground_protocol::Role;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, info};

use crate::migration_runner::run_migrations;
use crate::settings::Settings;
use crate::transcript::TranscriptEntry;

/// Errors raised by the local store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

/// Handle to the on-disk database (cheap to Clone).
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let db_path = path.clone();

        let applied = tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut conn = Connection::open(&db_path)?;
            Ok(run_migrations(&mut conn)?)
        })
        .await??;

        info!(
            component = "persistence",
            event = "database.opened",
            path = %path.display(),
            migrations_applied = applied,
        );

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a fresh connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = connect(&path)?;
            f(&mut conn)
        })
        .await?
    }

    pub async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_name, name, instructions, files FROM settings WHERE id = 1",
                    [],
                    |row| {
                        Ok(Settings {
                            user: row.get(0)?,
                            name: row.get(1)?,
                            instructions: row.get(2)?,
                            files: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
        .await
    }

    /// Overwrite the single settings record.
    pub async fn save_settings(&self, settings: Settings) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO settings (id, user_name, name, instructions, files, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(id) DO UPDATE SET
                   user_name = excluded.user_name,
                   name = excluded.name,
                   instructions = excluded.instructions,
                   files = excluded.files,
                   updated_at = excluded.updated_at",
                params![
                    settings.user,
                    settings.name,
                    settings.instructions,
                    settings.files
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn load_transcript(&self) -> Result<Vec<TranscriptEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sequence, role, content, image_content FROM transcript ORDER BY sequence",
            )?;

            let rows: Vec<(i64, String, String, Option<String>)> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect::<Result<_, _>>()?;

            rows.into_iter()
                .map(|(sequence, role, content, image)| {
                    let role = Role::parse(&role).ok_or_else(|| StoreError::Corrupt {
                        table: "transcript",
                        detail: format!("sequence {sequence} has unknown role {role:?}"),
                    })?;
                    Ok(TranscriptEntry {
                        role,
                        content,
                        image,
                    })
                })
                .collect()
        })
        .await
    }

    /// Append entries after the current tail, all or nothing.
    pub async fn append_transcript(&self, entries: Vec<TranscriptEntry>) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let mut seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sequence), -1) + 1 FROM transcript",
                [],
                |row| row.get(0),
            )?;

            for entry in &entries {
                tx.execute(
                    "INSERT INTO transcript (sequence, role, content, image_content)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![seq, entry.role.as_str(), entry.content, entry.image],
                )?;
                seq += 1;
            }

            tx.commit()?;
            debug!(
                component = "persistence",
                event = "transcript.appended",
                count = entries.len(),
            );
            Ok(())
        })
        .await
    }

    pub async fn clear_transcript(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM transcript", [])?;
            debug!(
                component = "persistence",
                event = "transcript.cleared",
                removed = removed,
            );
            Ok(())
        })
        .await
    }
}

fn connect(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(conn)
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

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("playground.db");
        let db = Database::open(&path).await.unwrap();
        assert!(db.path().exists());

        // Re-opening an existing database is a no-op migration-wise
        Database::open(&path).await.unwrap();
    }

    #[tokio::test]
    async fn settings_row_is_overwritten_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("playground.db")).await.unwrap();
        assert!(db.load_settings().await.unwrap().is_none());

        let mut settings = Settings::default();
        db.save_settings(settings.clone()).await.unwrap();
        settings.name = "Renamed".to_string();
        db.save_settings(settings.clone()).await.unwrap();

        assert_eq!(db.load_settings().await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn transcript_keeps_sequence_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("playground.db")).await.unwrap();

        db.append_transcript(vec![entry(Role::User, "q1"), entry(Role::Assistant, "a1")])
            .await
            .unwrap();
        db.append_transcript(vec![TranscriptEntry {
            role: Role::Assistant,
            content: "chart".to_string(),
            image: Some("http://img/1.png".to_string()),
        }])
        .await
        .unwrap();

        let loaded = db.load_transcript().await.unwrap();
        let contents: Vec<&str> = loaded.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["q1", "a1", "chart"]);
        assert_eq!(loaded[2].image.as_deref(), Some("http://img/1.png"));

        db.clear_transcript().await.unwrap();
        assert!(db.load_transcript().await.unwrap().is_empty());
    }
}

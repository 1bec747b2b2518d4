//! Path resolution for local playground data.
//!
//! Resolved once at startup from: CLI `--data-dir` > `PLAYGROUND_DATA_DIR` env
//! > `~/.assistant-playground`.

use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "PLAYGROUND_DATA_DIR";
const DEFAULT_DIR_NAME: &str = ".assistant-playground";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Priority: `explicit` arg > `PLAYGROUND_DATA_DIR` env > `~/.assistant-playground`.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let env_val = std::env::var(DATA_DIR_ENV).ok().filter(|v| !v.is_empty());
        let root = match (explicit, env_val) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(env_val)) => PathBuf::from(env_val),
            (None, None) => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("HOME directory not found; pass --data-dir"))?
                .join(DEFAULT_DIR_NAME),
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("playground.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Create all required subdirectories under the data dir.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::resolve(Some(dir.path())).unwrap();
        assert_eq!(data.root(), dir.path());
        assert_eq!(data.db_path(), dir.path().join("playground.db"));
        assert_eq!(data.log_dir(), dir.path().join("logs"));
    }

    #[test]
    fn ensure_dirs_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::resolve(Some(&dir.path().join("nested"))).unwrap();
        data.ensure_dirs().unwrap();
        assert!(data.log_dir().is_dir());
    }
}

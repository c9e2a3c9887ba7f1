//! Snapshot persistence backends.
//!
//! The core never persists itself. A [`Backend`] loads a [`Snapshot`] at
//! startup and stores a fresh one after every mutation.

mod csv;
mod kv;

pub use self::csv::{decode_snapshot, encode_snapshot, FileStore};
pub use self::kv::KvStore;

use taskboard_core::models::Snapshot;
use taskboard_core::TaskError;
use thiserror::Error;

use crate::kv::ClientError;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key-value backend: {0}")]
    Kv(#[from] ClientError),

    #[error("snapshot rejected: {0}")]
    Core(#[from] TaskError),
}

/// Where snapshots go.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Nothing is persisted.
    Memory,
    File(FileStore),
    Kv(KvStore),
}

impl Backend {
    pub async fn load(&self) -> Result<Snapshot, PersistError> {
        match self {
            Self::Memory => Ok(Snapshot::default()),
            Self::File(store) => store.load(),
            Self::Kv(store) => store.load().await,
        }
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        match self {
            Self::Memory => Ok(()),
            Self::File(store) => store.save(snapshot),
            Self::Kv(store) => store.save(snapshot).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Memory => "memory".to_string(),
            Self::File(store) => format!("file {}", store.path().display()),
            Self::Kv(store) => format!("kv {}", store.base_url()),
        }
    }
}

//! Append-only JSONL persistence of finished sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::screening::report::ExportRecord;

pub const RECORDS_FILE: &str = "candidates.jsonl";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize export record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Appends one `ExportRecord` per line to `<data_dir>/candidates.jsonl`.
/// Never reads records back.
#[derive(Clone)]
pub struct JsonlStore {
    path: PathBuf,
    hash_salt: Option<SecretString>,
    /// Serializes appends so concurrent sessions never interleave lines.
    write_lock: Arc<Mutex<()>>,
}

impl JsonlStore {
    /// Creates the data directory if needed.
    pub async fn open(data_dir: &Path, hash_salt: Option<SecretString>) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(data_dir).await?;
        Ok(Self {
            path: data_dir.join(RECORDS_FILE),
            hash_salt,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hashes contact fields when a salt is configured, then appends the record.
    pub async fn append(&self, record: ExportRecord) -> Result<(), StoreError> {
        let record = match &self.hash_salt {
            Some(salt) => record.with_hashed_contacts(salt),
            None => record,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(
            session_id = %record.session_id,
            lifecycle = ?record.lifecycle,
            "Export record persisted"
        );
        Ok(())
    }
}

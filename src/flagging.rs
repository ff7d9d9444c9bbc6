//! Manual flagging of chat exchanges
//!
//! Users can mark an answer as liked, spam, inappropriate or something else.
//! Each flag becomes one JSON line in an append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const LOG_FILE: &str = "flags.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagLabel {
    Like,
    Spam,
    Inappropriate,
    Other,
}

impl FlagLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagLabel::Like => "Like",
            FlagLabel::Spam => "Spam",
            FlagLabel::Inappropriate => "Inappropriate",
            FlagLabel::Other => "Other",
        }
    }
}

/// One flagged exchange as stored in the log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct FlagRecord {
    pub at: DateTime<Utc>,
    pub label: FlagLabel,
    pub message: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("could not write flag log: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode flag: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only JSONL log of flagged exchanges
pub struct FlagLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlagLog {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(LOG_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, record: &FlagRecord) -> Result<(), FlagError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(
            label = record.label.as_str(),
            session_id = record.session_id.as_deref().unwrap_or("-"),
            message_chars = record.message.len(),
            answer_chars = record.answer.len(),
            "Exchange flagged"
        );
        Ok(())
    }
}

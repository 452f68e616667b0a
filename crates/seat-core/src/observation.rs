use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One successful reading of the participant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Local>,
    pub count: u64,
}

impl Observation {
    pub fn new(count: u64) -> Self {
        Self {
            timestamp: Local::now(),
            count,
        }
    }

    pub fn at(timestamp: DateTime<Local>, count: u64) -> Self {
        Self { timestamp, count }
    }

    /// Render the observation as one log line, newline included.
    pub fn log_line(&self) -> String {
        format!(
            "{} - Teilnehmer: {}\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.count
        )
    }
}

/// Append-only text log of observations. Never read back.
#[derive(Debug, Clone)]
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, observation: &Observation) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(observation.log_line().as_bytes()).await?;
        file.flush().await
    }
}

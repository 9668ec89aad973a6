//! Marker stores: where the last successful period key lives.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarkerError;

/// Narrow key-value access to the persisted marker.
pub trait MarkerStore: Send + Sync {
    /// Last period key recorded, if any.
    fn get(&self) -> Result<Option<String>, MarkerError>;

    /// Record `period_key` as the last successful period.
    fn set(&self, period_key: &str) -> Result<(), MarkerError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct MarkerFile {
    version: u8,
    last_run: String,
    updated_at: DateTime<Utc>,
}

/// Marker persisted as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarkerStore for FileMarkerStore {
    fn get(&self) -> Result<Option<String>, MarkerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: MarkerFile = serde_json::from_str(&content)?;
        Ok(Some(file.last_run))
    }

    fn set(&self, period_key: &str) -> Result<(), MarkerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = MarkerFile {
            version: 1,
            last_run: period_key.to_string(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        // Write-then-rename so a crash never leaves a truncated marker behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process marker store. Counts writes.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    value: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(period_key: &str) -> Self {
        Self {
            value: Mutex::new(Some(period_key.to_string())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn get(&self) -> Result<Option<String>, MarkerError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn set(&self, period_key: &str) -> Result<(), MarkerError> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(period_key.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

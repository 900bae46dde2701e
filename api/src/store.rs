//! Submission persistence
//!
//! The store is an opaque collaborator with an atomic per-record `create`.
//! Two adapters: in-memory (tests and development) and an append-only
//! JSON-lines file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validated record split into the known registration columns plus the
/// full raw payload. Empty strings are stored as absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub aadhaar: Option<String>,
    pub aadhaar_name: Option<String>,
    pub mobile: Option<String>,
    pub captcha: Option<String>,
    pub otp: Option<String>,
    pub pan_number: Option<String>,
    pub pan_name: Option<String>,
    pub pin_code: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub org_type: Option<String>,
    pub payload: Value,
}

impl NewSubmission {
    pub fn from_record(record: Map<String, Value>) -> Self {
        let column = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            aadhaar: column("aadhaarNumber"),
            aadhaar_name: column("aadhaarName"),
            mobile: column("mobile"),
            captcha: column("captcha"),
            otp: column("otp"),
            pan_number: column("panNumber"),
            pan_name: column("panName"),
            pin_code: column("pinCode"),
            district: column("district"),
            state: column("state"),
            org_type: column("orgType"),
            payload: Value::Object(record),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub submission: NewSubmission,
}

impl StoredSubmission {
    fn new(submission: NewSubmission) -> Self {
        Self { id: Uuid::new_v4(), created_at: Utc::now(), submission }
    }
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist one submission and return its id.
    async fn create(&self, submission: NewSubmission) -> Result<Uuid, StoreError>;

    async fn get(&self, id: &Uuid) -> Result<Option<StoredSubmission>, StoreError>;
}

/// In-memory submission store (for testing and development)
#[derive(Default)]
pub struct InMemorySubmissionStore {
    rows: RwLock<Vec<StoredSubmission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn create(&self, submission: NewSubmission) -> Result<Uuid, StoreError> {
        let row = StoredSubmission::new(submission);
        let id = row.id;
        self.rows.write().push(row);
        Ok(id)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<StoredSubmission>, StoreError> {
        Ok(self.rows.read().iter().find(|r| &r.id == id).cloned())
    }
}

/// Append-only JSON-lines file, one submission per line.
pub struct JsonLinesSubmissionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }
}

#[async_trait]
impl SubmissionStore for JsonLinesSubmissionStore {
    async fn create(&self, submission: NewSubmission) -> Result<Uuid, StoreError> {
        let row = StoredSubmission::new(submission);
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(row.id)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<StoredSubmission>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let row: StoredSubmission = serde_json::from_str(line)?;
            if &row.id == id {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

//! Outbound ports of the wizard: PIN lookup and submission.

use crate::{LookupError, PinLocation, RecordErrors};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Values keyed by field name, as sent to the Submission Endpoint.
pub type FormValues = BTreeMap<String, String>;

/// Postal directory resolving a PIN code to district and state.
#[async_trait]
pub trait PinDirectory: Send + Sync {
    async fn lookup(&self, pin: &str) -> Result<PinLocation, LookupError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("submission rejected: {} field(s) invalid", .0.len())]
    Rejected(RecordErrors),

    #[error("server error: {0}")]
    Server(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Destination of a completed form.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, values: &FormValues) -> Result<SubmitReceipt, SubmitError>;
}

/// Fixed PIN table (for testing and offline development)
#[derive(Default)]
pub struct InMemoryPinDirectory {
    entries: HashMap<String, PinLocation>,
}

impl InMemoryPinDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, pin: &str, district: &str, state: &str) -> Self {
        self.entries.insert(
            pin.to_string(),
            PinLocation { district: district.into(), state: state.into() },
        );
        self
    }
}

#[async_trait]
impl PinDirectory for InMemoryPinDirectory {
    async fn lookup(&self, pin: &str) -> Result<PinLocation, LookupError> {
        self.entries
            .get(pin)
            .cloned()
            .ok_or_else(|| LookupError::NotFound("Error".into()))
    }
}

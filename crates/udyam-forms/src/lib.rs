//! Udyam Registration Form Core
//!
//! Schema-driven model of the multi-step Udyam registration form, shared by
//! the interactive client and the authoritative server check.
//!
//! ## Features
//! - Schema Document model (steps, field descriptors, provenance)
//! - Explicit per-field input transforms
//! - One validation rule-set used by both client and server
//! - Wizard controller with PIN-code auto-fill
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌───────────────────┐
//! │   Schema     │────▶│   FieldRules     │────▶│  RecordValidator  │ (server)
//! │   Document   │     │ required/max/re  │     └───────────────────┘
//! └──────┬───────┘     └────────┬─────────┘
//!        │                      ▼
//!        │             ┌──────────────────┐     ┌───────────────────┐
//!        └────────────▶│  FormController  │────▶│ PinDirectory /    │
//!                      │  (wizard state)  │     │ SubmissionSink    │
//!                      └──────────────────┘     └───────────────────┘
//! ```

#![warn(clippy::all)]

pub mod pin;
pub mod ports;
pub mod schema;
pub mod transform;
pub mod validation;
pub mod wizard;

pub use pin::*;
pub use ports::*;
pub use schema::*;
pub use transform::InputTransform;
pub use validation::*;
pub use wizard::*;

use thiserror::Error;

/// Record key of the PIN code field watched for auto-fill.
pub const PIN_CODE_FIELD: &str = "pinCode";
/// Record key filled from a PIN lookup.
pub const DISTRICT_FIELD: &str = "district";
/// Record key filled from a PIN lookup.
pub const STATE_FIELD: &str = "state";
/// Length at which a PIN code triggers a lookup.
pub const PIN_CODE_LEN: usize = 6;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum FormsError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("submit is only available on the last step")]
    NotOnLastStep,

    #[error("form already submitted")]
    AlreadySubmitted,
}

pub type Result<T> = std::result::Result<T, FormsError>;

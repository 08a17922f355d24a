//! Core library for invoice smart fill.
//!
//! This crate provides:
//! - Invoice record, line item and template catalog models
//! - The upload boundary (channels, MIME sniffing, preview data URIs)
//! - A pluggable extraction interface with a fixed-response mock
//! - The upload → review → template workflow state machine
//! - A tokio session actor driving the workflow (feature `native`)

pub mod error;
pub mod extract;
pub mod models;
pub mod upload;
pub mod workflow;

#[cfg(feature = "native")]
pub mod session;

pub use error::{ExtractionError, Result, SmartFillError, UploadError, WorkflowError};
pub use extract::{InvoiceExtractor, MockExtractor, sample_invoice};
#[cfg(feature = "native")]
pub use extract::extract_invoice;
pub use models::config::SmartFillConfig;
pub use models::invoice::{InvoiceField, InvoiceRecord, LineItem, LineItemColumn};
pub use models::template::{DETAILED, STANDARD, Template, find_template, templates};
pub use upload::{UploadChannel, UploadSurface, UploadedFile};
pub use workflow::{
    Confidence, Event, FieldMappingForm, FilledForm, InvoicePreview, Step, Workflow,
    WorkflowState, format_field_label,
};

#[cfg(feature = "native")]
pub use session::Session;

//! Error types for the smartfill-core library.

use thiserror::Error;

use crate::workflow::Step;

/// Main error type for the smartfill library.
#[derive(Error, Debug)]
pub enum SmartFillError {
    /// Upload boundary error.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Workflow transition error.
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised at the file input boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The drop or picker event carried no file.
    #[error("no file selected")]
    NoFile,

    /// An extraction is already in flight for this session.
    #[error("an invoice is already being processed")]
    Busy,
}

/// Errors a real extraction backend may report.
///
/// The bundled mock never produces these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The backend could not be reached.
    #[error("extraction backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the file.
    #[error("file rejected: {reason}")]
    Rejected { reason: String },
}

/// Errors for transitions the workflow does not allow in its current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The step is disabled until invoice data has been extracted.
    #[error("the {0} step is unavailable until an invoice has been processed")]
    StepLocked(Step),

    /// A new upload arrived while an extraction is running.
    #[error("an extraction is already pending")]
    ExtractionPending,

    /// An extraction result arrived with nothing in flight.
    #[error("no extraction is pending")]
    NoExtractionPending,

    /// An extraction result belongs to a different request than the one in flight.
    #[error("extraction result does not match the pending request")]
    UnexpectedExtraction,

    /// No template in the catalog has this id.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// The action needs a selected template.
    #[error("no template selected")]
    NoTemplateSelected,

    /// The selected template has no such field.
    #[error("template has no field named {0}")]
    UnknownField(String),

    /// The field holds a table, not text.
    #[error("field {0} is not a text field")]
    NotTextField(String),

    /// Line items are only editable on the detailed template.
    #[error("template {0} does not support line items")]
    LineItemsDisabled(String),

    /// Line item row index is past the end of the table.
    #[error("line item {index} out of range (table has {len} rows)")]
    LineItemOutOfRange { index: usize, len: usize },

    /// The session driver has shut down.
    #[error("session closed")]
    SessionClosed,
}

/// Result type for the smartfill library.
pub type Result<T> = std::result::Result<T, SmartFillError>;

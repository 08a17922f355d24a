//! The upload → review → template workflow.

mod controller;
mod form;
mod label;
mod preview;

pub use controller::{
    Command, Event, ExtractionTicket, Notification, NotificationLevel, SELECT_TEMPLATE_PROMPT,
    Step, TabView, TemplatePane, Workflow, WorkflowState,
};
pub use form::{FieldMappingForm, FieldValue, FilledField, FilledForm, FormField};
pub use label::{format_field_label, format_preview_label};
pub use preview::{Confidence, InvoicePreview, NO_DATA_MESSAGE, PreviewRow};

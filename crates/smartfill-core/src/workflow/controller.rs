//! The upload → review → template state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::form::{FieldMappingForm, FilledForm};
use super::preview::InvoicePreview;
use crate::error::{ExtractionError, SmartFillError, WorkflowError};
use crate::models::config::SmartFillConfig;
use crate::models::invoice::{InvoiceRecord, LineItemColumn};
use crate::models::template::{Template, TemplateSelectorView, find_template};
use crate::upload::{UploadChannel, UploadSurface, UploadedFile};

/// Shown in the template step until a template is chosen.
pub const SELECT_TEMPLATE_PROMPT: &str = "Please select a template to continue";

/// A tab of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Upload,
    Review,
    Template,
}

impl Step {
    /// Tabs in display order.
    pub const ALL: [Step; 3] = [Step::Upload, Step::Review, Step::Template];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::Review => "review",
            Step::Template => "template",
        }
    }

    /// Tab caption.
    pub fn title(&self) -> &'static str {
        match self {
            Step::Upload => "Upload",
            Step::Review => "Review",
            Step::Template => "Template",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upload" => Ok(Step::Upload),
            "review" => Ok(Step::Review),
            "template" => Ok(Step::Template),
            other => Err(format!("unknown step: {}", other)),
        }
    }
}

/// Top-level session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub current_step: Step,
    /// `data:` URI of the processed upload.
    pub invoice_image_preview: Option<String>,
    pub extracted_data: Option<InvoiceRecord>,
    pub selected_template: Option<&'static Template>,
    pub is_processing: bool,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            current_step: Step::Upload,
            invoice_image_preview: None,
            extracted_data: None,
            selected_template: None,
            is_processing: false,
        }
    }
}

/// Something that happened to the session.
#[derive(Debug, Clone)]
pub enum Event {
    /// A file came in through the upload surface.
    FileReceived(UploadedFile),
    /// The driver finished running the extractor for `ticket`.
    ExtractionFinished {
        ticket: ExtractionTicket,
        result: Result<InvoiceRecord, ExtractionError>,
    },
    /// A tab was clicked.
    SelectStep(Step),
    /// "Continue to Template" on the review step.
    ContinueToTemplate,
    /// A template card was clicked.
    SelectTemplate(String),
    /// The auto-mapping checkbox changed.
    SetAutoMapping(bool),
    /// A text input changed.
    EditField { key: String, value: String },
    /// A line-item cell changed.
    EditLineItem {
        index: usize,
        column: LineItemColumn,
        value: String,
    },
    /// "+ Add line item".
    AddLineItem,
    /// "Save Template".
    Save,
    /// Drop the current invoice and go back to the upload step.
    StartOver,
}

/// Work the controller asks its driver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Nothing to do.
    None,
    /// Run the extractor on this file, then send
    /// [`Event::ExtractionFinished`] with the same ticket.
    Extract {
        ticket: ExtractionTicket,
        file: UploadedFile,
    },
}

/// Identifies one extraction request.
///
/// Only the workflow issues tickets, so a completion can only be applied to
/// the request it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractionTicket(u64);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A toast for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.to_string(),
            description: description.into(),
        }
    }

    fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

/// One tab as the tab bar shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    pub step: Step,
    pub title: &'static str,
    pub enabled: bool,
    pub active: bool,
}

/// Content of the template step's mapping pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplatePane<'a> {
    Placeholder { message: &'static str },
    Form { form: &'a FieldMappingForm },
}

/// Owns a session and applies events to it one at a time.
#[derive(Debug, Clone)]
pub struct Workflow {
    state: WorkflowState,
    /// Extraction in flight and the file it runs on.
    pending: Option<(ExtractionTicket, UploadedFile)>,
    next_ticket: u64,
    form: Option<FieldMappingForm>,
    saved: Vec<FilledForm>,
    notifications: Vec<Notification>,
    config: SmartFillConfig,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(SmartFillConfig::default())
    }
}

impl Workflow {
    /// Start a session at the upload step.
    pub fn new(config: SmartFillConfig) -> Self {
        Self {
            state: WorkflowState::default(),
            pending: None,
            next_ticket: 0,
            form: None,
            saved: Vec::new(),
            notifications: Vec::new(),
            config,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn config(&self) -> &SmartFillConfig {
        &self.config
    }

    /// Whether a tab can be entered.
    pub fn is_step_enabled(&self, step: Step) -> bool {
        match step {
            Step::Upload => true,
            Step::Review | Step::Template => self.state.extracted_data.is_some(),
        }
    }

    /// The tab bar.
    pub fn tabs(&self) -> Vec<TabView> {
        Step::ALL
            .iter()
            .map(|step| TabView {
                step: *step,
                title: step.title(),
                enabled: self.is_step_enabled(*step),
                active: self.state.current_step == *step,
            })
            .collect()
    }

    /// The upload surface for the current processing flag.
    pub fn upload_surface(&self) -> UploadSurface {
        UploadSurface::new(self.state.is_processing)
    }

    /// Review of the extracted data, if any.
    pub fn preview(&self) -> Option<InvoicePreview> {
        self.state.extracted_data.as_ref().map(InvoicePreview::new)
    }

    /// The template selector.
    pub fn template_selector(&self) -> TemplateSelectorView {
        TemplateSelectorView::new(self.state.selected_template)
    }

    /// The mapping form, present once a template is selected.
    pub fn form(&self) -> Option<&FieldMappingForm> {
        self.form.as_ref()
    }

    /// What the mapping pane shows.
    pub fn template_pane(&self) -> TemplatePane<'_> {
        match &self.form {
            Some(form) => TemplatePane::Form { form },
            None => TemplatePane::Placeholder {
                message: SELECT_TEMPLATE_PROMPT,
            },
        }
    }

    /// Forms saved during this session, oldest first.
    pub fn saved_forms(&self) -> &[FilledForm] {
        &self.saved
    }

    /// Notifications not yet shown.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Hand over pending notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Route one upload channel event through the upload surface.
    pub fn upload(
        &mut self,
        files: impl IntoIterator<Item = UploadedFile>,
        channel: UploadChannel,
    ) -> Result<Command, SmartFillError> {
        let file = self.upload_surface().select(files, channel)?;
        file.advisory_issues(&self.config.upload);
        Ok(self.update(Event::FileReceived(file))?)
    }

    /// Apply one event.
    ///
    /// A rejected event leaves the state untouched.
    pub fn update(&mut self, event: Event) -> Result<Command, WorkflowError> {
        match event {
            Event::FileReceived(file) => return self.begin_extraction(file),
            Event::ExtractionFinished { ticket, result } => {
                self.finish_extraction(ticket, result)?
            }
            Event::SelectStep(step) => self.select_step(step)?,
            Event::ContinueToTemplate => self.select_step(Step::Template)?,
            Event::SelectTemplate(id) => self.select_template(&id)?,
            Event::SetAutoMapping(enabled) => {
                let form = self.form.as_mut().ok_or(WorkflowError::NoTemplateSelected)?;
                form.set_auto_mapping(enabled, self.state.extracted_data.as_ref());
            }
            Event::EditField { key, value } => {
                self.form_mut()?.set_text(&key, value)?;
            }
            Event::EditLineItem {
                index,
                column,
                value,
            } => {
                self.form_mut()?.set_line_item(index, column, value)?;
            }
            Event::AddLineItem => {
                self.form_mut()?.add_line_item()?;
            }
            Event::Save => self.save()?,
            Event::StartOver => self.start_over()?,
        }
        Ok(Command::None)
    }

    fn form_mut(&mut self) -> Result<&mut FieldMappingForm, WorkflowError> {
        self.form.as_mut().ok_or(WorkflowError::NoTemplateSelected)
    }

    fn begin_extraction(&mut self, file: UploadedFile) -> Result<Command, WorkflowError> {
        if self.state.is_processing {
            return Err(WorkflowError::ExtractionPending);
        }

        let ticket = ExtractionTicket(self.next_ticket);
        self.next_ticket += 1;

        debug!("Starting extraction {} of {}", ticket.0, file.name);
        self.state.is_processing = true;
        // The upload surface lives on the upload tab.
        self.state.current_step = Step::Upload;
        self.pending = Some((ticket, file.clone()));
        Ok(Command::Extract { ticket, file })
    }

    fn finish_extraction(
        &mut self,
        ticket: ExtractionTicket,
        result: Result<InvoiceRecord, ExtractionError>,
    ) -> Result<(), WorkflowError> {
        let file = match self.pending.take() {
            Some((pending, file)) if pending == ticket => file,
            Some(other) => {
                self.pending = Some(other);
                return Err(WorkflowError::UnexpectedExtraction);
            }
            None => return Err(WorkflowError::NoExtractionPending),
        };

        self.state.is_processing = false;

        match result {
            Ok(record) => {
                info!(
                    "Extracted {} fields from {}",
                    record.entries().count(),
                    file.name
                );
                self.state.invoice_image_preview = Some(file.to_data_uri());
                self.state.extracted_data = Some(record);
                self.state.current_step = Step::Review;

                if let Some(form) = self.form.as_mut() {
                    form.reseed(self.state.extracted_data.as_ref());
                }

                self.notifications.push(Notification::info(
                    "Invoice Processed",
                    "Data has been extracted from your invoice.",
                ));
            }
            Err(err) => {
                warn!("Extraction failed: {}", err);
                self.state.current_step = Step::Upload;
                self.notifications
                    .push(Notification::error("Extraction Failed", err.to_string()));
            }
        }

        Ok(())
    }

    fn select_step(&mut self, step: Step) -> Result<(), WorkflowError> {
        if !self.is_step_enabled(step) {
            return Err(WorkflowError::StepLocked(step));
        }
        debug!("Step {} -> {}", self.state.current_step, step);
        self.state.current_step = step;
        Ok(())
    }

    fn select_template(&mut self, id: &str) -> Result<(), WorkflowError> {
        if !self.is_step_enabled(Step::Template) {
            return Err(WorkflowError::StepLocked(Step::Template));
        }
        let template =
            find_template(id).ok_or_else(|| WorkflowError::UnknownTemplate(id.to_string()))?;

        let extracted = self.state.extracted_data.as_ref();
        match self.form.as_mut() {
            Some(form) => form.set_template(template, extracted),
            None => {
                self.form = Some(FieldMappingForm::new(
                    template,
                    extracted,
                    self.config.form.auto_mapping,
                ));
            }
        }
        self.state.selected_template = Some(template);
        debug!("Selected template {}", template.id);
        Ok(())
    }

    fn save(&mut self) -> Result<(), WorkflowError> {
        let filled = self.form_mut()?.to_filled();
        info!(
            "Saved {} with {} fields",
            filled.template_name,
            filled.values.len()
        );
        self.saved.push(filled);
        self.notifications.push(Notification::info(
            "Template Saved",
            "Your filled template has been saved successfully.",
        ));
        Ok(())
    }

    fn start_over(&mut self) -> Result<(), WorkflowError> {
        if self.state.is_processing {
            return Err(WorkflowError::ExtractionPending);
        }
        debug!("Starting over, keeping {} saved forms", self.saved.len());
        self.state = WorkflowState::default();
        self.form = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{InvoiceExtractor, MockExtractor, sample_invoice};
    use crate::models::invoice::LineItem;
    use crate::workflow::form::FieldValue;
    use pretty_assertions::assert_eq;

    fn file() -> UploadedFile {
        UploadedFile::new("invoice.png", "image/png", vec![1, 2, 3])
    }

    /// Receive a file and return the extraction the workflow asked for.
    fn begin(workflow: &mut Workflow) -> (ExtractionTicket, UploadedFile) {
        match workflow.update(Event::FileReceived(file())).unwrap() {
            Command::Extract { ticket, file } => (ticket, file),
            other => panic!("expected an extract command, got {:?}", other),
        }
    }

    /// Run the upload and feed the mock's result back.
    fn processed() -> Workflow {
        let mut workflow = Workflow::default();
        let (ticket, upload) = begin(&mut workflow);
        let result = MockExtractor::default().extract(&upload);
        workflow
            .update(Event::ExtractionFinished { ticket, result })
            .unwrap();
        workflow
    }

    #[test]
    fn test_initial_state() {
        let workflow = Workflow::default();
        assert_eq!(workflow.state().current_step, Step::Upload);
        assert!(workflow.state().extracted_data.is_none());
        assert!(!workflow.is_step_enabled(Step::Review));
        assert!(!workflow.is_step_enabled(Step::Template));

        let enabled: Vec<bool> = workflow.tabs().iter().map(|t| t.enabled).collect();
        assert_eq!(enabled, vec![true, false, false]);
    }

    #[test]
    fn test_locked_steps_are_rejected() {
        let mut workflow = Workflow::default();
        assert_eq!(
            workflow.update(Event::SelectStep(Step::Review)),
            Err(WorkflowError::StepLocked(Step::Review))
        );
        assert_eq!(
            workflow.update(Event::ContinueToTemplate),
            Err(WorkflowError::StepLocked(Step::Template))
        );
        assert_eq!(
            workflow.update(Event::SelectTemplate("standard".into())),
            Err(WorkflowError::StepLocked(Step::Template))
        );
        assert_eq!(workflow.state().current_step, Step::Upload);
    }

    #[test]
    fn test_processing_gates_uploads() {
        let mut workflow = Workflow::default();
        let command = workflow.upload(vec![file(), file()], UploadChannel::Drop).unwrap();
        assert!(matches!(command, Command::Extract { .. }));
        assert!(workflow.state().is_processing);
        assert_eq!(workflow.state().current_step, Step::Upload);

        assert!(matches!(
            workflow.upload(vec![file()], UploadChannel::Picker),
            Err(SmartFillError::Upload(crate::error::UploadError::Busy))
        ));
        assert_eq!(
            workflow.update(Event::FileReceived(file())),
            Err(WorkflowError::ExtractionPending)
        );
    }

    #[test]
    fn test_extraction_advances_to_review() {
        let mut workflow = processed();
        let state = workflow.state();

        assert_eq!(state.current_step, Step::Review);
        assert!(!state.is_processing);
        assert_eq!(
            state.extracted_data.as_ref().and_then(|d| d.total.as_deref()),
            Some("$1,246.50")
        );
        assert_eq!(
            state.invoice_image_preview.as_deref(),
            Some("data:image/png;base64,AQID")
        );

        let notes = workflow.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Invoice Processed");
        assert!(workflow.notifications().is_empty());
    }

    #[test]
    fn test_completion_without_request_is_rejected() {
        let mut workflow = Workflow::default();
        assert_eq!(
            workflow.update(Event::ExtractionFinished {
                ticket: ExtractionTicket(0),
                result: Ok(sample_invoice()),
            }),
            Err(WorkflowError::NoExtractionPending)
        );
    }

    #[test]
    fn test_completion_for_other_request_is_rejected() {
        let mut workflow = Workflow::default();
        let (first, _) = begin(&mut workflow);
        let forged = ExtractionTicket(first.0 + 1);
        assert_eq!(
            workflow.update(Event::ExtractionFinished {
                ticket: forged,
                result: Ok(sample_invoice()),
            }),
            Err(WorkflowError::UnexpectedExtraction)
        );
        assert!(workflow.state().is_processing);
        assert!(workflow.state().extracted_data.is_none());

        workflow
            .update(Event::ExtractionFinished {
                ticket: first,
                result: Ok(sample_invoice()),
            })
            .unwrap();

        // A late duplicate of the first result must not complete the second upload.
        let (second, _) = begin(&mut workflow);
        assert_ne!(first, second);
        assert_eq!(
            workflow.update(Event::ExtractionFinished {
                ticket: first,
                result: Ok(sample_invoice()),
            }),
            Err(WorkflowError::UnexpectedExtraction)
        );
        assert!(workflow.state().is_processing);
    }

    #[test]
    fn test_new_upload_returns_to_upload_step() {
        let mut workflow = processed();
        workflow.update(Event::ContinueToTemplate).unwrap();
        assert_eq!(workflow.state().current_step, Step::Template);

        begin(&mut workflow);
        assert_eq!(workflow.state().current_step, Step::Upload);
        assert!(workflow.state().is_processing);
    }

    #[test]
    fn test_template_step_placeholder_until_selected() {
        let mut workflow = processed();
        workflow.update(Event::ContinueToTemplate).unwrap();
        assert_eq!(workflow.state().current_step, Step::Template);
        assert_eq!(
            workflow.template_pane(),
            TemplatePane::Placeholder {
                message: SELECT_TEMPLATE_PROMPT
            }
        );
        assert_eq!(workflow.update(Event::Save), Err(WorkflowError::NoTemplateSelected));
    }

    #[test]
    fn test_end_to_end_detailed_template() {
        let mut workflow = processed();
        workflow.update(Event::ContinueToTemplate).unwrap();
        workflow.update(Event::SelectTemplate("detailed".into())).unwrap();

        let form = workflow.form().unwrap();
        assert_eq!(form.fields().len(), 8);
        let items = form.line_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], LineItem::new("Office Supplies", "5", "$45.00", "$225.00"));
        assert_eq!(workflow.template_selector().options[1].selected, true);

        workflow
            .update(Event::EditField {
                key: "vendorName".into(),
                value: "Acme Corp".into(),
            })
            .unwrap();
        workflow.update(Event::AddLineItem).unwrap();
        workflow
            .update(Event::EditLineItem {
                index: 2,
                column: LineItemColumn::Amount,
                value: "$10.00".into(),
            })
            .unwrap();
        workflow.update(Event::Save).unwrap();

        let saved = &workflow.saved_forms()[0];
        assert_eq!(saved.get("vendorName"), Some("Acme Corp"));
        assert_eq!(saved.line_items.len(), 3);
        assert_eq!(saved.line_items[2].amount, "$10.00");
        assert!(workflow
            .take_notifications()
            .iter()
            .any(|n| n.title == "Template Saved"));
    }

    #[test]
    fn test_unknown_template() {
        let mut workflow = processed();
        assert_eq!(
            workflow.update(Event::SelectTemplate("custom".into())),
            Err(WorkflowError::UnknownTemplate("custom".into()))
        );
        assert!(workflow.state().selected_template.is_none());
    }

    #[test]
    fn test_switching_template_reseeds() {
        let mut workflow = processed();
        workflow.update(Event::SelectTemplate("standard".into())).unwrap();
        workflow
            .update(Event::EditField {
                key: "total".into(),
                value: "$0".into(),
            })
            .unwrap();
        workflow.update(Event::SelectTemplate("detailed".into())).unwrap();

        let form = workflow.form().unwrap();
        assert_eq!(form.text("total"), "$1,246.50");
        assert!(matches!(form.field("lineItems").map(|f| &f.value), Some(FieldValue::Table(_))));
    }

    #[test]
    fn test_auto_mapping_toggle() {
        let mut workflow = processed();
        workflow.update(Event::SelectTemplate("standard".into())).unwrap();
        workflow.update(Event::SetAutoMapping(false)).unwrap();
        workflow
            .update(Event::EditField {
                key: "tax".into(),
                value: "$1".into(),
            })
            .unwrap();
        assert_eq!(workflow.form().unwrap().text("tax"), "$1");

        workflow.update(Event::SetAutoMapping(true)).unwrap();
        assert_eq!(workflow.form().unwrap().text("tax"), "$121.50");
    }

    #[test]
    fn test_failed_extraction_returns_to_upload() {
        let mut workflow = processed();
        workflow.update(Event::SelectTemplate("standard".into())).unwrap();
        workflow.update(Event::Save).unwrap();
        workflow.take_notifications();

        let (ticket, _) = begin(&mut workflow);
        workflow
            .update(Event::ExtractionFinished {
                ticket,
                result: Err(ExtractionError::Unavailable("offline".into())),
            })
            .unwrap();

        let state = workflow.state();
        assert_eq!(state.current_step, Step::Upload);
        assert!(!state.is_processing);
        assert!(state.extracted_data.is_some());
        assert_eq!(workflow.saved_forms().len(), 1);

        let notes = workflow.take_notifications();
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(notes[0].description.contains("offline"));
    }

    #[test]
    fn test_new_data_reseeds_open_form() {
        let mut workflow = processed();
        workflow.update(Event::SelectTemplate("standard".into())).unwrap();
        workflow
            .update(Event::EditField {
                key: "invoiceNumber".into(),
                value: "edited".into(),
            })
            .unwrap();

        let (ticket, _) = begin(&mut workflow);
        let mut other = sample_invoice();
        other.invoice_number = Some("INV-2".into());
        workflow
            .update(Event::ExtractionFinished {
                ticket,
                result: Ok(other),
            })
            .unwrap();

        assert_eq!(workflow.form().unwrap().text("invoiceNumber"), "INV-2");
    }

    #[test]
    fn test_start_over_keeps_saved_forms() {
        let mut workflow = processed();
        workflow.update(Event::SelectTemplate("standard".into())).unwrap();
        workflow.update(Event::Save).unwrap();
        workflow.update(Event::StartOver).unwrap();

        assert_eq!(workflow.state(), &WorkflowState::default());
        assert!(workflow.form().is_none());
        assert_eq!(workflow.saved_forms().len(), 1);
        assert!(!workflow.is_step_enabled(Step::Review));
    }

    #[test]
    fn test_start_over_rejected_while_processing() {
        let mut workflow = Workflow::default();
        workflow.update(Event::FileReceived(file())).unwrap();
        assert_eq!(
            workflow.update(Event::StartOver),
            Err(WorkflowError::ExtractionPending)
        );
    }

    #[test]
    fn test_step_from_str() {
        assert_eq!("Review".parse::<Step>(), Ok(Step::Review));
        assert!("settings".parse::<Step>().is_err());
    }
}

//! Tokio driver for a [`Workflow`].
//!
//! One actor task owns the workflow and applies messages in arrival order.
//! Extractions run in their own task and post their result back to the
//! actor, so the workflow is never touched from two places.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{ExtractionError, Result, WorkflowError};
use crate::extract::{InvoiceExtractor, extract_invoice};
use crate::models::invoice::InvoiceRecord;
use crate::upload::{UploadChannel, UploadedFile};
use crate::workflow::{Command, Event, ExtractionTicket, Workflow, WorkflowState};

type Inspect = Box<dyn FnOnce(&mut Workflow) + Send>;

type Completion = (
    ExtractionTicket,
    std::result::Result<InvoiceRecord, ExtractionError>,
);

enum Message {
    Upload {
        files: Vec<UploadedFile>,
        channel: UploadChannel,
        reply: oneshot::Sender<Result<()>>,
    },
    Event {
        event: Event,
        reply: oneshot::Sender<Result<()>>,
    },
    Inspect(Inspect),
}

/// Handle to a running session actor.
///
/// Dropping every handle stops the actor once in-flight work is done.
pub struct Session {
    tx: mpsc::UnboundedSender<Message>,
    state_rx: watch::Receiver<WorkflowState>,
    handle: JoinHandle<Workflow>,
}

impl Session {
    /// Spawn an actor owning `workflow`. Must be called inside a runtime.
    pub fn spawn<E>(workflow: Workflow, extractor: E) -> Self
    where
        E: InvoiceExtractor + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(workflow.state().clone());
        let handle = tokio::spawn(run(workflow, Arc::new(extractor), rx, state_tx));

        Self {
            tx,
            state_rx,
            handle,
        }
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<()>>) -> Message,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| WorkflowError::SessionClosed)?;
        rx.await.map_err(|_| WorkflowError::SessionClosed)?
    }

    /// Hand files from an upload channel to the session.
    ///
    /// Returns once the extraction has started, not when it finishes.
    pub async fn upload(&self, files: Vec<UploadedFile>, channel: UploadChannel) -> Result<()> {
        self.request(|reply| Message::Upload {
            files,
            channel,
            reply,
        })
        .await
    }

    /// Apply one workflow event.
    pub async fn dispatch(&self, event: Event) -> Result<()> {
        self.request(|reply| Message::Event { event, reply }).await
    }

    /// Run a closure against the workflow on the actor.
    pub async fn inspect<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Workflow) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Inspect = Box::new(move |workflow| {
            let _ = reply.send(f(workflow));
        });
        self.tx
            .send(Message::Inspect(job))
            .map_err(|_| WorkflowError::SessionClosed)?;
        Ok(rx.await.map_err(|_| WorkflowError::SessionClosed)?)
    }

    /// Latest published state.
    pub fn state(&self) -> WorkflowState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_rx.clone()
    }

    /// Wait until no extraction is in flight.
    pub async fn wait_until_idle(&self) -> Result<WorkflowState> {
        let mut rx = self.state_rx.clone();
        let state = rx
            .wait_for(|state| !state.is_processing)
            .await
            .map_err(|_| WorkflowError::SessionClosed)?;
        Ok(state.clone())
    }

    /// Stop accepting messages and wait for the actor to finish.
    ///
    /// An extraction still in flight is completed first. Returns the final
    /// workflow.
    pub async fn shutdown(self) -> Result<Workflow> {
        drop(self.tx);
        let workflow = self
            .handle
            .await
            .map_err(|_| WorkflowError::SessionClosed)?;
        Ok(workflow)
    }
}

/// Actor loop.
async fn run(
    mut workflow: Workflow,
    extractor: Arc<dyn InvoiceExtractor + Send + Sync>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    state_tx: watch::Sender<WorkflowState>,
) -> Workflow {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let mut in_flight = 0usize;

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else {
                    if in_flight == 0 {
                        break;
                    }
                    // Handles are gone; finish the extraction before exiting.
                    if let Some((ticket, result)) = done_rx.recv().await {
                        complete(&mut workflow, ticket, result);
                        publish(&state_tx, &workflow);
                    }
                    break;
                };

                let command = match message {
                    Message::Upload { files, channel, reply } => {
                        let result = workflow.upload(files, channel);
                        publish(&state_tx, &workflow);
                        respond(result, reply)
                    }
                    Message::Event { event, reply } => {
                        let result = workflow.update(event).map_err(Into::into);
                        publish(&state_tx, &workflow);
                        respond(result, reply)
                    }
                    Message::Inspect(job) => {
                        job(&mut workflow);
                        publish(&state_tx, &workflow);
                        Command::None
                    }
                };

                if let Command::Extract { ticket, file } = command {
                    in_flight += 1;
                    let extractor = extractor.clone();
                    let done_tx = done_tx.clone();
                    tokio::spawn(async move {
                        let result = extract_invoice(extractor.as_ref(), &file).await;
                        let _ = done_tx.send((ticket, result));
                    });
                }
            }
            Some((ticket, result)) = done_rx.recv() => {
                in_flight -= 1;
                trace!("Extraction task finished");
                complete(&mut workflow, ticket, result);
                publish(&state_tx, &workflow);
            }
        }
    }

    debug!("Session actor stopped");
    workflow
}

fn complete(
    workflow: &mut Workflow,
    ticket: ExtractionTicket,
    result: std::result::Result<InvoiceRecord, ExtractionError>,
) {
    if let Err(e) = workflow.update(Event::ExtractionFinished { ticket, result }) {
        debug!("Dropped extraction result: {}", e);
    }
}

/// Publish the workflow state if it changed.
fn publish(state_tx: &watch::Sender<WorkflowState>, workflow: &Workflow) {
    state_tx.send_if_modified(|published| {
        if *published != *workflow.state() {
            *published = workflow.state().clone();
            true
        } else {
            false
        }
    });
}

fn respond(result: Result<Command>, reply: oneshot::Sender<Result<()>>) -> Command {
    match result {
        Ok(command) => {
            let _ = reply.send(Ok(()));
            command
        }
        Err(e) => {
            let _ = reply.send(Err(e));
            Command::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmartFillError;
    use crate::extract::MockExtractor;
    use crate::workflow::Step;
    use std::time::Duration;
    use tokio::time::Instant;

    fn file(bytes: &[u8]) -> UploadedFile {
        UploadedFile::new("invoice.jpg", "image/jpeg", bytes.to_vec())
    }

    struct OfflineExtractor;

    impl InvoiceExtractor for OfflineExtractor {
        fn extract(&self, _file: &UploadedFile) -> crate::extract::Result<InvoiceRecord> {
            Err(ExtractionError::Unavailable("service offline".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_then_review() {
        let session = Session::spawn(Workflow::default(), MockExtractor::default());
        assert_eq!(session.state().current_step, Step::Upload);

        let start = Instant::now();
        session
            .upload(vec![file(b"anything")], UploadChannel::Picker)
            .await
            .unwrap();
        assert!(session.state().is_processing);

        let state = session.wait_until_idle().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert_eq!(state.current_step, Step::Review);
        assert_eq!(
            state.extracted_data.as_ref().and_then(|d| d.total.as_deref()),
            Some("$1,246.50")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_upload_rejected_while_processing() {
        let session = Session::spawn(Workflow::default(), MockExtractor::default());
        session
            .upload(vec![file(b"one")], UploadChannel::Drop)
            .await
            .unwrap();

        let second = session.upload(vec![file(b"two")], UploadChannel::Drop).await;
        assert!(matches!(second, Err(SmartFillError::Upload(_))));

        session.wait_until_idle().await.unwrap();
        let saved = session.inspect(|wf| wf.saved_forms().len()).await.unwrap();
        assert_eq!(saved, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_detailed() {
        let session = Session::spawn(Workflow::default(), MockExtractor::default());
        session
            .upload(vec![file(b"x")], UploadChannel::Capture)
            .await
            .unwrap();
        session.wait_until_idle().await.unwrap();

        session
            .dispatch(Event::SelectTemplate("detailed".into()))
            .await
            .unwrap();
        let (fields, rows) = session
            .inspect(|wf| {
                let form = wf.form().expect("form");
                (form.fields().len(), form.line_items().map(|i| i.len()))
            })
            .await
            .unwrap();
        assert_eq!(fields, 8);
        assert_eq!(rows, Some(2));

        session.dispatch(Event::Save).await.unwrap();
        let workflow = session.shutdown().await.unwrap();
        assert_eq!(workflow.saved_forms().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_finishes_in_flight_extraction() {
        let session = Session::spawn(Workflow::default(), MockExtractor::default());
        session
            .upload(vec![file(b"x")], UploadChannel::Drop)
            .await
            .unwrap();

        let workflow = session.shutdown().await.unwrap();
        assert!(!workflow.state().is_processing);
        assert_eq!(workflow.state().current_step, Step::Review);
        assert_eq!(
            workflow
                .state()
                .extracted_data
                .as_ref()
                .and_then(|d| d.invoice_number.as_deref()),
            Some("INV-2023-0042")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_extraction_is_non_fatal() {
        let session = Session::spawn(Workflow::default(), OfflineExtractor);
        session
            .upload(vec![file(b"x")], UploadChannel::Picker)
            .await
            .unwrap();

        let state = session.wait_until_idle().await.unwrap();
        assert_eq!(state.current_step, Step::Upload);
        assert!(state.extracted_data.is_none());

        let notes = session.inspect(|wf| wf.take_notifications()).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Extraction Failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_step_error_comes_back() {
        let session = Session::spawn(Workflow::default(), MockExtractor::default());
        let err = session.dispatch(Event::SelectStep(Step::Review)).await;
        assert!(matches!(
            err,
            Err(SmartFillError::Workflow(WorkflowError::StepLocked(Step::Review)))
        ));
    }
}

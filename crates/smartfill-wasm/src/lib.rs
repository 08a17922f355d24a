//! WASM bindings for invoice smart fill.
//!
//! This crate drives a smart fill session from a browser page. The session
//! lives on the JS thread; uploads return a `Promise` that resolves with the
//! new state once the simulated extraction delay has passed.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};

use smartfill_core::models::invoice::LineItemColumn;
use smartfill_core::models::template::TemplateSelectorView;
use smartfill_core::workflow::Command;
use smartfill_core::{
    Confidence, Event, InvoiceExtractor, MockExtractor, SmartFillConfig, Step, UploadChannel,
    UploadedFile, Workflow,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Turn a camelCase field key into a form label.
#[wasm_bindgen]
pub fn format_field_label(key: &str) -> String {
    smartfill_core::format_field_label(key)
}

/// Confidence tier of a field key: "high", "medium" or "low".
#[wasm_bindgen]
pub fn classify_confidence(key: &str) -> String {
    Confidence::classify(key).as_str().to_string()
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js)
}

/// Resolve after `duration` using `setTimeout`.
async fn sleep(duration: Duration) -> Result<(), JsValue> {
    if duration.is_zero() {
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);

    let promise = Promise::new(&mut |resolve, reject| {
        if let Err(e) =
            window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
        {
            let _ = reject.call1(&JsValue::NULL, &e);
        }
    });
    JsFuture::from(promise).await?;
    Ok(())
}

/// A smart fill session for browser use.
#[wasm_bindgen]
pub struct SmartFillSession {
    workflow: Rc<RefCell<Workflow>>,
    extractor: Rc<MockExtractor>,
}

#[wasm_bindgen]
impl SmartFillSession {
    /// Create a session. `config` is an optional configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SmartFillSession, JsValue> {
        let config: SmartFillConfig = if config.is_undefined() || config.is_null() {
            SmartFillConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js)?
        };

        Ok(Self {
            extractor: Rc::new(MockExtractor::from_config(&config.extraction)),
            workflow: Rc::new(RefCell::new(Workflow::new(config))),
        })
    }

    fn apply(&self, event: Event) -> Result<(), JsValue> {
        self.workflow.borrow_mut().update(event).map_err(to_js)?;
        Ok(())
    }

    /// Hand one file to the session.
    ///
    /// `channel` is "drop", "picker" or "capture". An empty `mime_type` is
    /// sniffed from the bytes. Resolves with the state once extraction is
    /// done.
    #[wasm_bindgen]
    pub fn upload(
        &self,
        name: String,
        mime_type: String,
        bytes: Vec<u8>,
        channel: &str,
    ) -> Result<Promise, JsValue> {
        let channel: UploadChannel = channel.parse().map_err(to_js)?;
        let file = UploadedFile::new(name, mime_type, bytes);

        let command = self
            .workflow
            .borrow_mut()
            .upload(vec![file], channel)
            .map_err(to_js)?;

        let Command::Extract { ticket, file } = command else {
            let state = to_value(self.workflow.borrow().state())?;
            return Ok(Promise::resolve(&state));
        };

        let workflow = self.workflow.clone();
        let extractor = self.extractor.clone();
        Ok(future_to_promise(async move {
            let result = match sleep(extractor.latency()).await {
                Ok(()) => extractor.extract(&file),
                Err(e) => Err(smartfill_core::ExtractionError::Unavailable(format!(
                    "{:?}",
                    e
                ))),
            };
            workflow
                .borrow_mut()
                .update(Event::ExtractionFinished { ticket, result })
                .map_err(to_js)?;
            let state = to_value(workflow.borrow().state())?;
            Ok(state)
        }))
    }

    /// Whether an extraction is running.
    #[wasm_bindgen]
    pub fn is_processing(&self) -> bool {
        self.workflow.borrow().state().is_processing
    }

    /// Switch tabs. Locked tabs are rejected.
    #[wasm_bindgen]
    pub fn select_tab(&self, step: &str) -> Result<(), JsValue> {
        let step: Step = step.parse().map_err(to_js)?;
        self.apply(Event::SelectStep(step))
    }

    /// "Continue to Template" on the review step.
    #[wasm_bindgen]
    pub fn continue_to_template(&self) -> Result<(), JsValue> {
        self.apply(Event::ContinueToTemplate)
    }

    #[wasm_bindgen]
    pub fn select_template(&self, id: String) -> Result<(), JsValue> {
        self.apply(Event::SelectTemplate(id))
    }

    #[wasm_bindgen]
    pub fn set_auto_mapping(&self, enabled: bool) -> Result<(), JsValue> {
        self.apply(Event::SetAutoMapping(enabled))
    }

    #[wasm_bindgen]
    pub fn edit_field(&self, key: String, value: String) -> Result<(), JsValue> {
        self.apply(Event::EditField { key, value })
    }

    /// Edit one line-item cell. `column` is the camelCase column key.
    #[wasm_bindgen]
    pub fn edit_line_item(&self, index: usize, column: &str, value: String) -> Result<(), JsValue> {
        let column = LineItemColumn::from_key(column)
            .ok_or_else(|| JsValue::from_str(&format!("unknown line item column: {}", column)))?;
        self.apply(Event::EditLineItem {
            index,
            column,
            value,
        })
    }

    #[wasm_bindgen]
    pub fn add_line_item(&self) -> Result<(), JsValue> {
        self.apply(Event::AddLineItem)
    }

    /// Save the form. Returns the saved snapshot.
    #[wasm_bindgen]
    pub fn save(&self) -> Result<JsValue, JsValue> {
        self.apply(Event::Save)?;
        let workflow = self.workflow.borrow();
        to_value(&workflow.saved_forms().last())
    }

    #[wasm_bindgen]
    pub fn start_over(&self) -> Result<(), JsValue> {
        self.apply(Event::StartOver)
    }

    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_value(self.workflow.borrow().state())
    }

    #[wasm_bindgen]
    pub fn tabs(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow().tabs())
    }

    /// Review step content, `null` when nothing was extracted.
    #[wasm_bindgen]
    pub fn preview(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow().preview())
    }

    /// Template step content: a placeholder or the mapping form.
    #[wasm_bindgen]
    pub fn template_pane(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow().template_pane())
    }

    #[wasm_bindgen]
    pub fn form(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow().form())
    }

    #[wasm_bindgen]
    pub fn upload_view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow().upload_surface().view())
    }

    #[wasm_bindgen]
    pub fn templates(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow().template_selector())
    }

    /// Notifications not yet shown. They are removed from the session.
    #[wasm_bindgen]
    pub fn take_notifications(&self) -> Result<JsValue, JsValue> {
        to_value(&self.workflow.borrow_mut().take_notifications())
    }

    #[wasm_bindgen]
    pub fn saved_forms(&self) -> Result<JsValue, JsValue> {
        to_value(self.workflow.borrow().saved_forms())
    }
}

/// The template catalog without a session.
#[wasm_bindgen]
pub fn template_catalog() -> Result<JsValue, JsValue> {
    to_value(&TemplateSelectorView::new(None))
}

//! Upload surface: drop target, file picker and camera capture.

use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::UploadedFile;
use crate::error::UploadError;

/// Advisory format hint shown under the drop target.
pub const SUPPORTED_FORMATS_HINT: &str = "Supported formats: JPG, PNG, PDF (max 10MB)";

/// How a file reached the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadChannel {
    /// Drag and drop onto the target.
    Drop,
    /// Regular file picker.
    Picker,
    /// File picker asking for the rear camera.
    Capture,
}

impl UploadChannel {
    /// `accept` attribute requested from the picker.
    pub fn accept(&self) -> &'static str {
        match self {
            UploadChannel::Drop | UploadChannel::Picker => "image/*,application/pdf",
            UploadChannel::Capture => "image/*",
        }
    }

    /// `capture` attribute requested from the picker, if any.
    pub fn capture(&self) -> Option<&'static str> {
        match self {
            UploadChannel::Capture => Some("environment"),
            UploadChannel::Drop | UploadChannel::Picker => None,
        }
    }
}

impl FromStr for UploadChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(UploadChannel::Drop),
            "picker" => Ok(UploadChannel::Picker),
            "capture" => Ok(UploadChannel::Capture),
            other => Err(format!("unknown upload channel: {}", other)),
        }
    }
}

/// What the upload surface shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadView {
    /// Idle: drop target plus the capture button.
    DropTarget {
        title: &'static str,
        instructions: &'static str,
        hint: &'static str,
        /// `accept` of the regular picker.
        accept: &'static str,
        capture_label: &'static str,
        /// `accept` of the camera picker.
        capture_accept: &'static str,
        /// `capture` of the camera picker.
        capture: Option<&'static str>,
    },
    /// An extraction is running. No drop target and no capture button.
    Processing {
        title: &'static str,
        message: &'static str,
    },
}

/// Gatekeeper between the upload channels and the workflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadSurface {
    is_processing: bool,
}

impl UploadSurface {
    /// Surface for the given processing flag.
    pub fn new(is_processing: bool) -> Self {
        Self { is_processing }
    }

    /// Whether new files are accepted.
    pub fn accepts_uploads(&self) -> bool {
        !self.is_processing
    }

    /// Pick the file to hand upward from one channel event.
    ///
    /// Only the first file is used. Nothing is accepted while processing.
    pub fn select(
        &self,
        files: impl IntoIterator<Item = UploadedFile>,
        channel: UploadChannel,
    ) -> Result<UploadedFile, UploadError> {
        if self.is_processing {
            return Err(UploadError::Busy);
        }

        let file = files.into_iter().next().ok_or(UploadError::NoFile)?;
        debug!("Accepted {} ({}) via {:?}", file.name, file.mime_type, channel);
        Ok(file)
    }

    /// Current view.
    pub fn view(&self) -> UploadView {
        if self.is_processing {
            UploadView::Processing {
                title: "Processing your invoice",
                message: "Extracting all the important information...",
            }
        } else {
            UploadView::DropTarget {
                title: "Upload an invoice",
                instructions: "Drag and drop a file here, or click to select a file",
                hint: SUPPORTED_FORMATS_HINT,
                accept: UploadChannel::Picker.accept(),
                capture_label: "Take a photo",
                capture_accept: UploadChannel::Capture.accept(),
                capture: UploadChannel::Capture.capture(),
            }
        }
    }
}

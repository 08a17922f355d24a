//! Invoice data extraction.
//!
//! [`InvoiceExtractor`] is the boundary a real OCR service would sit
//! behind. The bundled [`MockExtractor`] ignores its input and returns a
//! fixed record after a fixed delay.

mod mock;

pub use mock::{MockExtractor, sample_invoice};

use std::time::Duration;

use crate::error::ExtractionError;
use crate::models::invoice::InvoiceRecord;
use crate::upload::UploadedFile;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice extraction backends.
///
/// Implementations are synchronous. Drivers wait [`InvoiceExtractor::latency`]
/// on their own timer before calling [`InvoiceExtractor::extract`], so the
/// same extractor runs under tokio and in the browser.
pub trait InvoiceExtractor {
    /// Turn an uploaded file into invoice data.
    fn extract(&self, file: &UploadedFile) -> Result<InvoiceRecord>;

    /// How long a call is expected to take.
    fn latency(&self) -> Duration {
        Duration::ZERO
    }
}

impl<E: InvoiceExtractor + ?Sized> InvoiceExtractor for std::sync::Arc<E> {
    fn extract(&self, file: &UploadedFile) -> Result<InvoiceRecord> {
        (**self).extract(file)
    }

    fn latency(&self) -> Duration {
        (**self).latency()
    }
}

/// Run an extractor asynchronously, waiting out its latency first.
#[cfg(feature = "native")]
pub async fn extract_invoice<E>(extractor: &E, file: &UploadedFile) -> Result<InvoiceRecord>
where
    E: InvoiceExtractor + ?Sized,
{
    let latency = extractor.latency();
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    extractor.extract(file)
}

//! Fixed-response extractor.

use std::time::Duration;

use tracing::debug;

use super::{InvoiceExtractor, Result};
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{InvoiceRecord, LineItem};
use crate::upload::UploadedFile;

/// Extractor that always succeeds with [`sample_invoice`].
#[derive(Debug, Clone)]
pub struct MockExtractor {
    delay: Duration,
}

impl MockExtractor {
    /// Create a mock with the given simulated latency.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Create a mock from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.delay())
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl InvoiceExtractor for MockExtractor {
    fn extract(&self, file: &UploadedFile) -> Result<InvoiceRecord> {
        debug!(
            "Mock extraction for {} ({} bytes), content ignored",
            file.name,
            file.size()
        );
        Ok(sample_invoice())
    }

    fn latency(&self) -> Duration {
        self.delay
    }
}

/// The record every mock extraction returns.
pub fn sample_invoice() -> InvoiceRecord {
    InvoiceRecord {
        invoice_number: Some("INV-2023-0042".to_string()),
        date: Some("2023-04-10".to_string()),
        due_date: Some("2023-05-10".to_string()),
        vendor_name: Some("Acme Supplies Ltd.".to_string()),
        total: Some("$1,246.50".to_string()),
        subtotal: Some("$1,125.00".to_string()),
        tax: Some("$121.50".to_string()),
        line_items: Some(vec![
            LineItem::new("Office Supplies", "5", "$45.00", "$225.00"),
            LineItem::new("Software License", "1", "$900.00", "$900.00"),
        ]),
        custom: Default::default(),
    }
}

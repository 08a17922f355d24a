//! Read-only review of extracted data with confidence tiers.

use std::fmt;

use serde::Serialize;

use super::label::format_preview_label;
use crate::models::invoice::{InvoiceRecord, LineItem};

/// Shown when there is no record to review.
pub const NO_DATA_MESSAGE: &str = "No data available";

const HIGH_CONFIDENCE: &[&str] = &["invoiceNumber", "total", "vendorName"];
const MEDIUM_CONFIDENCE: &[&str] = &["date", "subtotal"];

/// How much a field's extracted value is assumed to be trusted.
///
/// A fixed lookup by key, not a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Classify a record key.
    pub fn classify(field: &str) -> Self {
        if HIGH_CONFIDENCE.contains(&field) {
            Confidence::High
        } else if MEDIUM_CONFIDENCE.contains(&field) {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Low-confidence values are flagged for manual review.
    pub fn needs_review(&self) -> bool {
        matches!(self, Confidence::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reviewed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub key: String,
    pub label: String,
    pub value: String,
    pub confidence: Confidence,
}

/// Review of an extracted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePreview {
    /// Every present text field, `lineItems` excluded.
    pub rows: Vec<PreviewRow>,
    /// The line-item table, `None` when absent or empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,
}

impl InvoicePreview {
    /// Build the preview for a record.
    pub fn new(record: &InvoiceRecord) -> Self {
        let rows = record
            .entries()
            .map(|(key, value)| PreviewRow {
                key: key.to_string(),
                label: format_preview_label(key),
                value: value.to_string(),
                confidence: Confidence::classify(key),
            })
            .collect();

        let line_items = record
            .line_items
            .as_ref()
            .filter(|items| !items.is_empty())
            .cloned();

        Self { rows, line_items }
    }

    /// Rows flagged for review.
    pub fn flagged(&self) -> impl Iterator<Item = &PreviewRow> {
        self.rows.iter().filter(|row| row.confidence.needs_review())
    }
}

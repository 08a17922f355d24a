//! Invoice data as produced by extraction and consumed by the review and
//! mapping steps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Record key holding the line-item table.
pub const LINE_ITEMS_KEY: &str = "lineItems";

/// Structured invoice data.
///
/// Every value is kept as the string the extractor produced. Nothing here
/// parses or checks amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    /// Invoice number/identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Issue date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Payment due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    /// Vendor (issuer) name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,

    /// Grand total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,

    /// Total before tax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<String>,

    /// Tax amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<String>,

    /// Line items on the invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,

    /// Values for keys outside the fixed schema, in key order.
    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

/// The fixed text fields of an [`InvoiceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceField {
    InvoiceNumber,
    Date,
    DueDate,
    VendorName,
    Total,
    Subtotal,
    Tax,
}

impl InvoiceField {
    /// All fixed fields in display order.
    pub const ALL: [InvoiceField; 7] = [
        InvoiceField::InvoiceNumber,
        InvoiceField::Date,
        InvoiceField::DueDate,
        InvoiceField::VendorName,
        InvoiceField::Total,
        InvoiceField::Subtotal,
        InvoiceField::Tax,
    ];

    /// The camelCase record key.
    pub fn key(&self) -> &'static str {
        match self {
            InvoiceField::InvoiceNumber => "invoiceNumber",
            InvoiceField::Date => "date",
            InvoiceField::DueDate => "dueDate",
            InvoiceField::VendorName => "vendorName",
            InvoiceField::Total => "total",
            InvoiceField::Subtotal => "subtotal",
            InvoiceField::Tax => "tax",
        }
    }

    /// Look up a fixed field by its record key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

impl fmt::Display for InvoiceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl InvoiceRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: InvoiceField) -> &Option<String> {
        match field {
            InvoiceField::InvoiceNumber => &self.invoice_number,
            InvoiceField::Date => &self.date,
            InvoiceField::DueDate => &self.due_date,
            InvoiceField::VendorName => &self.vendor_name,
            InvoiceField::Total => &self.total,
            InvoiceField::Subtotal => &self.subtotal,
            InvoiceField::Tax => &self.tax,
        }
    }

    fn slot_mut(&mut self, field: InvoiceField) -> &mut Option<String> {
        match field {
            InvoiceField::InvoiceNumber => &mut self.invoice_number,
            InvoiceField::Date => &mut self.date,
            InvoiceField::DueDate => &mut self.due_date,
            InvoiceField::VendorName => &mut self.vendor_name,
            InvoiceField::Total => &mut self.total,
            InvoiceField::Subtotal => &mut self.subtotal,
            InvoiceField::Tax => &mut self.tax,
        }
    }

    /// Get a text value by record key.
    ///
    /// Returns `None` for absent keys and for `lineItems`, which is not text.
    pub fn get(&self, key: &str) -> Option<&str> {
        match InvoiceField::from_key(key) {
            Some(field) => self.slot(field).as_deref(),
            None => self.custom.get(key).map(String::as_str),
        }
    }

    /// Set a text value by record key. Unknown keys go to `custom`.
    ///
    /// `lineItems` is ignored; use [`InvoiceRecord::line_items`] instead.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if key == LINE_ITEMS_KEY {
            return;
        }
        match InvoiceField::from_key(key) {
            Some(field) => *self.slot_mut(field) = Some(value.into()),
            None => {
                self.custom.insert(key.to_string(), value.into());
            }
        }
    }

    /// Whether the record carries a value under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        if key == LINE_ITEMS_KEY {
            return self.line_items.is_some();
        }
        self.get(key).is_some()
    }

    /// Present text fields as `(key, value)`, fixed fields first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        InvoiceField::ALL
            .iter()
            .filter_map(|field| self.slot(*field).as_deref().map(|v| (field.key(), v)))
            .chain(self.custom.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Line items, empty when absent.
    pub fn line_items(&self) -> &[LineItem] {
        self.line_items.as_deref().unwrap_or_default()
    }
}

/// A single line item. All columns are free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product/service description.
    #[serde(default)]
    pub description: String,

    /// Quantity as written.
    #[serde(default)]
    pub quantity: String,

    /// Unit price as written.
    #[serde(default)]
    pub unit_price: String,

    /// Line total as written.
    #[serde(default)]
    pub amount: String,
}

/// A column of the line-item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineItemColumn {
    Description,
    Quantity,
    UnitPrice,
    Amount,
}

impl LineItemColumn {
    /// Columns in table order.
    pub const ALL: [LineItemColumn; 4] = [
        LineItemColumn::Description,
        LineItemColumn::Quantity,
        LineItemColumn::UnitPrice,
        LineItemColumn::Amount,
    ];

    /// Column header.
    pub fn header(&self) -> &'static str {
        match self {
            LineItemColumn::Description => "Description",
            LineItemColumn::Quantity => "Quantity",
            LineItemColumn::UnitPrice => "Unit Price",
            LineItemColumn::Amount => "Amount",
        }
    }

    /// camelCase key, as serialized.
    pub fn key(&self) -> &'static str {
        match self {
            LineItemColumn::Description => "description",
            LineItemColumn::Quantity => "quantity",
            LineItemColumn::UnitPrice => "unitPrice",
            LineItemColumn::Amount => "amount",
        }
    }

    /// Parse a column from its camelCase key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "description" => Some(LineItemColumn::Description),
            "quantity" => Some(LineItemColumn::Quantity),
            "unitPrice" => Some(LineItemColumn::UnitPrice),
            "amount" => Some(LineItemColumn::Amount),
            _ => None,
        }
    }
}

impl LineItem {
    /// Create a line item from its four columns.
    pub fn new(
        description: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
            amount: amount.into(),
        }
    }

    /// Read one column.
    pub fn get(&self, column: LineItemColumn) -> &str {
        match column {
            LineItemColumn::Description => &self.description,
            LineItemColumn::Quantity => &self.quantity,
            LineItemColumn::UnitPrice => &self.unit_price,
            LineItemColumn::Amount => &self.amount,
        }
    }

    /// Overwrite one column.
    pub fn set(&mut self, column: LineItemColumn, value: impl Into<String>) {
        let slot = match column {
            LineItemColumn::Description => &mut self.description,
            LineItemColumn::Quantity => &mut self.quantity,
            LineItemColumn::UnitPrice => &mut self.unit_price,
            LineItemColumn::Amount => &mut self.amount,
        };
        *slot = value.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_and_set_by_key() {
        let mut record = InvoiceRecord::new();
        record.set("invoiceNumber", "INV-1");
        record.set("poNumber", "PO-7");

        assert_eq!(record.get("invoiceNumber"), Some("INV-1"));
        assert_eq!(record.invoice_number.as_deref(), Some("INV-1"));
        assert_eq!(record.get("poNumber"), Some("PO-7"));
        assert_eq!(record.get("tax"), None);
        assert!(!record.contains_key(LINE_ITEMS_KEY));
    }

    #[test]
    fn test_entries_keep_fixed_order_then_custom() {
        let mut record = InvoiceRecord::new();
        record.set("tax", "1");
        record.set("zeta", "z");
        record.set("invoiceNumber", "2");
        record.set("alpha", "a");

        let keys: Vec<&str> = record.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["invoiceNumber", "tax", "alpha", "zeta"]);
    }

    #[test]
    fn test_json_uses_camel_case_and_flattens_custom() {
        let json = r#"{
            "invoiceNumber": "A-1",
            "dueDate": "2024-01-31",
            "lineItems": [{"description": "Pens", "unitPrice": "$2.00"}],
            "poNumber": "PO-9"
        }"#;
        let record: InvoiceRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.due_date.as_deref(), Some("2024-01-31"));
        assert_eq!(record.custom.get("poNumber").map(String::as_str), Some("PO-9"));
        assert_eq!(record.line_items()[0].unit_price, "$2.00");
        assert_eq!(record.line_items()[0].quantity, "");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["poNumber"], "PO-9");
        assert!(back.get("vendorName").is_none());
    }

    #[test]
    fn test_line_item_columns() {
        let mut item = LineItem::default();
        item.set(LineItemColumn::UnitPrice, "$3.50");
        assert_eq!(item.get(LineItemColumn::UnitPrice), "$3.50");
        assert_eq!(LineItemColumn::from_key("unitPrice"), Some(LineItemColumn::UnitPrice));
        assert_eq!(LineItemColumn::UnitPrice.header(), "Unit Price");
        for column in LineItemColumn::ALL {
            assert_eq!(LineItemColumn::from_key(column.key()), Some(column));
        }
    }
}

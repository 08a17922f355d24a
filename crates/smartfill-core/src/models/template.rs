//! The static template catalog.

use serde::Serialize;

use super::invoice::LINE_ITEMS_KEY;

/// Id of the template that enables the line-item table.
pub const DETAILED_TEMPLATE_ID: &str = "detailed";

/// A named, ordered set of field keys a filled form should contain.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Field keys in form order.
    pub fields: &'static [&'static str],
}

/// Standard invoice: header fields and totals.
pub static STANDARD: Template = Template {
    id: "standard",
    name: "Standard Invoice",
    fields: &["invoiceNumber", "date", "vendorName", "total", "subtotal", "tax"],
};

/// Detailed invoice: standard fields plus due date and line items.
pub static DETAILED: Template = Template {
    id: DETAILED_TEMPLATE_ID,
    name: "Detailed Invoice",
    fields: &[
        "invoiceNumber",
        "date",
        "dueDate",
        "vendorName",
        "total",
        "subtotal",
        "tax",
        LINE_ITEMS_KEY,
    ],
};

static CATALOG: [&Template; 2] = [&STANDARD, &DETAILED];

impl Template {
    /// Whether this template shows the line-item table.
    pub fn has_line_items(&self) -> bool {
        self.id == DETAILED_TEMPLATE_ID
    }

    /// Number of fields, as the selector displays it.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether `key` is one of this template's fields.
    pub fn contains_field(&self, key: &str) -> bool {
        self.fields.contains(&key)
    }
}

/// All predefined templates in selector order.
pub fn templates() -> &'static [&'static Template] {
    &CATALOG
}

/// Look up a predefined template by id.
pub fn find_template(id: &str) -> Option<&'static Template> {
    CATALOG.iter().copied().find(|t| t.id == id)
}

/// One row of the template selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateOption {
    pub id: &'static str,
    pub name: &'static str,
    /// "N fields" caption.
    pub caption: String,
    pub selected: bool,
}

/// What the template selector shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSelectorView {
    pub options: Vec<TemplateOption>,
    /// Label of the "create custom template" card. It has no action.
    pub create_custom_label: &'static str,
}

impl TemplateSelectorView {
    /// Build the selector for the current selection.
    pub fn new(selected: Option<&Template>) -> Self {
        let options = templates()
            .iter()
            .map(|t| TemplateOption {
                id: t.id,
                name: t.name,
                caption: format!("{} fields", t.field_count()),
                selected: selected.is_some_and(|s| s.id == t.id),
            })
            .collect();

        Self {
            options,
            create_custom_label: "+ Create custom template",
        }
    }
}

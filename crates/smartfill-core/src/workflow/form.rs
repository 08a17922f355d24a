//! Field mapping form: extracted data laid onto a template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::label::format_field_label;
use crate::error::WorkflowError;
use crate::models::invoice::{InvoiceRecord, LINE_ITEMS_KEY, LineItem, LineItemColumn};
use crate::models::template::Template;

/// Value held by one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Single-line text input.
    Text(String),
    /// The line-item table.
    Table(Vec<LineItem>),
}

impl FieldValue {
    fn blank(key: &str) -> Self {
        if key == LINE_ITEMS_KEY {
            FieldValue::Table(Vec::new())
        } else {
            FieldValue::Text(String::new())
        }
    }

    fn seeded(key: &str, record: &InvoiceRecord) -> Self {
        if key == LINE_ITEMS_KEY {
            FieldValue::Table(record.line_items().to_vec())
        } else {
            FieldValue::Text(record.get(key).unwrap_or_default().to_string())
        }
    }

    /// Text content, `None` for the table.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            FieldValue::Table(_) => None,
        }
    }
}

/// One editable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub key: &'static str,
    pub label: String,
    pub value: FieldValue,
}

impl FormField {
    fn new(key: &'static str, value: FieldValue) -> Self {
        Self {
            key,
            label: format_field_label(key),
            value,
        }
    }
}

/// Editable form for one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMappingForm {
    template: &'static Template,
    auto_mapping: bool,
    fields: Vec<FormField>,
}

impl FieldMappingForm {
    /// Build a form, seeding it from `extracted` when auto-mapping is on.
    pub fn new(
        template: &'static Template,
        extracted: Option<&InvoiceRecord>,
        auto_mapping: bool,
    ) -> Self {
        let fields = template
            .fields
            .iter()
            .copied()
            .map(|key| FormField::new(key, FieldValue::blank(key)))
            .collect();

        let mut form = Self {
            template,
            auto_mapping,
            fields,
        };
        form.reseed(extracted);
        form
    }

    /// Overwrite every field from `extracted`.
    ///
    /// Does nothing unless auto-mapping is on and there is data. Returns
    /// whether the form was seeded.
    pub fn reseed(&mut self, extracted: Option<&InvoiceRecord>) -> bool {
        let Some(record) = extracted else {
            return false;
        };
        if !self.auto_mapping {
            return false;
        }

        for field in &mut self.fields {
            field.value = FieldValue::seeded(field.key, record);
        }
        debug!(
            "Seeded {} fields of template {}",
            self.fields.len(),
            self.template.id
        );
        true
    }

    /// Switch to another template.
    ///
    /// Re-seeds when auto-mapping is on. Otherwise values of keys shared
    /// with the previous template are kept and the rest start empty.
    pub fn set_template(&mut self, template: &'static Template, extracted: Option<&InvoiceRecord>) {
        if std::ptr::eq(self.template, template) {
            return;
        }

        let previous = std::mem::take(&mut self.fields);
        self.fields = template
            .fields
            .iter()
            .copied()
            .map(|key| {
                let value = previous
                    .iter()
                    .find(|old| old.key == key)
                    .map(|old| old.value.clone())
                    .unwrap_or_else(|| FieldValue::blank(key));
                FormField::new(key, value)
            })
            .collect();
        self.template = template;
        self.reseed(extracted);
    }

    /// Turn auto-mapping on or off.
    ///
    /// Turning it off keeps current values. Turning it back on re-seeds.
    pub fn set_auto_mapping(&mut self, enabled: bool, extracted: Option<&InvoiceRecord>) {
        let was_enabled = self.auto_mapping;
        self.auto_mapping = enabled;
        if enabled && !was_enabled {
            self.reseed(extracted);
        }
    }

    pub fn template(&self) -> &'static Template {
        self.template
    }

    pub fn auto_mapping(&self) -> bool {
        self.auto_mapping
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Current text of a field, empty for unknown keys.
    pub fn text(&self, key: &str) -> &str {
        self.field(key)
            .and_then(|f| f.value.as_text())
            .unwrap_or_default()
    }

    /// Edit a text field.
    pub fn set_text(&mut self, key: &str, value: impl Into<String>) -> Result<(), WorkflowError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| WorkflowError::UnknownField(key.to_string()))?;

        match &mut field.value {
            FieldValue::Text(text) => {
                *text = value.into();
                Ok(())
            }
            FieldValue::Table(_) => Err(WorkflowError::NotTextField(key.to_string())),
        }
    }

    /// The line-item table, `None` unless the template enables it.
    pub fn line_items(&self) -> Option<&[LineItem]> {
        if !self.template.has_line_items() {
            return None;
        }
        self.fields.iter().find_map(|f| match &f.value {
            FieldValue::Table(items) => Some(items.as_slice()),
            FieldValue::Text(_) => None,
        })
    }

    fn table_mut(&mut self) -> Result<&mut Vec<LineItem>, WorkflowError> {
        let template_id = self.template.id;
        if !self.template.has_line_items() {
            return Err(WorkflowError::LineItemsDisabled(template_id.to_string()));
        }
        self.fields
            .iter_mut()
            .find_map(|f| match &mut f.value {
                FieldValue::Table(items) => Some(items),
                FieldValue::Text(_) => None,
            })
            .ok_or_else(|| WorkflowError::LineItemsDisabled(template_id.to_string()))
    }

    /// Append an empty row to the line-item table. Returns its index.
    pub fn add_line_item(&mut self) -> Result<usize, WorkflowError> {
        let items = self.table_mut()?;
        items.push(LineItem::default());
        Ok(items.len() - 1)
    }

    /// Edit one cell of the line-item table.
    pub fn set_line_item(
        &mut self,
        index: usize,
        column: LineItemColumn,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let items = self.table_mut()?;
        let len = items.len();
        let item = items
            .get_mut(index)
            .ok_or(WorkflowError::LineItemOutOfRange { index, len })?;
        item.set(column, value);
        Ok(())
    }

    /// Snapshot the form as saved. No validation is applied.
    pub fn to_filled(&self) -> FilledForm {
        let values = self
            .fields
            .iter()
            .filter_map(|f| {
                f.value.as_text().map(|text| FilledField {
                    key: f.key.to_string(),
                    label: f.label.clone(),
                    value: text.to_string(),
                })
            })
            .collect();

        FilledForm {
            template_id: self.template.id.to_string(),
            template_name: self.template.name.to_string(),
            values,
            line_items: self.line_items().map(<[LineItem]>::to_vec).unwrap_or_default(),
            saved_at: Utc::now(),
        }
    }
}

/// One text value of a saved form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledField {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// A saved form, kept for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledForm {
    pub template_id: String,
    pub template_name: String,
    /// Text fields in template order.
    pub values: Vec<FilledField>,
    /// Line items, empty unless the template enables them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItem>,
    pub saved_at: DateTime<Utc>,
}

impl FilledForm {
    /// Saved text of a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }
}

//! Rendering of saved forms.

use smartfill_core::FilledForm;
use smartfill_core::models::invoice::LineItemColumn;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension used when writing into a directory.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Format a saved form for output.
pub fn format_form(form: &FilledForm, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(form)?),
        OutputFormat::Csv => format_csv(form),
        OutputFormat::Text => Ok(format_text(form)),
    }
}

/// Text fields as one header row and one value row. Line items follow as a
/// second table after a blank record.
fn format_csv(form: &FilledForm) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    wtr.write_record(form.values.iter().map(|f| f.key.as_str()))?;
    wtr.write_record(form.values.iter().map(|f| f.value.as_str()))?;

    if !form.line_items.is_empty() {
        wtr.write_record([""])?;
        wtr.write_record(LineItemColumn::ALL.iter().map(|c| c.key()))?;
        for item in &form.line_items {
            wtr.write_record(LineItemColumn::ALL.iter().map(|&c| item.get(c)))?;
        }
    }

    let data = wtr.into_inner()?;
    Ok(String::from_utf8(data)?)
}

fn format_text(form: &FilledForm) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} ({})\n",
        form.template_name, form.template_id
    ));
    output.push_str(&format!(
        "Saved: {}\n\n",
        form.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let width = form
        .values
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0);
    for field in &form.values {
        let value = if field.value.is_empty() {
            "-"
        } else {
            field.value.as_str()
        };
        output.push_str(&format!("{:width$}  {}\n", field.label, value));
    }

    if !form.line_items.is_empty() {
        output.push_str(&format!("\nLine Items ({}):\n", form.line_items.len()));
        for (i, item) in form.line_items.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} | {} x {} = {}\n",
                i + 1,
                item.description,
                item.quantity,
                item.unit_price,
                item.amount
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use smartfill_core::LineItem;
    use smartfill_core::workflow::FilledField;

    fn form() -> FilledForm {
        FilledForm {
            template_id: "detailed".to_string(),
            template_name: "Detailed Invoice".to_string(),
            values: vec![
                FilledField {
                    key: "invoiceNumber".to_string(),
                    label: "Invoice Number".to_string(),
                    value: "INV-1".to_string(),
                },
                FilledField {
                    key: "total".to_string(),
                    label: "Total".to_string(),
                    value: "$1,000.00".to_string(),
                },
            ],
            line_items: vec![LineItem {
                description: "Widget".to_string(),
                quantity: "2".to_string(),
                unit_price: "$500.00".to_string(),
                amount: "$1,000.00".to_string(),
            }],
            saved_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = format_form(&form(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "invoiceNumber,total");
        assert_eq!(lines[1], "INV-1,\"$1,000.00\"");
        assert_eq!(lines[3], "description,quantity,unitPrice,amount");
        assert_eq!(lines[4], "Widget,2,$500.00,\"$1,000.00\"");
    }

    #[test]
    fn test_text_lists_line_items() {
        let text = format_form(&form(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Detailed Invoice (detailed)"));
        assert!(text.contains("Invoice Number  INV-1"));
        assert!(text.contains("1. Widget | 2 x $500.00 = $1,000.00"));
    }

    #[test]
    fn test_json_uses_saved_keys() {
        let json = format_form(&form(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["template_id"], "detailed");
        assert_eq!(value["line_items"][0]["description"], "Widget");
    }
}

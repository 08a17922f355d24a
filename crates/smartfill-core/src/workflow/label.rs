//! Human-readable labels for record keys.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CAPITAL: Regex = Regex::new(r"([A-Z])").unwrap();
}

/// Form label for a field key: `invoiceNumber` becomes "Invoice Number".
///
/// Inserts a space before every capital, upper-cases the first character
/// and trims.
pub fn format_field_label(field: &str) -> String {
    let spaced = CAPITAL.replace_all(field, " $1");
    let mut chars = spaced.chars();
    let label: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    label.trim().to_string()
}

/// Preview label for a field key: every word capitalized.
pub fn format_preview_label(field: &str) -> String {
    CAPITAL
        .replace_all(field, " $1")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

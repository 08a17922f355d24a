//! Configuration structures for a smart fill session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration for smartfill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartFillConfig {
    /// Extraction configuration.
    pub extraction: ExtractionConfig,

    /// Upload boundary configuration.
    pub upload: UploadConfig,

    /// Field mapping form configuration.
    pub form: FormConfig,
}

/// Extraction stub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Simulated extraction latency in milliseconds.
    pub delay_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { delay_ms: 2000 }
    }
}

impl ExtractionConfig {
    /// Latency as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Upload boundary configuration.
///
/// These limits are advisory. Files outside them are logged, not refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Advertised maximum file size in bytes.
    pub max_size_bytes: u64,

    /// Advertised MIME types. A trailing `/*` matches any subtype.
    pub accepted_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            accepted_types: vec!["image/*".to_string(), "application/pdf".to_string()],
        }
    }
}

/// Field mapping form configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Initial state of the auto-mapping toggle.
    pub auto_mapping: bool,

    /// Template preselected by front ends that skip the selector.
    pub default_template: Option<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            auto_mapping: true,
            default_template: None,
        }
    }
}

impl SmartFillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

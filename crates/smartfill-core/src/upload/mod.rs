//! The file input boundary.

mod surface;

pub use surface::{UploadChannel, UploadSurface, UploadView, SUPPORTED_FORMATS_HINT};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::config::UploadConfig;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Fallback MIME type for bytes nothing recognizes.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A file handed to the workflow by one of the upload channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,
    /// Declared or sniffed MIME type.
    pub mime_type: String,
    /// Raw file content.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create a file with a declared MIME type.
    ///
    /// An empty declaration is replaced by a sniffed type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mut mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            mime_type = sniff_mime_type(&bytes).to_string();
        }
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }

    /// Create a file whose MIME type is sniffed from its content.
    pub fn sniffed(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, String::new(), bytes)
    }

    /// Read a file from disk, sniffing its type.
    #[cfg(feature = "native")]
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("invoice")
            .to_string();
        Ok(Self::sniffed(name, bytes))
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Encode as a `data:` URI for in-memory preview rendering.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    /// Compare against the advertised limits.
    ///
    /// Returns the problems found. The workflow never refuses a file over
    /// these; callers log them.
    pub fn advisory_issues(&self, config: &UploadConfig) -> Vec<String> {
        let mut issues = Vec::new();

        if self.size() > config.max_size_bytes {
            issues.push(format!(
                "{} is {} bytes, above the advertised {} byte limit",
                self.name,
                self.size(),
                config.max_size_bytes
            ));
        }

        if !config
            .accepted_types
            .iter()
            .any(|accepted| mime_matches(accepted, &self.mime_type))
        {
            issues.push(format!(
                "{} has type {}, which is not an advertised format",
                self.name, self.mime_type
            ));
        }

        for issue in &issues {
            warn!("{}", issue);
        }

        issues
    }
}

/// Guess a MIME type from file content.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PDF_MAGIC) {
        return "application/pdf";
    }

    match image::guess_format(bytes) {
        Ok(format) => {
            let mime = format.to_mime_type();
            debug!("Sniffed image format {:?} ({})", format, mime);
            mime
        }
        Err(_) => OCTET_STREAM,
    }
}

/// Match a MIME type against an accept pattern like `image/*`.
pub fn mime_matches(pattern: &str, mime_type: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(prefix) => mime_type
            .split_once('/')
            .is_some_and(|(kind, _)| kind.eq_ignore_ascii_case(prefix)),
        None => pattern.eq_ignore_ascii_case(mime_type),
    }
}

//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod output;
pub mod preview;
pub mod process;
pub mod templates;

use std::path::{Path, PathBuf};

use console::style;
use indicatif::ProgressBar;
use tracing::debug;

use smartfill_core::models::config::SmartFillConfig;
use smartfill_core::workflow::{Notification, NotificationLevel};
use smartfill_core::{
    MockExtractor, Session, SmartFillError, UploadChannel, UploadedFile, Workflow, WorkflowState,
};

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartfill")
        .join("config.json")
}

/// Load configuration from `--config`, the user file, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SmartFillConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(SmartFillConfig::default());
            }
            path
        }
    };

    debug!("Loading config from {}", path.display());
    let config = SmartFillConfig::from_file(&path)
        .map_err(|e| SmartFillError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

/// Start a session, upload `input` and wait for extraction to finish.
///
/// Fails if the file cannot be read or extraction reported an error.
pub async fn upload_and_extract(
    input: &Path,
    config: &SmartFillConfig,
    pb: &ProgressBar,
) -> anyhow::Result<(Session, WorkflowState)> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    pb.set_message("Reading file...");
    let file = UploadedFile::from_path(input)?;
    debug!("Uploading {} as {}", file.name, file.mime_type);

    let session = Session::spawn(
        Workflow::new(config.clone()),
        MockExtractor::from_config(&config.extraction),
    );
    session.upload(vec![file], UploadChannel::Picker).await?;

    pb.set_message("Processing your invoice...");
    let state = session.wait_until_idle().await?;

    if state.extracted_data.is_none() {
        let notes = session.inspect(|wf| wf.take_notifications()).await?;
        let reason = notes
            .iter()
            .find(|n| n.level == NotificationLevel::Error)
            .map(|n| n.description.clone())
            .unwrap_or_else(|| "no data extracted".to_string());
        anyhow::bail!("Extraction failed for {}: {}", input.display(), reason);
    }

    Ok((session, state))
}

/// Print notifications to stderr the way toasts would appear.
pub fn print_notifications(notes: &[Notification]) {
    for note in notes {
        let marker = match note.level {
            NotificationLevel::Info => style("ℹ").blue(),
            NotificationLevel::Error => style("✗").red(),
        };
        eprintln!("{} {}: {}", marker, style(&note.title).bold(), note.description);
    }
}

//! Preview command - show extracted data the way the review step does.

use std::path::PathBuf;

use clap::Args;
use console::{StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use smartfill_core::models::invoice::LineItemColumn;
use smartfill_core::workflow::NO_DATA_MESSAGE;
use smartfill_core::{Confidence, InvoicePreview};

use super::{load_config, print_notifications, upload_and_extract};

/// Arguments for the preview command.
#[derive(Args)]
pub struct PreviewArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Print the preview as JSON
    #[arg(long)]
    json: bool,

    /// Also print the image preview data URI
    #[arg(long)]
    show_data_uri: bool,
}

pub async fn run(args: PreviewArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    info!("Previewing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let extracted = upload_and_extract(&args.input, &config, &pb).await;
    pb.finish_and_clear();
    let (session, state) = extracted?;

    let (preview, notes) = session
        .inspect(|wf| (wf.preview(), wf.take_notifications()))
        .await?;
    print_notifications(&notes);
    session.shutdown().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        match &preview {
            Some(preview) => print!("{}", render_preview(preview)),
            None => println!("{}", NO_DATA_MESSAGE),
        }
    }

    if args.show_data_uri {
        if let Some(uri) = &state.invoice_image_preview {
            println!();
            println!("{}", uri);
        }
    }

    Ok(())
}

fn marker(confidence: Confidence) -> StyledObject<&'static str> {
    match confidence {
        Confidence::High => style("✓").green(),
        Confidence::Medium => style("✓").yellow(),
        Confidence::Low => style("!").red(),
    }
}

/// Render the preview table followed by the line-item table.
pub fn render_preview(preview: &InvoicePreview) -> String {
    let mut output = String::new();

    let width = preview
        .rows
        .iter()
        .map(|r| r.label.len())
        .max()
        .unwrap_or(0);

    for row in &preview.rows {
        output.push_str(&format!(
            "{} {:width$}  {}",
            marker(row.confidence),
            row.label,
            row.value
        ));
        if row.confidence.needs_review() {
            output.push_str(&format!("  {}", style("(needs review)").dim()));
        }
        output.push('\n');
    }

    if let Some(items) = &preview.line_items {
        output.push_str(&format!("\n{}\n", style("Line Items").bold()));
        let headers: Vec<&str> = LineItemColumn::ALL.iter().map(|c| c.header()).collect();
        output.push_str(&format!("  {}\n", headers.join(" | ")));
        for item in items {
            let cells: Vec<&str> = LineItemColumn::ALL.iter().map(|&c| item.get(c)).collect();
            output.push_str(&format!("  {}\n", cells.join(" | ")));
        }
    }

    output
}

//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use smartfill_core::FilledForm;

use super::load_config;
use super::output::{OutputFormat, format_form};
use super::process::{FALLBACK_TEMPLATE, FormEdits, fill_and_save};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Template to fill (standard, detailed)
    #[arg(short, long)]
    template: Option<String>,

    /// Start with empty fields instead of extracted values
    #[arg(long)]
    no_auto_map: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    form: Option<FilledForm>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = load_config(config_path)?;
    let template = args
        .template
        .clone()
        .or_else(|| config.form.default_template.clone())
        .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string());
    let edits = FormEdits {
        auto_mapping: !args.no_auto_map,
        ..FormEdits::default()
    };

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Set up progress bar
    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    // One session per file, one file at a time.
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = fill_and_save(&path, &config, &template, &edits, &overall_pb).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(form) => results.push(ProcessResult {
                path,
                form: Some(form),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        form: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.form.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    // Write outputs
    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(form) = &result.form {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("invoice");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_form(form, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "template",
        "invoice_number",
        "vendor_name",
        "total",
        "line_items",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        if let Some(form) = &result.form {
            wtr.write_record([
                filename,
                "success",
                &form.template_id,
                form.get("invoiceNumber").unwrap_or(""),
                form.get("vendorName").unwrap_or(""),
                form.get("total").unwrap_or(""),
                &form.line_items.len().to_string(),
                &time,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &time,
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

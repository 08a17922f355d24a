//! Process command - run one invoice through upload, review and save.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use smartfill_core::models::config::SmartFillConfig;
use smartfill_core::{Event, FilledForm, LineItemColumn, Session};

use super::output::{OutputFormat, format_form};
use super::{load_config, print_notifications, upload_and_extract};

/// Template used when neither `--template` nor the config names one.
pub const FALLBACK_TEMPLATE: &str = "standard";

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Template to fill (standard, detailed)
    #[arg(short, long)]
    template: Option<String>,

    /// Start with empty fields instead of extracted values
    #[arg(long)]
    no_auto_map: bool,

    /// Override a field, e.g. --set vendorName="Acme Ltd."
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Append an empty line item (detailed template only)
    #[arg(long, action = clap::ArgAction::Count)]
    add_line_item: u8,

    /// Edit a line item cell, e.g. --set-item 2.amount=$10.00 (rows start at 1)
    #[arg(long = "set-item", value_name = "ROW.COLUMN=VALUE")]
    set_item: Vec<String>,
}

/// Edits applied to the mapping form before saving.
#[derive(Debug, Default)]
pub struct FormEdits {
    pub auto_mapping: bool,
    pub fields: Vec<(String, String)>,
    pub add_line_items: u8,
    pub cells: Vec<(usize, LineItemColumn, String)>,
}

impl FormEdits {
    fn from_args(args: &ProcessArgs) -> anyhow::Result<Self> {
        let fields = args
            .set
            .iter()
            .map(|s| parse_assignment(s))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let cells = args
            .set_item
            .iter()
            .map(|s| parse_cell(s))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            auto_mapping: !args.no_auto_map,
            fields,
            add_line_items: args.add_line_item,
            cells,
        })
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = load_config(config_path)?;
    let edits = FormEdits::from_args(&args)?;
    let template = args
        .template
        .clone()
        .or_else(|| config.form.default_template.clone())
        .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string());

    info!("Processing file: {}", args.input.display());

    // Create progress bar
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let form = fill_and_save(&args.input, &config, &template, &edits, &pb).await;
    pb.finish_and_clear();
    let form = form?;

    // Format output
    let output = format_form(&form, args.format)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run a whole session for `input` and return the saved form.
pub async fn fill_and_save(
    input: &std::path::Path,
    config: &SmartFillConfig,
    template: &str,
    edits: &FormEdits,
    pb: &ProgressBar,
) -> anyhow::Result<FilledForm> {
    let mut config = config.clone();
    config.form.auto_mapping = config.form.auto_mapping && edits.auto_mapping;

    let (session, _) = upload_and_extract(input, &config, pb).await?;

    // Map onto the template and save
    pb.set_message("Filling form...");
    session.dispatch(Event::ContinueToTemplate).await?;
    session
        .dispatch(Event::SelectTemplate(template.to_string()))
        .await?;
    apply_edits(&session, edits).await?;
    session.dispatch(Event::Save).await?;

    // Collect the saved form
    let (form, notes) = session
        .inspect(|wf| (wf.saved_forms().last().cloned(), wf.take_notifications()))
        .await?;
    pb.suspend(|| print_notifications(&notes));
    session.shutdown().await?;

    form.ok_or_else(|| anyhow::anyhow!("Session ended without a saved form"))
}

async fn apply_edits(session: &Session, edits: &FormEdits) -> anyhow::Result<()> {
    for (key, value) in &edits.fields {
        debug!("Setting {} = {}", key, value);
        session
            .dispatch(Event::EditField {
                key: key.clone(),
                value: value.clone(),
            })
            .await?;
    }

    for _ in 0..edits.add_line_items {
        session.dispatch(Event::AddLineItem).await?;
    }

    for (index, column, value) in &edits.cells {
        session
            .dispatch(Event::EditLineItem {
                index: *index,
                column: *column,
                value: value.clone(),
            })
            .await?;
    }

    Ok(())
}

/// Parse `key=value`.
fn parse_assignment(s: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Missing field key in '{}'", s);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse `row.column=value` with a 1-based row.
fn parse_cell(s: &str) -> anyhow::Result<(usize, LineItemColumn, String)> {
    let (target, value) = parse_assignment(s)?;
    let (row, column) = target
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("Expected ROW.COLUMN=VALUE, got '{}'", s))?;

    let row: usize = row
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid row number '{}'", row))?;
    if row == 0 {
        anyhow::bail!("Rows start at 1");
    }
    let column = LineItemColumn::from_key(column)
        .ok_or_else(|| anyhow::anyhow!("Unknown line item column '{}'", column))?;

    Ok((row - 1, column, value))
}

//! CLI application for invoice smart fill.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, preview, process, templates};

/// Invoice smart fill - upload an invoice, review the extracted data and fill a template
#[derive(Parser)]
#[command(name = "smartfill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill and save a template from a single invoice file
    Process(process::ProcessArgs),

    /// Show the extracted data with confidence markers
    Preview(preview::PreviewArgs),

    /// Process multiple invoice files
    Batch(batch::BatchArgs),

    /// List available templates
    Templates(templates::TemplatesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Preview(args) => preview::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Templates(args) => templates::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}

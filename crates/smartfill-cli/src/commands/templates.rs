//! Templates command - list the template catalog.

use clap::Args;
use console::style;

use smartfill_core::format_field_label;
use smartfill_core::models::template::TemplateSelectorView;
use smartfill_core::{find_template, templates};

use super::load_config;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    /// Print the selector as JSON
    #[arg(long)]
    json: bool,

    /// List the fields of each template
    #[arg(long)]
    fields: bool,
}

pub async fn run(args: TemplatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let selected = config
        .form
        .default_template
        .as_deref()
        .and_then(find_template);
    let view = TemplateSelectorView::new(selected);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for option in &view.options {
        let marker = if option.selected {
            style("✓").green()
        } else {
            style(" ")
        };
        println!(
            "{} {:10} {:20} {}",
            marker,
            option.id,
            option.name,
            style(&option.caption).dim()
        );

        if args.fields {
            if let Some(template) = templates().iter().find(|t| t.id == option.id) {
                for field in template.fields {
                    println!("      - {}", format_field_label(field));
                }
            }
        }
    }

    println!("  {}", style(view.create_custom_label).dim());

    Ok(())
}

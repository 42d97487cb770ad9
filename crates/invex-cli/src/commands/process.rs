//! Process command - run a single recognized-text invoice through the
//! pipeline.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::info;

use invex_core::{InvoiceRecord, Pipeline, PipelineResult};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file with recognized invoice text
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Treat validation warnings as errors
    #[arg(long)]
    strict: bool,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full result report as JSON
    Json,
    /// Flattened record as CSV
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if args.strict {
        config.validation.strict = true;
    }

    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }
    let text = fs::read_to_string(&args.input)?;
    info!("processing {}", args.input.display());

    let pipeline = Pipeline::new(config);
    let result = pipeline.process(&text);

    if let Some(error) = &result.error {
        eprintln!("{} {}", style("✗").red(), error);
        anyhow::bail!(
            "processing failed after stage '{}'",
            result.stage_reached
        );
    }

    report_issues(&result);

    let output = format_result(&result, args.format)?;
    if let Some(path) = &args.output {
        fs::write(path, output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            path.display()
        );
    } else {
        println!("{output}");
    }

    if args.show_confidence {
        if let Some(record) = &result.record {
            println!();
            let mut scores: Vec<_> = record.meta.field_confidence.iter().collect();
            scores.sort_by_key(|(field, _)| field.as_str());
            for (field, confidence) in scores {
                println!(
                    "{} {}: {:.0}%",
                    style("ℹ").blue(),
                    field,
                    confidence * 100.0
                );
            }
            if let Some(time_ms) = record.meta.processing_time_ms {
                println!("{} Processing time: {}ms", style("ℹ").blue(), time_ms);
            }
        }
    }

    Ok(())
}

fn report_issues(result: &PipelineResult) {
    if !result.validation_issues.is_empty() {
        eprintln!("{}", style("Validation issues:").yellow());
        for issue in &result.validation_issues {
            eprintln!("  [{}] {}: {}", issue.severity, issue.field, issue.message);
        }
    }

    if !result.anomalies.is_empty() {
        eprintln!("{}", style("Anomaly findings:").yellow());
        for finding in &result.anomalies {
            eprintln!(
                "  [{}] {}: {}",
                finding.severity, finding.field, finding.description
            );
        }
    }

    for failure in &result.delivery_failures {
        eprintln!(
            "{} delivery failed ({:?}): {}",
            style("!").red(),
            failure.target,
            failure.message
        );
    }
}

fn format_result(result: &PipelineResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => {
            let record = result.record.as_ref().context("no record extracted")?;
            format_record_csv(record)
        }
        OutputFormat::Text => Ok(format_record_text(result)),
    }
}

pub(crate) fn format_record_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let flat = invex_core::export::flatten(record);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(flat.keys())?;
    wtr.write_record(flat.values())?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_record_text(result: &PipelineResult) -> String {
    let mut output = String::new();

    if let Some(record) = &result.record {
        output.push_str(&format!(
            "Invoice: {}\n",
            record.invoice_number.as_deref().unwrap_or("(unknown)")
        ));
        if let Some(date) = record.invoice_date {
            output.push_str(&format!("Date: {date}\n"));
        }
        if let Some(supplier) = &record.supplier {
            output.push_str(&format!("Supplier: {supplier}\n"));
        }

        if !record.line_items.is_empty() {
            output.push('\n');
            output.push_str("Line items:\n");
            for item in &record.line_items {
                output.push_str(&format!(
                    "  {} x {} @ {} = {}\n",
                    item.quantity, item.description, item.unit_price, item.line_total
                ));
            }
        }

        output.push('\n');
        output.push_str("Summary:\n");
        if let Some(v) = record.subtotal {
            output.push_str(&format!("  Subtotal: {v}\n"));
        }
        if let Some(v) = record.vat {
            output.push_str(&format!("  VAT:      {v}\n"));
        }
        if let Some(v) = record.total {
            output.push_str(&format!("  Total:    {v}\n"));
        }
    }

    output.push_str(&format!(
        "\nStatus: {} ({} issues, {} anomalies)\n",
        if result.success { "accepted" } else { "rejected" },
        result.validation_issues.len(),
        result.anomalies.len()
    ));

    output
}

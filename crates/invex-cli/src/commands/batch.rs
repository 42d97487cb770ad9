//! Batch processing command for multiple recognized-text files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::ProgressBar;
use tracing::{debug, warn};

use invex_core::{BatchSummary, Pipeline};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-invoice JSON reports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("no matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    // Read all inputs up front. An unreadable file becomes an empty
    // input, which the pipeline records as a failed run without
    // touching the rest of the batch.
    let texts: Vec<String> = files
        .iter()
        .map(|path| {
            fs::read_to_string(path).unwrap_or_else(|e| {
                warn!("failed to read {}: {e}", path.display());
                String::new()
            })
        })
        .collect();

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("processing {} invoices...", files.len()));

    let pipeline = Pipeline::new(config);
    let summary = pipeline.process_batch(&texts);

    pb.finish_and_clear();

    // Write per-invoice reports
    if let Some(ref output_dir) = args.output_dir {
        for (path, result) in files.iter().zip(&summary.results) {
            let output_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("invoice");
            let output_path = output_dir.join(format!("{output_name}.json"));
            fs::write(&output_path, serde_json::to_string_pretty(result)?)?;
            debug!("wrote report to {}", output_path.display());
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &files, &summary)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    println!();
    println!(
        "{} Processed {} invoices in {:?}",
        style("✓").green(),
        summary.total,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(summary.successful).green(),
        style(summary.failed).red()
    );

    let failed: Vec<_> = files
        .iter()
        .zip(&summary.results)
        .filter(|(_, r)| !r.success)
        .collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed invoices:").red());
        for (path, result) in failed {
            let reason = result
                .error
                .clone()
                .unwrap_or_else(|| format!("{} validation errors", result.error_count()));
            println!("  - {}: {}", path.display(), reason);
        }
    }

    Ok(())
}

fn write_summary(
    path: &PathBuf,
    files: &[PathBuf],
    summary: &BatchSummary,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "supplier",
        "total",
        "issues",
        "anomalies",
        "error",
    ])?;

    for (file, result) in files.iter().zip(&summary.results) {
        let filename = file.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let record = result.record.as_ref();

        let total = record
            .and_then(|r| r.total)
            .map(|t| t.to_string())
            .unwrap_or_default();
        let issues = result.validation_issues.len().to_string();
        let anomalies = result.anomalies.len().to_string();

        wtr.write_record([
            filename,
            if result.success { "success" } else { "failed" },
            record.and_then(|r| r.invoice_number.as_deref()).unwrap_or(""),
            record.and_then(|r| r.supplier.as_deref()).unwrap_or(""),
            total.as_str(),
            issues.as_str(),
            anomalies.as_str(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

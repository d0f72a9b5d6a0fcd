//! Batch processing command for multiple text files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use invoscan_core::{ExtractionRecord, InvoiceScanner};

use super::process::{CSV_HEADER, OutputFormat, csv_row, file_name, format_record, read_text};
use super::{build_scanner, load_config};

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

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    index: usize,
    path: PathBuf,
    outcome: Result<ExtractionRecord, String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let scanner = Arc::new(build_scanner(&config)?);
    let marker = config.report.absent_marker.clone();

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Documents are independent; workers share one scanner.
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let scanner = Arc::clone(&scanner);
        let permits = Arc::clone(&permits);

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let result = tokio::task::spawn_blocking(move || process_single_file(index, path, &scanner))
                .await?;
            anyhow::Ok(result)
        });
    }

    let mut results = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        let result = joined??;

        if let Err(ref error_msg) = result.outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                tasks.abort_all();
                overall_pb.abandon();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }

        results.push(result);
        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if config.report.preserve_order {
        results.sort_by_key(|r| r.index);
    }

    let records: Vec<&ExtractionRecord> = results.iter().filter_map(|r| r.outcome.as_ref().ok()).collect();
    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.outcome.is_err()).collect();

    // Write outputs
    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Ok(record) = &result.outcome {
                // Full input name, so `a.txt` and `a.md` do not share an output.
                let output_name = format!("{}.{}", file_name(&result.path), args.format.extension());

                let output_path = output_dir.join(output_name);
                fs::write(&output_path, format_record(record, args.format, &marker)?)?;
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

        write_summary(&summary_path, &records, &marker)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let review = records.iter().filter(|r| r.needs_review()).count();

    // Print summary
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} ok, {} need review, {} failed",
        style(records.len() - review).green(),
        style(review).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.outcome.as_ref().err().map(String::as_str).unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(index: usize, path: PathBuf, scanner: &InvoiceScanner) -> ProcessResult {
    let file_start = Instant::now();

    let outcome = read_text(&path)
        .map(|text| scanner.scan_document(&file_name(&path), &text))
        .map_err(|e| e.to_string());

    debug!(
        "{} processed in {}ms",
        path.display(),
        file_start.elapsed().as_millis()
    );

    ProcessResult {
        index,
        path,
        outcome,
    }
}

fn write_summary(path: &Path, records: &[&ExtractionRecord], absent_marker: &str) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.write_record(csv_row(record, absent_marker))?;
    }

    wtr.flush()?;
    Ok(())
}

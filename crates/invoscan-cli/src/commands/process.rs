//! Process command - extract fields from a single text file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invoscan_core::{ExtractionRecord, FieldKey};

use super::{build_scanner, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file holding the recognized text of one invoice
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Document name recorded in the output (default: input file name)
    #[arg(long)]
    name: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Columns of CSV output, one row per document.
pub const CSV_HEADER: [&str; 12] = [
    "source_filename",
    "vendor_profile",
    "date",
    "date_iso",
    "vendor",
    "total_amount",
    "currency",
    "product",
    "description",
    "invoice_number",
    "reliability_score",
    "triage_state",
];

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let scanner = build_scanner(&config)?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let text = read_text(&args.input)?;
    let name = args.name.clone().unwrap_or_else(|| file_name(&args.input));
    let record = scanner.scan_document(&name, &text);

    let output = format_record(&record, args.format, &config.report.absent_marker)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if record.needs_review() {
        eprintln!(
            "{} {} {} (reliability {:.2})",
            style("⚠").yellow(),
            name,
            record.triage_state().label(),
            record.reliability_score()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read a text file, replacing invalid UTF-8 rather than failing.
pub fn read_text(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

pub fn format_record(
    record: &ExtractionRecord,
    format: OutputFormat,
    absent_marker: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record, absent_marker),
        OutputFormat::Text => Ok(format_text(record, absent_marker)),
    }
}

/// One CSV row in [`CSV_HEADER`] order.
pub fn csv_row(record: &ExtractionRecord, absent_marker: &str) -> Vec<String> {
    let field = |key: FieldKey| record.get(key).display_or(absent_marker);

    vec![
        record.source_filename().unwrap_or_default().to_string(),
        record
            .vendor_profile()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "generic".to_string()),
        field(FieldKey::Date),
        record
            .issue_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| absent_marker.to_string()),
        field(FieldKey::Vendor),
        field(FieldKey::TotalAmount),
        field(FieldKey::Currency),
        field(FieldKey::Product),
        field(FieldKey::Description),
        field(FieldKey::InvoiceNumber),
        format!("{:.2}", record.reliability_score()),
        record.triage_state().to_string(),
    ]
}

fn format_csv(record: &ExtractionRecord, absent_marker: &str) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_row(record, absent_marker))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ExtractionRecord, absent_marker: &str) -> String {
    let field = |key: FieldKey| record.get(key).display_or(absent_marker);
    let mut output = String::new();

    if let Some(name) = record.source_filename() {
        output.push_str(&format!("Document: {}\n", name));
    }
    output.push_str(&format!("Invoice: {}\n", field(FieldKey::InvoiceNumber)));
    match record.issue_date() {
        Some(date) => output.push_str(&format!("Date: {} ({})\n", field(FieldKey::Date), date)),
        None => output.push_str(&format!("Date: {}\n", field(FieldKey::Date))),
    }
    output.push_str(&format!("Vendor: {}\n", field(FieldKey::Vendor)));
    output.push('\n');

    output.push_str(&format!("Product: {}\n", field(FieldKey::Product)));
    output.push_str(&format!("Description: {}\n", field(FieldKey::Description)));
    output.push_str(&format!(
        "Total: {} {}\n",
        field(FieldKey::TotalAmount),
        field(FieldKey::Currency)
    ));
    output.push('\n');

    let profile = record
        .vendor_profile()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "generic".to_string());
    output.push_str(&format!("Profile: {}\n", profile));
    output.push_str(&format!(
        "Reliability: {:.2} ({})\n",
        record.reliability_score(),
        record.triage_state()
    ));

    let missing = record.fields().missing_fields();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
        output.push_str(&format!("Missing: {}\n", names.join(", ")));
    }

    output
}

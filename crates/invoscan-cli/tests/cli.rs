//! End-to-end tests for the `invoscan` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const AMAZON: &str = "\
Amazon Services Europe S.à r.l.
Número de la factura: ES-2191673415-2024-4
Fecha de la factura: 15.01.2024
Vendido por: Amazon EU S.à r.l.
TOTAL: EUR 30,00
";

const GENERIC_COMPLETE: &str = "\
FACTURA
Factura Nº: 2024-0087
Fecha: 03/04/2024
Proveedor: Papelería Central S.L.
Descripción: Pizarra blanca 90x60
Moneda: EUR
Total factura: 89,90 EUR
";

const SPARSE: &str = "Gracias por su visita\nTotal: 12,00\n";

fn invoscan() -> Command {
    Command::cargo_bin("invoscan").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn process_vendor_document_as_json() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "amazon.txt", AMAZON);

    invoscan()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""vendor_profile": "amazon""#))
        .stdout(predicate::str::contains(r#""reliability_score": 1.0"#))
        .stdout(predicate::str::contains(r#""triage_state": "OK""#))
        .stdout(predicate::str::contains("ES-2191673415-2024-4"));
}

#[test]
fn process_sparse_document_flags_review() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "ticket.txt", SPARSE);

    invoscan()
        .args(["process", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("source_filename,vendor_profile,date,date_iso"))
        .stdout(predicate::str::contains("ticket.txt,generic,NaN,NaN"))
        .stdout(predicate::str::contains("NEEDS_REVIEW"))
        .stderr(predicate::str::contains("needs manual review"));
}

#[test]
fn process_text_format_with_name() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "scan-001.txt", GENERIC_COMPLETE);

    invoscan()
        .args(["process", "-f", "text", "--name", "factura_0087.pdf"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Document: factura_0087.pdf"))
        .stdout(predicate::str::contains("Date: 03/04/2024 (2024-04-03)"))
        .stdout(predicate::str::contains("Total: 89.90 EUR"))
        .stdout(predicate::str::contains("Reliability: 1.00 (OK)"));
}

#[test]
fn process_missing_file_fails() {
    invoscan()
        .args(["process", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn batch_writes_outputs_and_ordered_summary() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    write(input_dir.path(), "a_amazon.txt", AMAZON);
    write(input_dir.path(), "b_factura.txt", GENERIC_COMPLETE);
    write(input_dir.path(), "c_ticket.txt", SPARSE);

    let pattern = input_dir.path().join("*.txt");

    invoscan()
        .args(["batch", "--summary", "-j", "2", "-o"])
        .arg(output_dir.path())
        .arg(pattern.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"));

    for name in ["a_amazon.txt", "b_factura.txt", "c_ticket.txt"] {
        assert!(output_dir.path().join(format!("{}.json", name)).exists());
    }

    let summary = fs::read_to_string(output_dir.path().join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("source_filename,vendor_profile"));
    assert!(lines[1].starts_with("a_amazon.txt,amazon,15.01.2024,2024-01-15"));
    assert!(lines[1].ends_with(",1.00,OK"));
    assert!(lines[2].starts_with("b_factura.txt,generic,03/04/2024,2024-04-03"));
    assert!(lines[2].ends_with(",1.00,OK"));
    assert!(lines[3].starts_with("c_ticket.txt,generic,NaN,NaN"));
    assert!(lines[3].ends_with(",0.14,NEEDS_REVIEW"));
}

#[test]
fn batch_keeps_outputs_of_same_stem_apart() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    write(input_dir.path(), "march.txt", AMAZON);
    write(input_dir.path(), "march.md", SPARSE);

    invoscan()
        .args(["batch", "-f", "csv", "-o"])
        .arg(output_dir.path())
        .arg(input_dir.path().join("march.*").to_str().unwrap())
        .assert()
        .success();

    let md = fs::read_to_string(output_dir.path().join("march.md.csv")).unwrap();
    let txt = fs::read_to_string(output_dir.path().join("march.txt.csv")).unwrap();
    assert!(md.contains("march.md,generic"));
    assert!(txt.contains("march.txt,amazon"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.txt");

    invoscan()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_controls_vendor_profiles() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let input = write(dir.path(), "amazon.txt", "Amazon Services Europe\nGracias por su compra\n");

    invoscan()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();

    invoscan()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "extraction.vendor_profiles", "false"])
        .assert()
        .success();

    invoscan()
        .arg("-c")
        .arg(&config)
        .args(["config", "get", "extraction.vendor_profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    invoscan()
        .arg("-c")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor_profile").not())
        .stdout(predicate::str::contains(r#""triage_state": "NEEDS_REVIEW""#));
}

#[test]
fn config_rejects_invalid_custom_pattern() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    invoscan()
        .arg("-c")
        .arg(&config)
        .args([
            "config",
            "set",
            "extraction.custom_patterns",
            r#"[{"field": "vendor", "pattern": "(unclosed"}]"#,
        ])
        .assert()
        .failure();

    assert!(!config.exists());
}

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Config with no simulated latency.
fn fast_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, r#"{ "extraction": { "delay_ms": 0 } }"#).unwrap();
    path
}

fn invoice(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"%PDF-1.4 not really an invoice").unwrap();
    path
}

fn smartfill(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("smartfill").unwrap();
    cmd.arg("-c").arg(config);
    cmd
}

#[test]
fn process_prints_standard_form_as_json() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let input = invoice(dir.path(), "scan.pdf");

    let output = smartfill(&config)
        .arg("process")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let form: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(form["template_id"], "standard");
    assert_eq!(form["values"].as_array().unwrap().len(), 6);
    assert_eq!(form["values"][0]["key"], "invoiceNumber");
    assert_eq!(form["values"][0]["value"], "INV-2023-0042");
    assert!(form.get("line_items").is_none());
}

#[test]
fn process_detailed_with_edits() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let input = invoice(dir.path(), "scan.jpg");
    let out = dir.path().join("form.json");

    smartfill(&config)
        .args(["process", "-t", "detailed", "--set", "vendorName=Globex"])
        .args(["--add-line-item", "--set-item", "3.description=Shipping"])
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Template Saved"));

    let form: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(form["template_id"], "detailed");
    let vendor = form["values"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["key"] == "vendorName")
        .unwrap();
    assert_eq!(vendor["value"], "Globex");
    assert_eq!(form["line_items"].as_array().unwrap().len(), 3);
    assert_eq!(form["line_items"][2]["description"], "Shipping");
}

#[test]
fn process_without_auto_map_leaves_fields_empty() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let input = invoice(dir.path(), "scan.png");

    smartfill(&config)
        .args(["process", "--no-auto-map", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "invoiceNumber,date,vendorName,total,subtotal,tax\n,,,,,\n",
        ));
}

#[test]
fn process_rejects_unknown_template() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let input = invoice(dir.path(), "scan.pdf");

    smartfill(&config)
        .args(["process", "-t", "custom"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("custom"));
}

#[test]
fn process_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());

    smartfill(&config)
        .arg("process")
        .arg(dir.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn preview_marks_confidence() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let input = invoice(dir.path(), "scan.pdf");

    smartfill(&config)
        .arg("preview")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("$1,246.50"))
        .stdout(predicate::str::contains("(needs review)"))
        .stdout(predicate::str::contains("Office Supplies | 5 | $45.00 | $225.00"));
}

#[test]
fn templates_lists_catalog() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());

    smartfill(&config)
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("Standard Invoice"))
        .stdout(predicate::str::contains("8 fields"))
        .stdout(predicate::str::contains("+ Create custom template"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(dir.path());
    let inputs = dir.path().join("inbox");
    fs::create_dir_all(&inputs).unwrap();
    invoice(&inputs, "a.pdf");
    invoice(&inputs, "b.jpg");
    let out = dir.path().join("out");

    smartfill(&config)
        .arg("batch")
        .arg(format!("{}/*", inputs.display()))
        .arg("-o")
        .arg(&out)
        .args(["-f", "text", "--summary"])
        .assert()
        .success();

    assert!(out.join("a.txt").exists());
    assert!(out.join("b.txt").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("a.pdf,success,standard,INV-2023-0042"));
}

#[test]
fn config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.json");

    smartfill(&config)
        .args(["config", "set", "form.default_template", "detailed"])
        .assert()
        .success();

    smartfill(&config)
        .args(["config", "get", "form.default_template"])
        .assert()
        .success()
        .stdout("\"detailed\"\n");

    smartfill(&config)
        .args(["config", "set", "extraction.speed", "1"])
        .assert()
        .failure();
}

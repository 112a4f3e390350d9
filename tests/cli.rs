//! E2E tests for report, income, parcels and validate commands

use std::process::Command;

/// Test the gains report over a portfolio with a split and a disposal
#[test]
fn report_shows_split_adjusted_gain() {
    let output = Command::new("cargo")
        .args(["run", "--", "report", "-e", "tests/data/portfolio.csv"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify the command succeeded
    assert!(output.status.success(), "Command failed: {:?}", output);

    // 150 of 200 post-split units: cost 150 x $5, proceeds 150 x $8
    assert!(stdout.contains("CBA"));
    assert!(stdout.contains("$750.00"));
    assert!(stdout.contains("$1200.00"));
    assert!(stdout.contains("$450.00"));
    assert!(stdout.contains("Long"));
}

/// Test report CSV output
#[test]
fn report_csv_output() {
    let output = Command::new("cargo")
        .args([
            "run",
            "--",
            "report",
            "-e",
            "tests/data/portfolio.csv",
            "--csv",
        ])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify the command succeeded
    assert!(output.status.success(), "Command failed: {:?}", output);

    // Verify CSV header and the single disposal slice
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("discount_eligible"));
    assert!(lines[1].contains("2022-02-01"));
}

/// Test income totals include cash and scrip dividends
#[test]
fn income_totals_include_scrip_value() {
    let output = Command::new("cargo")
        .args(["run", "--", "income", "-e", "tests/data/portfolio.csv"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify the command succeeded
    assert!(output.status.success(), "Command failed: {:?}", output);

    // $90 cash + 3 x $33 scrip
    assert!(stdout.contains("BHP"));
    assert!(stdout.contains("$90.00"));
    assert!(stdout.contains("$99.00"));
    assert!(stdout.contains("$189.00"));
}

/// Test the open parcels listing after a partial disposal
#[test]
fn parcels_lists_surviving_lots() {
    let output = Command::new("cargo")
        .args(["run", "--", "parcels", "-e", "tests/data/portfolio.csv"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify the command succeeded
    assert!(output.status.success(), "Command failed: {:?}", output);

    // CBA remainder: 50 post-split units at $5
    assert!(stdout.contains("50"));
    assert!(stdout.contains("$5.00"));
    // BHP scrip parcel
    assert!(stdout.contains("DRP"));
}

/// Test validate on a clean event stream
#[test]
fn validate_passes_clean_stream() {
    let output = Command::new("cargo")
        .args(["run", "--", "validate", "-e", "tests/data/portfolio.csv"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("No issues found"));
}

/// Test validate reports an oversell and exits non-zero
#[test]
fn validate_flags_oversell() {
    let output = Command::new("cargo")
        .args(["run", "--", "validate", "-e", "tests/data/oversell.csv"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success());
    assert!(stdout.contains("1 issue(s) found"));
    assert!(stdout.contains("exceeds open quantity"));
}

/// Test report fails fast on an oversell
#[test]
fn report_rejects_oversell() {
    let output = Command::new("cargo")
        .args(["run", "--", "report", "-e", "tests/data/oversell.csv"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("exceeds open quantity"));
}

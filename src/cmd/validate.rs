//! Validate command - surface event-stream problems without a full report

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cmd::{read_events, ConfigArgs};
use crate::core::{sort_events, ParcelLedger};

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Events file (CSV or JSON). Reads from stdin with "-".
    #[arg(short, long)]
    events: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    date: String,
    security: String,
    event: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    event_count: usize,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    /// Applies every event in order, collecting ledger rejections. A failed
    /// apply leaves the ledger untouched, so later events are still checked
    /// against a consistent state; the operator gets every bad row at once.
    pub fn exec(&self) -> anyhow::Result<()> {
        let mut events = read_events(&self.events)?;
        sort_events(&mut events);

        let mut ledger = ParcelLedger::new(self.config.to_config());
        let mut issues = Vec::new();

        for event in &events {
            if let Err(err) = ledger.apply(event) {
                issues.push(ValidationIssue {
                    date: event.date.format("%Y-%m-%d").to_string(),
                    security: event.security.clone(),
                    event: event.describe().to_string(),
                    message: err.to_string(),
                });
            }
        }

        if self.json {
            self.print_json(events.len(), &issues)?;
        } else {
            self.print_text(events.len(), &issues);
        }

        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, event_count: usize, issues: &[ValidationIssue]) {
        println!();
        println!("VALIDATION RESULTS ({} events)", event_count);
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
        } else {
            println!("\u{26A0} {} issue(s) found:", issues.len());
            println!();

            for (i, issue) in issues.iter().enumerate() {
                println!(
                    "  {}. [{}] {} {}",
                    i + 1,
                    issue.date,
                    issue.security,
                    issue.event
                );
                println!("     {}", issue.message);
                println!();
            }
        }
    }

    fn print_json(&self, event_count: usize, issues: &[ValidationIssue]) -> anyhow::Result<()> {
        let output = ValidationOutput {
            event_count,
            issue_count: issues.len(),
            issues: issues.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

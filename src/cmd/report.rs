//! Report command - realized capital gains with totals

use clap::Args;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cmd::{format_money, format_quantity, read_events, ConfigArgs};
use crate::core::{calculate, GainsReport, RealizedGain};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Events file (CSV or JSON). Reads from stdin with "-".
    #[arg(short, long)]
    events: PathBuf,

    /// Filter by security code (e.g., CBA)
    #[arg(short, long)]
    security: Option<String>,

    /// Output as CSV instead of a formatted table
    #[arg(long)]
    csv: bool,

    /// Output as JSON instead of a formatted table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let events = read_events(&self.events)?;
        let report = calculate(events, self.config.to_config())?;

        let filtered = GainsReport {
            records: report
                .gains
                .records
                .iter()
                .filter(|g| {
                    self.security
                        .as_deref()
                        .is_none_or(|s| g.security.eq_ignore_ascii_case(s))
                })
                .cloned()
                .collect(),
        };

        if self.csv {
            filtered.write_csv(io::stdout())?;
        } else if self.json {
            self.print_json(&filtered)?;
        } else {
            self.print_table(&filtered);
        }
        Ok(())
    }

    fn print_table(&self, report: &GainsReport) {
        println!();
        println!("REALIZED CAPITAL GAINS");
        println!();

        if report.records.is_empty() {
            println!("No disposals found matching filters");
            return;
        }

        let rows: Vec<GainRow> = report.records.iter().map(GainRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        println!();
        println!("  Total proceeds:          {}", format_money(report.total_proceeds()));
        println!("  Total cost base:         {}", format_money(report.total_cost_base()));
        println!("  Gross gain:              {}", format_money(report.total_gain()));
        println!(
            "  Discount-eligible gain:  {}",
            format_money(report.discount_eligible_gain())
        );
        println!(
            "  Net gain (50% discount): {}",
            format_money(report.net_gain_after_discount())
        );
    }

    fn print_json(&self, report: &GainsReport) -> anyhow::Result<()> {
        let output = ReportOutput {
            gains: report.records.iter().map(GainView::from).collect(),
            totals: TotalsView {
                proceeds: format!("{:.2}", report.total_proceeds()),
                cost_base: format!("{:.2}", report.total_cost_base()),
                gross_gain: format!("{:.2}", report.total_gain()),
                discount_eligible_gain: format!("{:.2}", report.discount_eligible_gain()),
                net_gain_after_discount: format!("{:.2}", report.net_gain_after_discount()),
            },
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

#[derive(Debug, Tabled)]
struct GainRow {
    #[tabled(rename = "Security")]
    security: String,
    #[tabled(rename = "Disposed")]
    disposed: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Parcel")]
    parcel: u64,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Cost Base")]
    cost_base: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Holding")]
    holding: String,
    #[tabled(rename = "Discount")]
    discount: String,
}

impl From<&RealizedGain> for GainRow {
    fn from(g: &RealizedGain) -> Self {
        GainRow {
            security: g.security.clone(),
            disposed: g.disposal_date.format("%Y-%m-%d").to_string(),
            acquired: g.acquired.format("%Y-%m-%d").to_string(),
            parcel: g.parcel_id,
            quantity: format_quantity(g.quantity),
            proceeds: format_money(g.proceeds),
            cost_base: format_money(g.cost_base),
            gain: format_money(g.gain),
            holding: g.holding.display().to_string(),
            discount: if g.discount_eligible { "yes" } else { "" }.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GainView {
    security: String,
    disposal_date: String,
    acquired: String,
    parcel_id: u64,
    quantity: String,
    proceeds: String,
    cost_base: String,
    gain: String,
    holding: String,
    discount_eligible: bool,
}

impl From<&RealizedGain> for GainView {
    fn from(g: &RealizedGain) -> Self {
        GainView {
            security: g.security.clone(),
            disposal_date: g.disposal_date.format("%Y-%m-%d").to_string(),
            acquired: g.acquired.format("%Y-%m-%d").to_string(),
            parcel_id: g.parcel_id,
            quantity: g.quantity.to_string(),
            proceeds: format!("{:.2}", g.proceeds),
            cost_base: format!("{:.2}", g.cost_base),
            gain: format!("{:.2}", g.gain),
            holding: g.holding.display().to_string(),
            discount_eligible: g.discount_eligible,
        }
    }
}

#[derive(Debug, Serialize)]
struct TotalsView {
    proceeds: String,
    cost_base: String,
    gross_gain: String,
    discount_eligible_gain: String,
    net_gain_after_discount: String,
}

#[derive(Debug, Serialize)]
struct ReportOutput {
    gains: Vec<GainView>,
    totals: TotalsView,
}

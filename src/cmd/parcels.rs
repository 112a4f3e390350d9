//! Parcels command - open acquisition parcels after applying all events

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cmd::{format_money, format_quantity, read_events, ConfigArgs};
use crate::core::{calculate, Parcel};

#[derive(Args, Debug)]
pub struct ParcelsCommand {
    /// Events file (CSV or JSON). Reads from stdin with "-".
    #[arg(short, long)]
    events: PathBuf,

    /// Filter by security code (e.g., CBA)
    #[arg(short, long)]
    security: Option<String>,

    /// Output as JSON instead of a formatted table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

impl ParcelsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let events = read_events(&self.events)?;
        let report = calculate(events, self.config.to_config())?;

        let open: Vec<&Parcel> = report
            .ledger
            .all_open_parcels()
            .into_iter()
            .filter(|p| {
                self.security
                    .as_deref()
                    .is_none_or(|s| p.security.eq_ignore_ascii_case(s))
            })
            .collect();

        if self.json {
            self.print_json(&open)?;
        } else {
            self.print_table(&open);
        }
        Ok(())
    }

    fn print_table(&self, parcels: &[&Parcel]) {
        println!();
        println!("OPEN PARCELS");
        println!();

        if parcels.is_empty() {
            println!("No open parcels found matching filters");
            return;
        }

        let rows: Vec<ParcelRow> = parcels.iter().map(|p| ParcelRow::from(*p)).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }

    fn print_json(&self, parcels: &[&Parcel]) -> anyhow::Result<()> {
        let output = ParcelsOutput {
            parcels: parcels.iter().map(|p| ParcelView::from(*p)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

#[derive(Debug, Tabled)]
struct ParcelRow {
    #[tabled(rename = "Security")]
    security: String,
    #[tabled(rename = "Parcel")]
    parcel: u64,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Cost/Unit")]
    cost_per_unit: String,
    #[tabled(rename = "Cost Base")]
    cost_base: String,
}

impl From<&Parcel> for ParcelRow {
    fn from(p: &Parcel) -> Self {
        ParcelRow {
            security: p.security.clone(),
            parcel: p.id,
            acquired: p.acquired.format("%Y-%m-%d").to_string(),
            kind: p.kind.display().to_string(),
            remaining: format_quantity(p.remaining_quantity),
            cost_per_unit: format_money(p.cost_base_per_unit),
            cost_base: format_money(p.remaining_cost_base()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ParcelView {
    security: String,
    parcel_id: u64,
    acquired: String,
    kind: String,
    remaining_quantity: String,
    cost_base_per_unit: String,
    cost_base: String,
}

impl From<&Parcel> for ParcelView {
    fn from(p: &Parcel) -> Self {
        ParcelView {
            security: p.security.clone(),
            parcel_id: p.id,
            acquired: p.acquired.format("%Y-%m-%d").to_string(),
            kind: p.kind.display().to_string(),
            remaining_quantity: p.remaining_quantity.to_string(),
            cost_base_per_unit: p.cost_base_per_unit.to_string(),
            cost_base: p.remaining_cost_base().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ParcelsOutput {
    parcels: Vec<ParcelView>,
}

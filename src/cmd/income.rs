//! Income command - dividend and distribution income totals

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cmd::{format_money, read_events, ConfigArgs};
use crate::core::{calculate, IncomeTotals};

#[derive(Args, Debug)]
pub struct IncomeCommand {
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

impl IncomeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let events = read_events(&self.events)?;
        let report = calculate(events, self.config.to_config())?;

        let by_security: Vec<(String, IncomeTotals)> = report
            .income
            .totals_by_security()
            .into_iter()
            .filter(|(security, _)| {
                self.security
                    .as_deref()
                    .is_none_or(|s| security.eq_ignore_ascii_case(s))
            })
            .collect();

        if self.json {
            self.print_json(&by_security)?;
        } else {
            self.print_table(&by_security);
        }
        Ok(())
    }

    fn print_table(&self, by_security: &[(String, IncomeTotals)]) {
        println!();
        println!("DIVIDEND AND DISTRIBUTION INCOME");
        println!();

        if by_security.is_empty() {
            println!("No income found matching filters");
            return;
        }

        let rows: Vec<IncomeRow> = by_security
            .iter()
            .map(|(security, totals)| IncomeRow::new(security, totals))
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        let grand: IncomeTotals = by_security.iter().fold(IncomeTotals::default(), |mut acc, (_, t)| {
            acc.cash_dividends += t.cash_dividends;
            acc.scrip_dividends += t.scrip_dividends;
            acc.capital_return_excess += t.capital_return_excess;
            acc
        });
        println!();
        println!("  Total income: {}", format_money(grand.total()));
    }

    fn print_json(&self, by_security: &[(String, IncomeTotals)]) -> anyhow::Result<()> {
        let securities: Vec<SecurityIncomeView> = by_security
            .iter()
            .map(|(security, totals)| SecurityIncomeView {
                security: security.clone(),
                cash_dividends: format!("{:.2}", totals.cash_dividends),
                scrip_dividends: format!("{:.2}", totals.scrip_dividends),
                capital_return_excess: format!("{:.2}", totals.capital_return_excess),
                total: format!("{:.2}", totals.total()),
            })
            .collect();

        let total: rust_decimal::Decimal =
            by_security.iter().map(|(_, t)| t.total()).sum();
        let output = IncomeOutput {
            securities,
            total_income: format!("{:.2}", total),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

#[derive(Debug, Tabled)]
struct IncomeRow {
    #[tabled(rename = "Security")]
    security: String,
    #[tabled(rename = "Cash Dividends")]
    cash: String,
    #[tabled(rename = "Scrip Dividends")]
    scrip: String,
    #[tabled(rename = "Capital Return Excess")]
    excess: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl IncomeRow {
    fn new(security: &str, totals: &IncomeTotals) -> Self {
        IncomeRow {
            security: security.to_string(),
            cash: format_money(totals.cash_dividends),
            scrip: format_money(totals.scrip_dividends),
            excess: format_money(totals.capital_return_excess),
            total: format_money(totals.total()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SecurityIncomeView {
    security: String,
    cash_dividends: String,
    scrip_dividends: String,
    capital_return_excess: String,
    total: String,
}

#[derive(Debug, Serialize)]
struct IncomeOutput {
    securities: Vec<SecurityIncomeView>,
    total_income: String,
}

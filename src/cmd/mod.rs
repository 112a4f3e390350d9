pub mod income;
pub mod parcels;
pub mod report;
pub mod validate;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::core::{
    events, BonusPolicy, LedgerConfig, MatchStrategy, RocExcessPolicy, TransactionEvent,
};

/// Read canonical events from a CSV or JSON file (or stdin with "-").
pub fn read_events(path: &Path) -> anyhow::Result<Vec<TransactionEvent>> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            events::read_json(reader)
        } else {
            events::read_csv(reader)
        }
    }
}

fn read_from_stdin() -> anyhow::Result<Vec<TransactionEvent>> {
    let mut buffer = Vec::new();
    BufReader::new(io::stdin().lock()).read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    // Sniff the format: JSON input opens with an object.
    let is_json = buffer
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');
    let cursor = io::Cursor::new(buffer);
    if is_json {
        events::read_json(cursor)
    } else {
        events::read_csv(cursor)
    }
}

/// Ledger configuration flags shared by every command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Lot matching strategy for disposals
    #[arg(long, value_enum, default_value_t = StrategyArg::Fifo)]
    strategy: StrategyArg,

    /// Minimum holding period in days for the CGT discount
    #[arg(long, default_value_t = 365)]
    discount_days: i64,

    /// Cost base policy for bonus issues
    #[arg(long, value_enum, default_value_t = BonusPolicyArg::ZeroCost)]
    bonus_policy: BonusPolicyArg,

    /// Treatment of a return of capital beyond a parcel's cost base
    #[arg(long, value_enum, default_value_t = RocExcessArg::Income)]
    roc_excess: RocExcessArg,

    /// Reject dividend events for securities with no open parcels
    #[arg(long)]
    dividends_require_position: bool,
}

impl ConfigArgs {
    pub fn to_config(&self) -> LedgerConfig {
        LedgerConfig {
            strategy: self.strategy.into(),
            discount_days: self.discount_days,
            bonus_policy: self.bonus_policy.into(),
            roc_excess: self.roc_excess.into(),
            dividends_require_position: self.dividends_require_position,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StrategyArg {
    #[default]
    Fifo,
    Lifo,
    SpecificId,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Fifo => MatchStrategy::Fifo,
            StrategyArg::Lifo => MatchStrategy::Lifo,
            StrategyArg::SpecificId => MatchStrategy::SpecificId,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BonusPolicyArg {
    #[default]
    ZeroCost,
    ProportionalSplit,
}

impl From<BonusPolicyArg> for BonusPolicy {
    fn from(arg: BonusPolicyArg) -> Self {
        match arg {
            BonusPolicyArg::ZeroCost => BonusPolicy::ZeroCost,
            BonusPolicyArg::ProportionalSplit => BonusPolicy::ProportionalSplit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum RocExcessArg {
    #[default]
    Income,
    Reject,
}

impl From<RocExcessArg> for RocExcessPolicy {
    fn from(arg: RocExcessArg) -> Self {
        match arg {
            RocExcessArg::Income => RocExcessPolicy::Income,
            RocExcessArg::Reject => RocExcessPolicy::Reject,
        }
    }
}

pub(crate) fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

pub(crate) fn format_quantity(qty: Decimal) -> String {
    let s = format!("{:.8}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::parcel::Parcel;

/// Holding-period classification for a realized gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

impl HoldingPeriod {
    pub fn display(&self) -> &'static str {
        match self {
            HoldingPeriod::ShortTerm => "Short",
            HoldingPeriod::LongTerm => "Long",
        }
    }
}

impl std::fmt::Display for HoldingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Realized gain or loss for one (disposal, parcel) pairing. A disposal
/// spanning several parcels yields one of these per parcel consumed.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizedGain {
    pub security: String,
    pub disposal_date: NaiveDate,
    /// Acquisition date of the parcel this slice came from.
    pub acquired: NaiveDate,
    pub parcel_id: u64,
    pub quantity: Decimal,
    /// Proceeds allocated to this slice, net of allocable disposal fees.
    pub proceeds: Decimal,
    pub cost_base: Decimal,
    /// Proceeds minus cost base; negative for a loss.
    pub gain: Decimal,
    pub holding: HoldingPeriod,
    /// Set only for positive long-term gains. Losses are never discounted.
    pub discount_eligible: bool,
}

/// Computes the realized gain for one parcel slice. Purely functional:
/// no side effects beyond the returned record.
///
/// `fee_share` is the portion of the disposal's fees allocated to this
/// slice; the ledger allocates pro-rata by quantity. Acquisition fees are
/// already inside the parcel's cost base per unit.
pub fn compute(
    parcel: &Parcel,
    quantity: Decimal,
    disposal_date: NaiveDate,
    unit_proceeds: Decimal,
    fee_share: Decimal,
    discount_days: i64,
) -> RealizedGain {
    let cost_base = quantity * parcel.cost_base_per_unit;
    let proceeds = quantity * unit_proceeds - fee_share;
    let gain = proceeds - cost_base;

    let held_days = (disposal_date - parcel.acquired).num_days();
    let holding = if held_days >= discount_days {
        HoldingPeriod::LongTerm
    } else {
        HoldingPeriod::ShortTerm
    };

    RealizedGain {
        security: parcel.security.clone(),
        disposal_date,
        acquired: parcel.acquired,
        parcel_id: parcel.id,
        quantity,
        proceeds,
        cost_base,
        gain,
        holding,
        discount_eligible: holding == HoldingPeriod::LongTerm && gain > Decimal::ZERO,
    }
}

/// CSV row for realized gain output
#[derive(Debug, Serialize, Deserialize)]
pub struct GainCsvRecord {
    pub security: String,
    pub disposal_date: String,
    pub acquired: String,
    pub parcel_id: u64,
    pub quantity: String,
    pub proceeds: String,
    pub cost_base: String,
    pub gain: String,
    pub holding: String,
    pub discount_eligible: bool,
}

impl From<&RealizedGain> for GainCsvRecord {
    fn from(g: &RealizedGain) -> Self {
        GainCsvRecord {
            security: g.security.clone(),
            disposal_date: g.disposal_date.format("%Y-%m-%d").to_string(),
            acquired: g.acquired.format("%Y-%m-%d").to_string(),
            parcel_id: g.parcel_id,
            quantity: g.quantity.to_string(),
            proceeds: g.proceeds.round_dp(2).to_string(),
            cost_base: g.cost_base.round_dp(2).to_string(),
            gain: g.gain.round_dp(2).to_string(),
            holding: g.holding.display().to_string(),
            discount_eligible: g.discount_eligible,
        }
    }
}

/// All realized gains from a calculation run, in disposal order.
#[derive(Debug, Default)]
pub struct GainsReport {
    pub records: Vec<RealizedGain>,
}

impl GainsReport {
    pub fn total_proceeds(&self) -> Decimal {
        self.records.iter().map(|g| g.proceeds).sum()
    }

    pub fn total_cost_base(&self) -> Decimal {
        self.records.iter().map(|g| g.cost_base).sum()
    }

    /// Gross gain before any discount.
    pub fn total_gain(&self) -> Decimal {
        self.records.iter().map(|g| g.gain).sum()
    }

    /// Sum of gains carrying the discount flag.
    pub fn discount_eligible_gain(&self) -> Decimal {
        self.records
            .iter()
            .filter(|g| g.discount_eligible)
            .map(|g| g.gain)
            .sum()
    }

    /// Net gain with the 50% discount applied to eligible gains. Losses and
    /// short-term gains pass through in full.
    pub fn net_gain_after_discount(&self) -> Decimal {
        self.records
            .iter()
            .map(|g| {
                if g.discount_eligible {
                    g.gain / dec!(2)
                } else {
                    g.gain
                }
            })
            .sum()
    }

    /// Write realized gains to CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for gain in &self.records {
            let record: GainCsvRecord = gain.into();
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parcel::AcquisitionKind;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn parcel(acquired: &str, cost_per_unit: Decimal) -> Parcel {
        Parcel::new(
            1,
            "CBA".to_string(),
            date(acquired),
            dec!(1000),
            cost_per_unit,
            AcquisitionKind::Purchase,
        )
    }

    #[test]
    fn gain_is_proceeds_minus_cost_base() {
        let p = parcel("2020-01-01", dec!(5));
        let g = compute(&p, dec!(150), date("2022-02-01"), dec!(8), Decimal::ZERO, 365);
        assert_eq!(g.cost_base, dec!(750));
        assert_eq!(g.proceeds, dec!(1200));
        assert_eq!(g.gain, dec!(450));
        assert_eq!(g.holding, HoldingPeriod::LongTerm);
        assert!(g.discount_eligible);
    }

    #[test]
    fn holding_period_boundary_at_365_days() {
        let p = parcel("2020-01-01", dec!(10));

        // 2020 is a leap year: 2020-12-31 is day 365.
        let long = compute(&p, dec!(10), date("2020-12-31"), dec!(12), Decimal::ZERO, 365);
        assert_eq!(long.holding, HoldingPeriod::LongTerm);

        let short = compute(&p, dec!(10), date("2020-12-30"), dec!(12), Decimal::ZERO, 365);
        assert_eq!(short.holding, HoldingPeriod::ShortTerm);
        assert!(!short.discount_eligible);
    }

    #[test]
    fn configured_threshold_respected() {
        let p = parcel("2020-01-01", dec!(10));
        let g = compute(&p, dec!(10), date("2020-07-01"), dec!(12), Decimal::ZERO, 180);
        assert_eq!(g.holding, HoldingPeriod::LongTerm);
    }

    #[test]
    fn long_term_loss_is_not_discount_eligible() {
        let p = parcel("2020-01-01", dec!(10));
        let g = compute(&p, dec!(10), date("2022-01-01"), dec!(4), Decimal::ZERO, 365);
        assert_eq!(g.gain, dec!(-60));
        assert_eq!(g.holding, HoldingPeriod::LongTerm);
        assert!(!g.discount_eligible);
    }

    #[test]
    fn fee_share_reduces_proceeds() {
        let p = parcel("2020-01-01", dec!(5));
        let g = compute(&p, dec!(100), date("2022-01-01"), dec!(8), dec!(20), 365);
        assert_eq!(g.proceeds, dec!(780));
        assert_eq!(g.gain, dec!(280));
    }

    #[test]
    fn report_totals_and_discount() {
        let p = parcel("2020-01-01", dec!(5));
        let eligible = compute(&p, dec!(100), date("2022-01-01"), dec!(8), Decimal::ZERO, 365);
        let short = compute(&p, dec!(100), date("2020-06-01"), dec!(8), Decimal::ZERO, 365);

        let report = GainsReport {
            records: vec![eligible, short],
        };
        assert_eq!(report.total_proceeds(), dec!(1600));
        assert_eq!(report.total_cost_base(), dec!(1000));
        assert_eq!(report.total_gain(), dec!(600));
        assert_eq!(report.discount_eligible_gain(), dec!(300));
        // 300 discounted to 150, plus 300 short-term
        assert_eq!(report.net_gain_after_discount(), dec!(450));
    }

    #[test]
    fn csv_output_contains_records() {
        let p = parcel("2020-01-01", dec!(5));
        let report = GainsReport {
            records: vec![compute(
                &p,
                dec!(100),
                date("2022-01-01"),
                dec!(8),
                Decimal::ZERO,
                365,
            )],
        };

        let mut output = Vec::new();
        report.write_csv(&mut output).unwrap();
        let csv_str = String::from_utf8(output).unwrap();

        let lines: Vec<_> = csv_str.lines().collect();
        assert_eq!(lines.len(), 2); // header + 1 row
        assert!(csv_str.contains("discount_eligible"));
        assert!(csv_str.contains("CBA"));
    }
}

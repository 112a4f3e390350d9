use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Classification of income separate from capital gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncomeKind {
    CashDividend,
    /// Cash-equivalent value of a dividend settled in shares.
    ScripDividend,
    /// Return of capital beyond a parcel's cost base.
    CapitalReturnExcess,
}

impl IncomeKind {
    pub fn display(&self) -> &'static str {
        match self {
            IncomeKind::CashDividend => "Cash Dividend",
            IncomeKind::ScripDividend => "Scrip Dividend",
            IncomeKind::CapitalReturnExcess => "Capital Return Excess",
        }
    }
}

/// One income event as recognized by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeRecord {
    pub security: String,
    pub date: NaiveDate,
    pub kind: IncomeKind,
    pub amount: Decimal,
}

/// Per-kind income totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncomeTotals {
    pub cash_dividends: Decimal,
    pub scrip_dividends: Decimal,
    pub capital_return_excess: Decimal,
}

impl IncomeTotals {
    pub fn total(&self) -> Decimal {
        self.cash_dividends + self.scrip_dividends + self.capital_return_excess
    }

    fn add(&mut self, record: &IncomeRecord) {
        match record.kind {
            IncomeKind::CashDividend => self.cash_dividends += record.amount,
            IncomeKind::ScripDividend => self.scrip_dividends += record.amount,
            IncomeKind::CapitalReturnExcess => self.capital_return_excess += record.amount,
        }
    }
}

/// Purely additive income aggregator. No deduplication: the caller is
/// responsible for recording each event exactly once.
#[derive(Debug, Default)]
pub struct IncomeReport {
    pub records: Vec<IncomeRecord>,
}

impl IncomeReport {
    pub fn record(&mut self, record: IncomeRecord) {
        log::debug!(
            "Income {} {}: {} {}",
            record.security,
            record.date,
            record.kind.display(),
            record.amount
        );
        self.records.push(record);
    }

    /// Grand totals across all securities.
    pub fn totals(&self) -> IncomeTotals {
        let mut totals = IncomeTotals::default();
        for record in &self.records {
            totals.add(record);
        }
        totals
    }

    /// Per-security totals, in security order.
    pub fn totals_by_security(&self) -> BTreeMap<String, IncomeTotals> {
        let mut map: BTreeMap<String, IncomeTotals> = BTreeMap::new();
        for record in &self.records {
            map.entry(record.security.clone()).or_default().add(record);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(security: &str, kind: IncomeKind, amount: Decimal) -> IncomeRecord {
        IncomeRecord {
            security: security.to_string(),
            date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            kind,
            amount,
        }
    }

    #[test]
    fn totals_accumulate_by_kind() {
        let mut report = IncomeReport::default();
        report.record(record("CBA", IncomeKind::CashDividend, dec!(50)));
        report.record(record("CBA", IncomeKind::CashDividend, dec!(60)));
        report.record(record("CBA", IncomeKind::ScripDividend, dec!(200)));
        report.record(record("BHP", IncomeKind::CapitalReturnExcess, dec!(15)));

        let totals = report.totals();
        assert_eq!(totals.cash_dividends, dec!(110));
        assert_eq!(totals.scrip_dividends, dec!(200));
        assert_eq!(totals.capital_return_excess, dec!(15));
        assert_eq!(totals.total(), dec!(325));
    }

    #[test]
    fn totals_by_security_partitioned() {
        let mut report = IncomeReport::default();
        report.record(record("CBA", IncomeKind::CashDividend, dec!(50)));
        report.record(record("BHP", IncomeKind::CashDividend, dec!(30)));

        let by_security = report.totals_by_security();
        assert_eq!(by_security.len(), 2);
        assert_eq!(by_security["CBA"].cash_dividends, dec!(50));
        assert_eq!(by_security["BHP"].cash_dividends, dec!(30));
    }

    #[test]
    fn no_deduplication_of_identical_records() {
        let mut report = IncomeReport::default();
        let r = record("CBA", IncomeKind::CashDividend, dec!(50));
        report.record(r.clone());
        report.record(r);
        assert_eq!(report.totals().cash_dividends, dec!(100));
    }
}

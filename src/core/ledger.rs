use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::config::{BonusPolicy, LedgerConfig, RocExcessPolicy};
use super::error::LedgerError;
use super::events::{sort_events, EventKind, TransactionEvent};
use super::gains::{self, GainsReport, RealizedGain};
use super::income::{IncomeKind, IncomeRecord, IncomeReport};
use super::matcher;
use super::parcel::{AcquisitionKind, Parcel};

/// Gains and income produced by applying a single event.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub gains: Vec<RealizedGain>,
    pub income: Option<IncomeRecord>,
}

/// Per-security parcel state.
#[derive(Debug, Default)]
struct SecurityBook {
    /// Parcels in acquisition order. Events arrive chronologically, so the
    /// vec is sorted by acquisition date with insertion-order tie-break,
    /// which is exactly the order the matcher requires.
    parcels: Vec<Parcel>,
    last_applied: Option<NaiveDate>,
}

impl SecurityBook {
    fn has_open_position(&self) -> bool {
        self.parcels.iter().any(Parcel::is_open)
    }

    fn open_parcels(&self) -> Vec<&Parcel> {
        self.parcels.iter().filter(|p| p.is_open()).collect()
    }

    fn open_quantity(&self) -> Decimal {
        self.parcels.iter().map(|p| p.remaining_quantity).sum()
    }
}

/// The mutable set of open acquisition parcels, per security.
///
/// `apply` is atomic: an event either fully mutates the ledger or returns an
/// error leaving it untouched. Events for a security must arrive in
/// non-decreasing date order; `sort_events` (or `calculate`) establishes the
/// same-day secondary order.
#[derive(Debug)]
pub struct ParcelLedger {
    config: LedgerConfig,
    books: BTreeMap<String, SecurityBook>,
    next_parcel_id: u64,
}

impl ParcelLedger {
    pub fn new(config: LedgerConfig) -> Self {
        ParcelLedger {
            config,
            books: BTreeMap::new(),
            next_parcel_id: 1,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open parcels for one security, acquisition-date order with
    /// insertion-order tie-break.
    pub fn open_parcels(&self, security: &str) -> Vec<&Parcel> {
        self.books
            .get(security)
            .map(SecurityBook::open_parcels)
            .unwrap_or_default()
    }

    /// All open parcels across securities, in security then acquisition order.
    pub fn all_open_parcels(&self) -> Vec<&Parcel> {
        self.books
            .values()
            .flat_map(|book| book.parcels.iter().filter(|p| p.is_open()))
            .collect()
    }

    /// Net open position for a security.
    pub fn open_quantity(&self, security: &str) -> Decimal {
        self.books
            .get(security)
            .map(SecurityBook::open_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Applies one event. On error the ledger is unchanged.
    pub fn apply(&mut self, event: &TransactionEvent) -> Result<ApplyOutcome, LedgerError> {
        event.validate()?;

        if let Some(book) = self.books.get(&event.security) {
            if let Some(last) = book.last_applied {
                if event.date < last {
                    return Err(LedgerError::OutOfOrderEvent {
                        security: event.security.clone(),
                        date: event.date,
                        last_applied: last,
                    });
                }
            }
        }

        let outcome = match &event.kind {
            EventKind::Acquisition {
                quantity,
                unit_price,
                fees,
            } => {
                // Allocable fees fold into the per-unit cost base.
                let cost_base_per_unit = unit_price + fees / quantity;
                self.append_parcel(event, *quantity, cost_base_per_unit, AcquisitionKind::Purchase);
                ApplyOutcome::default()
            }
            EventKind::Disposal {
                quantity,
                unit_price,
                fees,
                parcel_ids,
            } => self.apply_disposal(event, *quantity, *unit_price, *fees, parcel_ids.as_deref())?,
            EventKind::Split { ratio } | EventKind::Consolidation { ratio } => {
                self.apply_rescale(event, *ratio)?;
                ApplyOutcome::default()
            }
            EventKind::BonusIssue { quantity } => {
                self.apply_bonus(event, *quantity)?;
                ApplyOutcome::default()
            }
            EventKind::ScripDividend {
                quantity,
                unit_price,
            } => self.apply_scrip(event, *quantity, *unit_price)?,
            EventKind::ReturnOfCapital { amount_per_unit } => {
                self.apply_return_of_capital(event, *amount_per_unit)?
            }
            EventKind::CashDividend { amount } => self.apply_cash_dividend(event, *amount)?,
        };

        self.books
            .entry(event.security.clone())
            .or_default()
            .last_applied = Some(event.date);
        Ok(outcome)
    }

    fn apply_disposal(
        &mut self,
        event: &TransactionEvent,
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
        parcel_ids: Option<&[u64]>,
    ) -> Result<ApplyOutcome, LedgerError> {
        self.ensure_open_position(event)?;
        let strategy = self.config.strategy;
        let discount_days = self.config.discount_days;

        let book = self
            .books
            .entry(event.security.clone())
            .or_default();

        // Plan against the immutable view, then commit. The plan either
        // covers the full quantity or errors, so nothing is half-applied.
        let open = book.open_parcels();
        let matches = matcher::plan(
            strategy,
            &open,
            &event.security,
            event.date,
            quantity,
            parcel_ids,
        )?;

        let mut realized = Vec::with_capacity(matches.len());
        for m in &matches {
            if let Some(parcel) = open.iter().find(|p| p.id == m.parcel_id) {
                let fee_share = fees * m.quantity / quantity;
                realized.push(gains::compute(
                    parcel,
                    m.quantity,
                    event.date,
                    unit_price,
                    fee_share,
                    discount_days,
                ));
            }
        }
        drop(open);

        for m in &matches {
            if let Some(parcel) = book.parcels.iter_mut().find(|p| p.id == m.parcel_id) {
                parcel.consume(m.quantity);
            }
        }

        Ok(ApplyOutcome {
            gains: realized,
            income: None,
        })
    }

    fn apply_rescale(&mut self, event: &TransactionEvent, ratio: Decimal) -> Result<(), LedgerError> {
        self.ensure_open_position(event)?;
        let book = self.books.entry(event.security.clone()).or_default();
        for parcel in book.parcels.iter_mut().filter(|p| p.is_open()) {
            parcel.rescale(ratio);
        }
        Ok(())
    }

    fn apply_bonus(&mut self, event: &TransactionEvent, quantity: Decimal) -> Result<(), LedgerError> {
        self.ensure_open_position(event)?;
        match self.config.bonus_policy {
            BonusPolicy::ZeroCost => {
                self.append_parcel(event, quantity, Decimal::ZERO, AcquisitionKind::BonusIssue);
            }
            BonusPolicy::ProportionalSplit => {
                // The bonus parcel takes its pro-rata share of the existing
                // cost base; total cost base across the security is conserved.
                let (open_quantity, open_cost_base) = self
                    .books
                    .get(&event.security)
                    .map(|book| {
                        (
                            book.open_quantity(),
                            book.parcels
                                .iter()
                                .filter(|p| p.is_open())
                                .map(Parcel::remaining_cost_base)
                                .sum::<Decimal>(),
                        )
                    })
                    .unwrap_or_default();

                let diluted = open_quantity + quantity;
                let factor = open_quantity / diluted;
                let bonus_cost_per_unit = open_cost_base / diluted;

                let book = self.books.entry(event.security.clone()).or_default();
                for parcel in book.parcels.iter_mut().filter(|p| p.is_open()) {
                    parcel.scale_cost_base(factor);
                }
                self.append_parcel(event, quantity, bonus_cost_per_unit, AcquisitionKind::BonusIssue);
            }
        }
        Ok(())
    }

    fn apply_scrip(
        &mut self,
        event: &TransactionEvent,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<ApplyOutcome, LedgerError> {
        if self.config.dividends_require_position {
            self.ensure_open_position(event)?;
        }
        self.append_parcel(event, quantity, unit_price, AcquisitionKind::DividendReinvestment);
        Ok(ApplyOutcome {
            gains: Vec::new(),
            income: Some(IncomeRecord {
                security: event.security.clone(),
                date: event.date,
                kind: IncomeKind::ScripDividend,
                amount: quantity * unit_price,
            }),
        })
    }

    fn apply_return_of_capital(
        &mut self,
        event: &TransactionEvent,
        amount_per_unit: Decimal,
    ) -> Result<ApplyOutcome, LedgerError> {
        self.ensure_open_position(event)?;

        if self.config.roc_excess == RocExcessPolicy::Reject {
            if let Some(book) = self.books.get(&event.security) {
                for parcel in book.parcels.iter().filter(|p| p.is_open()) {
                    if parcel.cost_base_per_unit < amount_per_unit {
                        return Err(LedgerError::NegativeCostBase {
                            security: event.security.clone(),
                            date: event.date,
                            parcel_id: parcel.id,
                            excess: amount_per_unit - parcel.cost_base_per_unit,
                        });
                    }
                }
            }
        }

        let book = self.books.entry(event.security.clone()).or_default();
        let mut excess = Decimal::ZERO;
        for parcel in book.parcels.iter_mut().filter(|p| p.is_open()) {
            excess += parcel.reduce_cost_base(amount_per_unit);
        }

        let income = if excess > Decimal::ZERO {
            Some(IncomeRecord {
                security: event.security.clone(),
                date: event.date,
                kind: IncomeKind::CapitalReturnExcess,
                amount: excess,
            })
        } else {
            None
        };
        Ok(ApplyOutcome {
            gains: Vec::new(),
            income,
        })
    }

    fn apply_cash_dividend(
        &mut self,
        event: &TransactionEvent,
        amount: Decimal,
    ) -> Result<ApplyOutcome, LedgerError> {
        if self.config.dividends_require_position {
            self.ensure_open_position(event)?;
        }
        Ok(ApplyOutcome {
            gains: Vec::new(),
            income: Some(IncomeRecord {
                security: event.security.clone(),
                date: event.date,
                kind: IncomeKind::CashDividend,
                amount,
            }),
        })
    }

    fn ensure_open_position(&self, event: &TransactionEvent) -> Result<(), LedgerError> {
        let open = self
            .books
            .get(&event.security)
            .is_some_and(SecurityBook::has_open_position);
        if open {
            Ok(())
        } else {
            Err(LedgerError::NoOpenPosition {
                security: event.security.clone(),
                date: event.date,
                event: event.describe(),
            })
        }
    }

    fn append_parcel(
        &mut self,
        event: &TransactionEvent,
        quantity: Decimal,
        cost_base_per_unit: Decimal,
        kind: AcquisitionKind,
    ) {
        let id = self.next_parcel_id;
        self.next_parcel_id += 1;
        let parcel = Parcel::new(
            id,
            event.security.clone(),
            event.date,
            quantity,
            cost_base_per_unit,
            kind,
        );
        self.books
            .entry(event.security.clone())
            .or_default()
            .parcels
            .push(parcel);
    }
}

/// Result of a full calculation run: realized gains, income, and the final
/// ledger state for open-parcel listings.
#[derive(Debug)]
pub struct TaxReport {
    pub gains: GainsReport,
    pub income: IncomeReport,
    pub ledger: ParcelLedger,
}

/// Sorts the events and applies them all, collecting realized gains and
/// income. Stops at the first failing event and propagates its error.
pub fn calculate(
    mut events: Vec<TransactionEvent>,
    config: LedgerConfig,
) -> Result<TaxReport, LedgerError> {
    sort_events(&mut events);

    let mut ledger = ParcelLedger::new(config);
    let mut gains = GainsReport::default();
    let mut income = IncomeReport::default();

    for event in &events {
        let outcome = ledger.apply(event)?;
        gains.records.extend(outcome.gains);
        if let Some(record) = outcome.income {
            income.record(record);
        }
    }

    Ok(TaxReport {
        gains,
        income,
        ledger,
    })
}

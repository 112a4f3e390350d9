use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;

use super::error::LedgerError;

/// Unified JSON input format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsInput {
    pub events: Vec<EventRecord>,
}

/// A canonical portfolio event for one security, already normalized from
/// whatever broker or dividend-ledger format it came from. Upstream
/// normalizers produce these; the core never sees raw broker rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    pub security: String,
    pub date: NaiveDate,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Purchase of shares. `unit_price` is per share; `fees` are allocable
    /// brokerage added to the parcel's cost base.
    Acquisition {
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
    },
    /// Sale of shares. `fees` are deducted from proceeds. `parcel_ids` is
    /// only consulted under the specific-ID matching strategy.
    Disposal {
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
        parcel_ids: Option<Vec<u64>>,
    },
    /// Share split: quantities scale by `ratio` (> 1), per-unit cost base
    /// scales inversely. Not a taxable event.
    Split { ratio: Decimal },
    /// Share consolidation: same arithmetic as a split with `ratio` < 1.
    Consolidation { ratio: Decimal },
    /// Bonus issue of `quantity` new shares. Cost base treatment is a
    /// ledger policy choice.
    BonusIssue { quantity: Decimal },
    /// Dividend settled in shares at a declared reinvestment price. Creates
    /// a parcel and recognizes the cash-equivalent value as income.
    ScripDividend {
        quantity: Decimal,
        unit_price: Decimal,
    },
    /// Capital returned per share, reducing cost bases without a disposal.
    ReturnOfCapital { amount_per_unit: Decimal },
    /// Cash dividend. No parcel mutation.
    CashDividend { amount: Decimal },
}

impl TransactionEvent {
    /// Short lowercase name for error messages and logs.
    pub fn describe(&self) -> &'static str {
        match self.kind {
            EventKind::Acquisition { .. } => "acquisition",
            EventKind::Disposal { .. } => "disposal",
            EventKind::Split { .. } => "split",
            EventKind::Consolidation { .. } => "consolidation",
            EventKind::BonusIssue { .. } => "bonus issue",
            EventKind::ScripDividend { .. } => "scrip dividend",
            EventKind::ReturnOfCapital { .. } => "return of capital",
            EventKind::CashDividend { .. } => "cash dividend",
        }
    }

    /// Checks quantities, prices, ratios and amounts for shape errors.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match &self.kind {
            EventKind::Acquisition {
                quantity,
                unit_price,
                fees,
            } => {
                self.require_positive("quantity", *quantity)?;
                self.require_non_negative("unit_price", *unit_price)?;
                self.require_non_negative("fees", *fees)
            }
            EventKind::Disposal {
                quantity,
                unit_price,
                fees,
                ..
            } => {
                self.require_positive("quantity", *quantity)?;
                self.require_non_negative("unit_price", *unit_price)?;
                self.require_non_negative("fees", *fees)
            }
            EventKind::Split { ratio } | EventKind::Consolidation { ratio } => {
                self.require_positive("ratio", *ratio)
            }
            EventKind::BonusIssue { quantity } => self.require_positive("quantity", *quantity),
            EventKind::ScripDividend {
                quantity,
                unit_price,
            } => {
                self.require_positive("quantity", *quantity)?;
                self.require_non_negative("unit_price", *unit_price)
            }
            EventKind::ReturnOfCapital { amount_per_unit } => {
                self.require_positive("amount_per_unit", *amount_per_unit)
            }
            EventKind::CashDividend { amount } => self.require_positive("amount", *amount),
        }
    }

    fn require_positive(&self, field: &str, value: Decimal) -> Result<(), LedgerError> {
        if value <= Decimal::ZERO {
            return Err(self.invalid(format!("{field} must be positive, got {value}")));
        }
        Ok(())
    }

    fn require_non_negative(&self, field: &str, value: Decimal) -> Result<(), LedgerError> {
        if value < Decimal::ZERO {
            return Err(self.invalid(format!("{field} must not be negative, got {value}")));
        }
        Ok(())
    }

    pub(crate) fn invalid(&self, reason: String) -> LedgerError {
        LedgerError::InvalidEventPayload {
            security: self.security.clone(),
            date: self.date,
            reason,
        }
    }

    /// Secondary sort rank for same-day events: acquisition-like events
    /// land before quantity/cost adjustments, which land before disposals,
    /// so a same-day buy-then-sell never sees a spurious short position.
    fn same_day_rank(&self) -> u8 {
        match self.kind {
            EventKind::Acquisition { .. }
            | EventKind::BonusIssue { .. }
            | EventKind::ScripDividend { .. } => 0,
            EventKind::Split { .. }
            | EventKind::Consolidation { .. }
            | EventKind::ReturnOfCapital { .. }
            | EventKind::CashDividend { .. } => 1,
            EventKind::Disposal { .. } => 2,
        }
    }
}

/// Orders events by date then same-day rank. Stable, so input order is the
/// final tie-break; re-running on the same input yields identical results.
pub fn sort_events(events: &mut [TransactionEvent]) {
    events.sort_by_key(|e| (e.date, e.same_day_rank()));
}

/// CSV/JSON row format for canonical events. Type-specific columns are
/// optional; conversion checks that the right ones are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub date: String,
    pub event_type: String,
    pub security: String,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub ratio: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub fees: Option<Decimal>,
    /// Semicolon-separated parcel ids, only meaningful for disposals under
    /// the specific-ID strategy.
    #[serde(default)]
    pub parcel_ids: Option<String>,
}

impl EventRecord {
    pub fn into_event(self) -> anyhow::Result<TransactionEvent> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|_| {
            anyhow::anyhow!(
                "{}: invalid date '{}', expected YYYY-MM-DD",
                self.security,
                self.date
            )
        })?;

        let missing = |field: &str| {
            anyhow::anyhow!(
                "{} {} on {}: missing required field '{}'",
                self.security,
                self.event_type,
                date,
                field
            )
        };

        let kind = match self.event_type.as_str() {
            "Acquisition" => EventKind::Acquisition {
                quantity: self.quantity.ok_or_else(|| missing("quantity"))?,
                unit_price: self.unit_price.ok_or_else(|| missing("unit_price"))?,
                fees: self.fees.unwrap_or(Decimal::ZERO),
            },
            "Disposal" => EventKind::Disposal {
                quantity: self.quantity.ok_or_else(|| missing("quantity"))?,
                unit_price: self.unit_price.ok_or_else(|| missing("unit_price"))?,
                fees: self.fees.unwrap_or(Decimal::ZERO),
                parcel_ids: self
                    .parcel_ids
                    .as_deref()
                    .map(parse_parcel_ids)
                    .transpose()?,
            },
            "Split" => EventKind::Split {
                ratio: self.ratio.ok_or_else(|| missing("ratio"))?,
            },
            "Consolidation" => EventKind::Consolidation {
                ratio: self.ratio.ok_or_else(|| missing("ratio"))?,
            },
            "BonusIssue" => EventKind::BonusIssue {
                quantity: self.quantity.ok_or_else(|| missing("quantity"))?,
            },
            "ScripDividend" => EventKind::ScripDividend {
                quantity: self.quantity.ok_or_else(|| missing("quantity"))?,
                unit_price: self.unit_price.ok_or_else(|| missing("unit_price"))?,
            },
            "ReturnOfCapital" => EventKind::ReturnOfCapital {
                amount_per_unit: self.amount.ok_or_else(|| missing("amount"))?,
            },
            "CashDividend" => EventKind::CashDividend {
                amount: self.amount.ok_or_else(|| missing("amount"))?,
            },
            other => anyhow::bail!("{}: unknown event type '{}'", self.security, other),
        };

        let event = TransactionEvent {
            security: self.security,
            date,
            kind,
        };
        event.validate()?;
        Ok(event)
    }
}

fn parse_parcel_ids(s: &str) -> anyhow::Result<Vec<u64>> {
    s.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| anyhow::anyhow!("invalid parcel id '{}'", part))
        })
        .collect()
}

/// Read canonical events from CSV, sorted ready for the ledger.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<TransactionEvent>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records: Result<Vec<EventRecord>, _> = rdr.deserialize::<EventRecord>().collect();
    let mut events = records?
        .into_iter()
        .map(EventRecord::into_event)
        .collect::<anyhow::Result<Vec<_>>>()?;
    sort_events(&mut events);
    Ok(events)
}

/// Read canonical events from JSON, sorted ready for the ledger.
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Vec<TransactionEvent>> {
    let input: EventsInput = serde_json::from_reader(reader)?;
    let mut events = input
        .events
        .into_iter()
        .map(EventRecord::into_event)
        .collect::<anyhow::Result<Vec<_>>>()?;
    sort_events(&mut events);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parse_csv_events() {
        let csv_data = "\
date,event_type,security,quantity,unit_price,ratio,amount,fees,parcel_ids
2020-01-01,Acquisition,CBA,100,10.00,,,19.95,
2021-01-01,Split,CBA,,,2,,,
2021-06-01,CashDividend,CBA,,,,50.00,,
2022-02-01,Disposal,CBA,150,8.00,,,19.95,
";
        let events = read_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(events.len(), 4);

        assert_eq!(events[0].date, date("2020-01-01"));
        assert_eq!(
            events[0].kind,
            EventKind::Acquisition {
                quantity: dec!(100),
                unit_price: dec!(10.00),
                fees: dec!(19.95),
            }
        );
        assert_eq!(events[1].kind, EventKind::Split { ratio: dec!(2) });
        assert_eq!(
            events[2].kind,
            EventKind::CashDividend {
                amount: dec!(50.00)
            }
        );
        assert!(matches!(events[3].kind, EventKind::Disposal { .. }));
    }

    #[test]
    fn parse_json_events() {
        let json_data = r#"{
            "events": [
                {
                    "date": "2020-01-01",
                    "event_type": "Acquisition",
                    "security": "BHP",
                    "quantity": 50,
                    "unit_price": 38.20
                }
            ]
        }"#;

        let events = read_json(json_data.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].security, "BHP");
    }

    #[test]
    fn same_day_acquisition_sorts_before_disposal() {
        let mut events = vec![
            TransactionEvent {
                security: "CBA".into(),
                date: date("2020-01-01"),
                kind: EventKind::Disposal {
                    quantity: dec!(50),
                    unit_price: dec!(11),
                    fees: Decimal::ZERO,
                    parcel_ids: None,
                },
            },
            TransactionEvent {
                security: "CBA".into(),
                date: date("2020-01-01"),
                kind: EventKind::Acquisition {
                    quantity: dec!(100),
                    unit_price: dec!(10),
                    fees: Decimal::ZERO,
                },
            },
        ];
        sort_events(&mut events);
        assert!(matches!(events[0].kind, EventKind::Acquisition { .. }));
        assert!(matches!(events[1].kind, EventKind::Disposal { .. }));
    }

    #[test]
    fn sort_is_stable_within_rank() {
        let acq = |price: Decimal| TransactionEvent {
            security: "CBA".into(),
            date: date("2020-01-01"),
            kind: EventKind::Acquisition {
                quantity: dec!(10),
                unit_price: price,
                fees: Decimal::ZERO,
            },
        };
        let mut events = vec![acq(dec!(1)), acq(dec!(2)), acq(dec!(3))];
        sort_events(&mut events);
        let prices: Vec<_> = events
            .iter()
            .map(|e| match e.kind {
                EventKind::Acquisition { unit_price, .. } => unit_price,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(prices, vec![dec!(1), dec!(2), dec!(3)]);
    }

    #[test]
    fn missing_field_rejected() {
        let record = EventRecord {
            date: "2020-01-01".into(),
            event_type: "Split".into(),
            security: "CBA".into(),
            quantity: None,
            unit_price: None,
            ratio: None,
            amount: None,
            fees: None,
            parcel_ids: None,
        };
        let err = record.into_event().unwrap_err();
        assert!(err.to_string().contains("ratio"));
    }

    #[test]
    fn non_positive_ratio_rejected() {
        let event = TransactionEvent {
            security: "CBA".into(),
            date: date("2020-01-01"),
            kind: EventKind::Split { ratio: dec!(0) },
        };
        let err = event.validate().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEventPayload { .. }));
    }

    #[test]
    fn parcel_ids_parsed_from_csv_field() {
        let record = EventRecord {
            date: "2020-01-01".into(),
            event_type: "Disposal".into(),
            security: "CBA".into(),
            quantity: Some(dec!(10)),
            unit_price: Some(dec!(5)),
            ratio: None,
            amount: None,
            fees: None,
            parcel_ids: Some("3; 1".into()),
        };
        let event = record.into_event().unwrap();
        match event.kind {
            EventKind::Disposal { parcel_ids, .. } => {
                assert_eq!(parcel_ids, Some(vec![3, 1]));
            }
            _ => unreachable!(),
        }
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Errors raised while applying events to the parcel ledger.
///
/// Every variant carries the security and event date so the caller can
/// surface the failing event verbatim. Applying an event is atomic: when one
/// of these is returned, the ledger is unchanged.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{security}: no open position on {date} for {event}")]
    NoOpenPosition {
        security: String,
        date: NaiveDate,
        event: &'static str,
    },

    #[error("{security}: disposal of {requested} on {date} exceeds open quantity {available}")]
    InsufficientQuantity {
        security: String,
        date: NaiveDate,
        requested: Decimal,
        available: Decimal,
    },

    #[error(
        "{security}: return of capital on {date} would drive parcel {parcel_id} \
         cost base negative by {excess} per unit"
    )]
    NegativeCostBase {
        security: String,
        date: NaiveDate,
        parcel_id: u64,
        excess: Decimal,
    },

    #[error("{security}: event dated {date} precedes last applied event on {last_applied}")]
    OutOfOrderEvent {
        security: String,
        date: NaiveDate,
        last_applied: NaiveDate,
    },

    #[error("{security}: invalid event payload on {date}: {reason}")]
    InvalidEventPayload {
        security: String,
        date: NaiveDate,
        reason: String,
    },
}

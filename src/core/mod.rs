pub mod config;
pub mod error;
pub mod events;
pub mod gains;
pub mod income;
pub mod ledger;
pub mod matcher;
pub mod parcel;

// Flat public surface for domain types and functions.
pub use config::{BonusPolicy, LedgerConfig, MatchStrategy, RocExcessPolicy};
pub use error::LedgerError;
pub use events::{read_csv, read_json, sort_events, EventKind, EventRecord, TransactionEvent};
pub use gains::{GainsReport, HoldingPeriod, RealizedGain};
pub use income::{IncomeKind, IncomeRecord, IncomeReport, IncomeTotals};
pub use ledger::{calculate, ApplyOutcome, ParcelLedger, TaxReport};
pub use parcel::{AcquisitionKind, Parcel};

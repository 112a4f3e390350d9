use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::config::MatchStrategy;
use super::error::LedgerError;
use super::parcel::Parcel;

/// One planned consumption of an open parcel by a disposal.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelMatch {
    pub parcel_id: u64,
    pub quantity: Decimal,
}

/// Plans which open parcels a disposal consumes and in what order, without
/// mutating anything. The ledger commits the plan only after it is known to
/// cover the full disposal quantity, which keeps `apply` all-or-nothing.
///
/// `parcels` must be the open parcels in acquisition-date order with
/// insertion-order tie-break, which is how the ledger stores them. That
/// makes FIFO a front-to-back walk and LIFO the reverse, both deterministic.
pub fn plan(
    strategy: MatchStrategy,
    parcels: &[&Parcel],
    security: &str,
    date: NaiveDate,
    quantity: Decimal,
    parcel_ids: Option<&[u64]>,
) -> Result<Vec<ParcelMatch>, LedgerError> {
    match strategy {
        MatchStrategy::Fifo => plan_ordered(parcels.iter().copied(), security, date, quantity),
        MatchStrategy::Lifo => {
            plan_ordered(parcels.iter().rev().copied(), security, date, quantity)
        }
        MatchStrategy::SpecificId => {
            let ids = parcel_ids.ok_or_else(|| LedgerError::InvalidEventPayload {
                security: security.to_string(),
                date,
                reason: "specific-ID matching requires parcel_ids on the disposal".to_string(),
            })?;
            plan_specific(parcels, security, date, quantity, ids)
        }
    }
}

fn plan_ordered<'a>(
    parcels: impl Iterator<Item = &'a Parcel> + Clone,
    security: &str,
    date: NaiveDate,
    quantity: Decimal,
) -> Result<Vec<ParcelMatch>, LedgerError> {
    let available: Decimal = parcels.clone().map(|p| p.remaining_quantity).sum();
    if quantity > available {
        return Err(LedgerError::InsufficientQuantity {
            security: security.to_string(),
            date,
            requested: quantity,
            available,
        });
    }

    let mut matches = Vec::new();
    let mut remaining = quantity;
    for parcel in parcels {
        if remaining.is_zero() {
            break;
        }
        let consumed = remaining.min(parcel.remaining_quantity);
        matches.push(ParcelMatch {
            parcel_id: parcel.id,
            quantity: consumed,
        });
        remaining -= consumed;
    }
    Ok(matches)
}

fn plan_specific(
    parcels: &[&Parcel],
    security: &str,
    date: NaiveDate,
    quantity: Decimal,
    ids: &[u64],
) -> Result<Vec<ParcelMatch>, LedgerError> {
    let mut selected = Vec::with_capacity(ids.len());
    for id in ids {
        let parcel = parcels
            .iter()
            .find(|p| p.id == *id)
            .ok_or_else(|| LedgerError::InvalidEventPayload {
                security: security.to_string(),
                date,
                reason: format!("parcel {id} is not an open parcel of {security}"),
            })?;
        selected.push(*parcel);
    }

    let available: Decimal = selected.iter().map(|p| p.remaining_quantity).sum();
    if quantity > available {
        return Err(LedgerError::InsufficientQuantity {
            security: security.to_string(),
            date,
            requested: quantity,
            available,
        });
    }

    let mut matches = Vec::new();
    let mut remaining = quantity;
    for parcel in selected {
        if remaining.is_zero() {
            break;
        }
        let consumed = remaining.min(parcel.remaining_quantity);
        matches.push(ParcelMatch {
            parcel_id: parcel.id,
            quantity: consumed,
        });
        remaining -= consumed;
    }
    Ok(matches)
}

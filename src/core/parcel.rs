use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// How a parcel came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcquisitionKind {
    Purchase,
    DividendReinvestment,
    BonusIssue,
    Transfer,
}

impl AcquisitionKind {
    pub fn display(&self) -> &'static str {
        match self {
            AcquisitionKind::Purchase => "Purchase",
            AcquisitionKind::DividendReinvestment => "DRP",
            AcquisitionKind::BonusIssue => "Bonus",
            AcquisitionKind::Transfer => "Transfer",
        }
    }
}

/// One still-open acquisition lot of a security, tracked separately for
/// cost-basis purposes until fully disposed.
///
/// Remaining quantity only decreases, via disposal or corporate-action
/// cancellation. The per-unit cost base only changes via corporate-action
/// adjustment, never via disposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    /// Insertion sequence number, unique across the ledger. Used as the
    /// tie-break for same-date parcels and as the specific-ID handle.
    pub id: u64,
    pub security: String,
    pub acquired: NaiveDate,
    pub original_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub cost_base_per_unit: Decimal,
    pub kind: AcquisitionKind,
}

impl Parcel {
    pub fn new(
        id: u64,
        security: String,
        acquired: NaiveDate,
        quantity: Decimal,
        cost_base_per_unit: Decimal,
        kind: AcquisitionKind,
    ) -> Self {
        log::debug!(
            "Parcel {} NEW {}: {} @ {} on {} ({})",
            id,
            security,
            quantity,
            cost_base_per_unit,
            acquired,
            kind.display()
        );
        Parcel {
            id,
            security,
            acquired,
            original_quantity: quantity,
            remaining_quantity: quantity,
            cost_base_per_unit,
            kind,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.remaining_quantity.is_zero()
    }

    /// Total cost base attributed to the unsold remainder.
    pub fn remaining_cost_base(&self) -> Decimal {
        self.remaining_quantity * self.cost_base_per_unit
    }

    /// Applies a split or consolidation ratio: quantity scales by `ratio`,
    /// per-unit cost base scales inversely, so total cost base is conserved.
    pub fn rescale(&mut self, ratio: Decimal) {
        self.original_quantity *= ratio;
        self.remaining_quantity *= ratio;
        self.cost_base_per_unit /= ratio;
        log::debug!(
            "Parcel {} RESCALE {}: x{} -> {} @ {}",
            self.id,
            self.security,
            ratio,
            self.remaining_quantity,
            self.cost_base_per_unit
        );
    }

    /// Reduces the per-unit cost base by `amount_per_unit`, clamping at
    /// zero. Returns the total excess over the remaining quantity, which
    /// the ledger recognizes per its configured policy.
    pub fn reduce_cost_base(&mut self, amount_per_unit: Decimal) -> Decimal {
        let applied = amount_per_unit.min(self.cost_base_per_unit);
        let excess_per_unit = amount_per_unit - applied;
        self.cost_base_per_unit -= applied;
        log::debug!(
            "Parcel {} REDUCE {}: -{}/unit -> {} @ {} (excess {}/unit)",
            self.id,
            self.security,
            applied,
            self.remaining_quantity,
            self.cost_base_per_unit,
            excess_per_unit
        );
        excess_per_unit * self.remaining_quantity
    }

    /// Scales the per-unit cost base by `factor`. Used by the proportional
    /// bonus-issue policy, where the quantity is unchanged but part of the
    /// cost base moves to the bonus parcel.
    pub fn scale_cost_base(&mut self, factor: Decimal) {
        self.cost_base_per_unit *= factor;
        log::debug!(
            "Parcel {} SCALE {}: x{} -> {} per unit",
            self.id,
            self.security,
            factor,
            self.cost_base_per_unit
        );
    }

    /// Consumes `quantity` from the remainder. The caller (the ledger's
    /// disposal commit) has already checked `quantity <= remaining_quantity`.
    pub fn consume(&mut self, quantity: Decimal) {
        debug_assert!(quantity <= self.remaining_quantity);
        self.remaining_quantity -= quantity;
        log::debug!(
            "Parcel {} CONSUME {}: -{} -> {} remaining",
            self.id,
            self.security,
            quantity,
            self.remaining_quantity
        );
    }
}

/// Lot selection strategy used to match disposals against open parcels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Earliest acquisition first, ties broken by parcel insertion order.
    /// The default: deterministic and the treatment most jurisdictions
    /// assume absent explicit identification.
    #[default]
    Fifo,
    /// Latest acquisition first.
    Lifo,
    /// The disposal event names the parcel ids to consume, in order.
    SpecificId,
}

/// Cost base treatment for bonus issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BonusPolicy {
    /// Bonus parcel is created with a zero cost base (conservative default).
    #[default]
    ZeroCost,
    /// Bonus parcel takes a pro-rata share of the existing parcels' cost
    /// base, so total cost base is conserved across the issue.
    ProportionalSplit,
}

/// What to do when a return of capital exceeds a parcel's cost base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RocExcessPolicy {
    /// Clamp the cost base at zero and recognize the excess as income.
    #[default]
    Income,
    /// Reject the event with `NegativeCostBase`.
    Reject,
}

/// Ledger behavior knobs. Defaults follow Australian CGT treatment:
/// FIFO matching and a 365-day discount holding period.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub strategy: MatchStrategy,
    /// Minimum holding period in days for a gain to be discount-eligible.
    pub discount_days: i64,
    pub bonus_policy: BonusPolicy,
    pub roc_excess: RocExcessPolicy,
    /// When true, dividend events against a security with no open parcels
    /// fail with `NoOpenPosition` instead of being recorded unconditionally.
    pub dividends_require_position: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            strategy: MatchStrategy::Fifo,
            discount_days: 365,
            bonus_policy: BonusPolicy::ZeroCost,
            roc_excess: RocExcessPolicy::Income,
            dividends_require_position: false,
        }
    }
}

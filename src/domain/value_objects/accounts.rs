use chrono::{DateTime, Utc};

use crate::domain::{
    entities::accounts::AccountEntity, value_objects::enums::subscription_tiers::SubscriptionTier,
};

/// A tier change applied as one conditional write.
///
/// Each variant names the tier the row must currently hold. `Reactivate` and `Expire` also
/// carry the instant used for the period predicate so the two can never both match the same
/// row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierTransition {
    Cancel,
    Reactivate { now: DateTime<Utc> },
    Expire { now: DateTime<Utc>, free_units: i32 },
}

impl TierTransition {
    pub fn from_tier(&self) -> SubscriptionTier {
        match self {
            TierTransition::Cancel => SubscriptionTier::Pro,
            TierTransition::Reactivate { .. } | TierTransition::Expire { .. } => {
                SubscriptionTier::PendingCancel
            }
        }
    }

    pub fn to_tier(&self) -> SubscriptionTier {
        match self {
            TierTransition::Cancel => SubscriptionTier::PendingCancel,
            TierTransition::Reactivate { .. } => SubscriptionTier::Pro,
            TierTransition::Expire { .. } => SubscriptionTier::Free,
        }
    }
}

/// Fields written to the account when a first payment succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProUpgrade {
    pub expected_tier: SubscriptionTier,
    pub billing_key: String,
    pub customer_key: String,
    pub remaining_units: i32,
    pub billing_period_start: DateTime<Utc>,
    pub billing_period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed(AccountEntity),
    /// The account row no longer held `expected_tier` (or vanished); nothing was written.
    AccountChanged,
    /// The order id already exists in the ledger; the account update was rolled back.
    DuplicateOrder,
}

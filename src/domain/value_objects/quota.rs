use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::subscription_tiers::SubscriptionTier;

/// Result of one atomic decrement: the units left and the tier the row held when the unit was
/// taken. Callers pick the processing tier from this, not from an earlier read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedUnit {
    pub remaining_units: i32,
    pub tier: SubscriptionTier,
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    PendingCancel,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::PendingCancel => "pending_cancel",
        }
    }

    // Unknown values fall back to the least privileged tier.
    pub fn from_str(value: &str) -> Self {
        match value {
            "pro" => SubscriptionTier::Pro,
            "pending_cancel" => SubscriptionTier::PendingCancel,
            "free" => SubscriptionTier::Free,
            unknown => {
                warn!(stored = unknown, "subscription tier: unknown stored value, treating as free");
                SubscriptionTier::Free
            }
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::accounts::AccountEntity, value_objects::enums::subscription_tiers::SubscriptionTier,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    pub account_id: Uuid,
    pub tier: SubscriptionTier,
    pub remaining_units: i32,
    #[serde(skip_serializing)]
    pub billing_key: Option<String>,
    pub has_billing_key: bool,
    pub billing_period_start: Option<DateTime<Utc>>,
    pub billing_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl From<&AccountEntity> for SubscriptionSnapshot {
    fn from(account: &AccountEntity) -> Self {
        Self {
            account_id: account.id,
            tier: account.subscription_tier(),
            remaining_units: account.remaining_units,
            billing_key: account.billing_key.clone(),
            has_billing_key: account.billing_key.is_some(),
            billing_period_start: account.billing_period_start,
            billing_period_end: account.billing_period_end,
            cancel_at_period_end: account.cancel_at_period_end,
        }
    }
}

impl From<AccountEntity> for SubscriptionSnapshot {
    fn from(account: AccountEntity) -> Self {
        Self::from(&account)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubscriptionModel {
    pub order_id: String,
    pub customer_key: String,
    pub auth_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AckDto {
    pub ok: bool,
}

impl AckDto {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

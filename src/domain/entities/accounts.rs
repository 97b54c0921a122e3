use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::subscription_tiers::SubscriptionTier,
    infrastructure::postgres::schema::accounts,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = accounts)]
pub struct AccountEntity {
    pub id: Uuid,
    pub tier: String,
    pub remaining_units: i32,
    pub billing_key: Option<String>,
    pub customer_key: Option<String>,
    pub billing_period_start: Option<DateTime<Utc>>,
    pub billing_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AccountEntity {
    pub fn subscription_tier(&self) -> SubscriptionTier {
        SubscriptionTier::from_str(&self.tier)
    }

    /// True while the paid period has not yet reached its end.
    pub fn period_active_at(&self, now: DateTime<Utc>) -> bool {
        self.billing_period_end.is_some_and(|ends_at| ends_at > now)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub struct InsertAccountEntity {
    pub id: Uuid,
    pub tier: String,
    pub remaining_units: i32,
    pub cancel_at_period_end: bool,
}

impl InsertAccountEntity {
    pub fn free(id: Uuid, free_units: i32) -> Self {
        Self {
            id,
            tier: SubscriptionTier::Free.to_string(),
            remaining_units: free_units,
            cancel_at_period_end: false,
        }
    }
}

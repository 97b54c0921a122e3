use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        accounts::{AccountEntity, InsertAccountEntity},
        payments::InsertPaymentEntity,
    },
    value_objects::{
        accounts::{CommitOutcome, ProUpgrade, TierTransition},
        quota::ConsumedUnit,
    },
};

/// Durable account rows. Soft-deleted rows are invisible to every method.
#[automock]
#[async_trait]
pub trait AccountRepository {
    async fn find_active_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>>;

    /// Returns `true` when a row was created, `false` when the id already existed.
    async fn insert_if_absent(&self, account: InsertAccountEntity) -> Result<bool>;

    /// Applies `transition` only if the row still holds `transition.from_tier()` (and the
    /// period predicate of the transition). `None` means nothing matched.
    async fn apply_transition(
        &self,
        account_id: Uuid,
        transition: TierTransition,
    ) -> Result<Option<AccountEntity>>;

    /// Upgrades the account and appends the ledger row in one transaction.
    async fn commit_confirmation(
        &self,
        account_id: Uuid,
        upgrade: ProUpgrade,
        payment: InsertPaymentEntity,
    ) -> Result<CommitOutcome>;

    /// Decrements `remaining_units` by one if it is positive. `None` when no row qualified.
    async fn consume_unit(&self, account_id: Uuid) -> Result<Option<ConsumedUnit>>;

    async fn list_lapsed_pending_cancel(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AccountEntity>>;
}

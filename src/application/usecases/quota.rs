use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        account_locks::AccountLocks,
        usecases::subscriptions::{SubscriptionError, UseCaseResult},
    },
    domain::{repositories::accounts::AccountRepository, value_objects::quota::ConsumedUnit},
};

pub struct QuotaUseCase {
    account_repo: Arc<dyn AccountRepository + Send + Sync>,
    locks: Arc<AccountLocks>,
}

impl QuotaUseCase {
    pub fn new(
        account_repo: Arc<dyn AccountRepository + Send + Sync>,
        locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            account_repo,
            locks,
        }
    }

    /// Takes one unit from the account. The returned tier is the one the row held at the
    /// moment of the decrement.
    pub async fn consume_one(&self, account_id: Uuid) -> UseCaseResult<ConsumedUnit> {
        let _guard = self.locks.lock(account_id).await;

        let consumed = self
            .account_repo
            .consume_unit(account_id)
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "quota: failed to consume unit");
                SubscriptionError::DbError
            })?;

        if let Some(unit) = consumed {
            info!(
                %account_id,
                tier = %unit.tier,
                remaining_units = unit.remaining_units,
                "quota: unit consumed"
            );
            return Ok(unit);
        }

        match self.account_repo.find_active_by_id(account_id).await {
            Ok(Some(_)) => {
                warn!(%account_id, "quota: no units left");
                Err(SubscriptionError::InsufficientQuota)
            }
            Ok(None) => Err(SubscriptionError::NotFound),
            Err(err) => {
                error!(%account_id, db_error = ?err, "quota: failed to load account");
                Err(SubscriptionError::DbError)
            }
        }
    }
}

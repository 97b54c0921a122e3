use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, result::Error as DieselError, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            accounts::{AccountEntity, InsertAccountEntity},
            payments::InsertPaymentEntity,
        },
        repositories::accounts::AccountRepository,
        value_objects::{
            accounts::{CommitOutcome, ProUpgrade, TierTransition},
            enums::subscription_tiers::SubscriptionTier,
            quota::ConsumedUnit,
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{accounts, payments},
    },
};

diesel::define_sql_function! {
    fn least(a: diesel::sql_types::Integer, b: diesel::sql_types::Integer) -> diesel::sql_types::Integer;
}

pub struct AccountPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AccountPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AccountRepository for AccountPostgres {
    async fn find_active_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = accounts::table
            .filter(accounts::id.eq(account_id))
            .filter(accounts::deleted_at.is_null())
            .select(AccountEntity::as_select())
            .first::<AccountEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert_if_absent(&self, account: InsertAccountEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(accounts::table)
            .values(&account)
            .on_conflict(accounts::id)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted == 1)
    }

    async fn apply_transition(
        &self,
        account_id: Uuid,
        transition: TierTransition,
    ) -> Result<Option<AccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();

        let target = accounts::table
            .filter(accounts::id.eq(account_id))
            .filter(accounts::deleted_at.is_null())
            .filter(accounts::tier.eq(transition.from_tier().as_str()));

        let result = match transition {
            TierTransition::Cancel => update(target)
                .set((
                    accounts::tier.eq(SubscriptionTier::PendingCancel.as_str()),
                    accounts::cancel_at_period_end.eq(true),
                    accounts::updated_at.eq(current_time),
                ))
                .returning(AccountEntity::as_select())
                .get_result::<AccountEntity>(&mut conn)
                .optional()?,
            TierTransition::Reactivate { now } => update(target)
                .filter(accounts::billing_period_end.gt(now))
                .set((
                    accounts::tier.eq(SubscriptionTier::Pro.as_str()),
                    accounts::cancel_at_period_end.eq(false),
                    accounts::updated_at.eq(current_time),
                ))
                .returning(AccountEntity::as_select())
                .get_result::<AccountEntity>(&mut conn)
                .optional()?,
            TierTransition::Expire { now, free_units } => update(target)
                .filter(accounts::billing_period_end.le(now))
                .set((
                    accounts::tier.eq(SubscriptionTier::Free.as_str()),
                    accounts::billing_key.eq::<Option<String>>(None),
                    accounts::customer_key.eq::<Option<String>>(None),
                    accounts::billing_period_start.eq::<Option<DateTime<Utc>>>(None),
                    accounts::billing_period_end.eq::<Option<DateTime<Utc>>>(None),
                    accounts::cancel_at_period_end.eq(false),
                    accounts::remaining_units.eq(least(accounts::remaining_units, free_units)),
                    accounts::updated_at.eq(current_time),
                ))
                .returning(AccountEntity::as_select())
                .get_result::<AccountEntity>(&mut conn)
                .optional()?,
        };

        Ok(result)
    }

    async fn commit_confirmation(
        &self,
        account_id: Uuid,
        upgrade: ProUpgrade,
        payment: InsertPaymentEntity,
    ) -> Result<CommitOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();

        let outcome = conn.transaction::<CommitOutcome, DieselError, _>(|conn| {
            let upgraded = update(accounts::table)
                .filter(accounts::id.eq(account_id))
                .filter(accounts::deleted_at.is_null())
                .filter(accounts::tier.eq(upgrade.expected_tier.as_str()))
                .set((
                    accounts::tier.eq(SubscriptionTier::Pro.as_str()),
                    accounts::billing_key.eq(Some(upgrade.billing_key.clone())),
                    accounts::customer_key.eq(Some(upgrade.customer_key.clone())),
                    accounts::remaining_units.eq(upgrade.remaining_units),
                    accounts::billing_period_start.eq(Some(upgrade.billing_period_start)),
                    accounts::billing_period_end.eq(Some(upgrade.billing_period_end)),
                    accounts::cancel_at_period_end.eq(false),
                    accounts::updated_at.eq(current_time),
                ))
                .returning(AccountEntity::as_select())
                .get_result::<AccountEntity>(conn)
                .optional()?;

            let Some(account) = upgraded else {
                return Ok(CommitOutcome::AccountChanged);
            };

            let inserted = insert_into(payments::table)
                .values(&payment)
                .on_conflict(payments::order_id)
                .do_nothing()
                .execute(conn)?;

            // The order id is already in the ledger: undo the upgrade above.
            if inserted == 0 {
                return Err(DieselError::RollbackTransaction);
            }

            Ok(CommitOutcome::Committed(account))
        });

        match outcome {
            Ok(outcome) => Ok(outcome),
            Err(DieselError::RollbackTransaction) => Ok(CommitOutcome::DuplicateOrder),
            Err(err) => Err(err.into()),
        }
    }

    async fn consume_unit(&self, account_id: Uuid) -> Result<Option<ConsumedUnit>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(accounts::table)
            .filter(accounts::id.eq(account_id))
            .filter(accounts::deleted_at.is_null())
            .filter(accounts::remaining_units.gt(0))
            .set((
                accounts::remaining_units.eq(accounts::remaining_units - 1),
                accounts::updated_at.eq(Utc::now()),
            ))
            .returning((accounts::remaining_units, accounts::tier))
            .get_result::<(i32, String)>(&mut conn)
            .optional()?;

        Ok(result.map(|(remaining_units, tier)| ConsumedUnit {
            remaining_units,
            tier: SubscriptionTier::from_str(&tier),
        }))
    }

    async fn list_lapsed_pending_cancel(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AccountEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = accounts::table
            .filter(accounts::tier.eq(SubscriptionTier::PendingCancel.as_str()))
            .filter(accounts::deleted_at.is_null())
            .filter(accounts::billing_period_end.le(now))
            .order(accounts::billing_period_end.asc())
            .limit(limit)
            .select(AccountEntity::as_select())
            .load::<AccountEntity>(&mut conn)?;

        Ok(results)
    }
}

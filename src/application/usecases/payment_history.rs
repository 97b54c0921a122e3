use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::usecases::subscriptions::{SubscriptionError, UseCaseResult},
    domain::{
        repositories::{accounts::AccountRepository, payments::PaymentLedgerRepository},
        value_objects::payments::{
            DEFAULT_HISTORY_MONTHS, MAX_HISTORY_MONTHS, PaymentHistoryReport, PaymentRecordDto,
        },
    },
};

pub struct PaymentHistoryUseCase {
    account_repo: Arc<dyn AccountRepository + Send + Sync>,
    payment_repo: Arc<dyn PaymentLedgerRepository + Send + Sync>,
}

impl PaymentHistoryUseCase {
    pub fn new(
        account_repo: Arc<dyn AccountRepository + Send + Sync>,
        payment_repo: Arc<dyn PaymentLedgerRepository + Send + Sync>,
    ) -> Self {
        Self {
            account_repo,
            payment_repo,
        }
    }

    pub async fn history(
        &self,
        account_id: Uuid,
        months: Option<u32>,
        now: DateTime<Utc>,
    ) -> UseCaseResult<PaymentHistoryReport> {
        let months = months
            .unwrap_or(DEFAULT_HISTORY_MONTHS)
            .clamp(1, MAX_HISTORY_MONTHS);
        let since = now
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| SubscriptionError::InvalidRequest("months out of range".to_string()))?;

        match self.account_repo.find_active_by_id(account_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(SubscriptionError::NotFound),
            Err(err) => {
                error!(%account_id, db_error = ?err, "payments: failed to load account");
                return Err(SubscriptionError::DbError);
            }
        }

        let records = self
            .payment_repo
            .list_since(account_id, since)
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "payments: failed to list history");
                SubscriptionError::DbError
            })?;

        let payments: Vec<PaymentRecordDto> =
            records.into_iter().map(PaymentRecordDto::from).collect();
        let total_paid = payments
            .iter()
            .filter(|record| record.is_done())
            .map(|record| record.amount)
            .sum();

        info!(%account_id, months, count = payments.len(), "payments: history listed");

        Ok(PaymentHistoryReport {
            account_id,
            since,
            count: payments.len(),
            total_paid,
            payments,
        })
    }
}

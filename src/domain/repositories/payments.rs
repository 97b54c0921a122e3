use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payments::PaymentEntity;

#[automock]
#[async_trait]
pub trait PaymentLedgerRepository {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<PaymentEntity>>;

    /// Newest first.
    async fn list_since(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentEntity>>;
}

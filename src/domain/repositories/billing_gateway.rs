use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::billing_gateway::{
    ChargeReceipt, ChargeRequest, IssuedBillingKey,
};

#[automock]
#[async_trait]
pub trait BillingGateway {
    async fn issue_billing_key(&self, auth_key: &str, customer_key: &str)
    -> Result<IssuedBillingKey>;

    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt>;

    async fn revoke_billing_key(&self, billing_key: &str) -> Result<()>;
}

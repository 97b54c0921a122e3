use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity, value_objects::enums::payment_statuses::PaymentStatus,
};

pub const DEFAULT_HISTORY_MONTHS: u32 = 12;
pub const MAX_HISTORY_MONTHS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecordDto {
    pub order_id: String,
    pub charge_key: String,
    pub order_name: String,
    pub amount: i64,
    pub status: String,
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for PaymentRecordDto {
    fn from(payment: PaymentEntity) -> Self {
        Self {
            order_id: payment.order_id,
            charge_key: payment.charge_key,
            order_name: payment.order_name,
            amount: payment.amount,
            status: payment.status,
            method: payment.method,
            created_at: payment.created_at,
        }
    }
}

impl PaymentRecordDto {
    pub fn is_done(&self) -> bool {
        PaymentStatus::from_str(&self.status) == Some(PaymentStatus::Done)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryReport {
    pub account_id: Uuid,
    pub since: DateTime<Utc>,
    pub count: usize,
    pub total_paid: i64,
    pub payments: Vec<PaymentRecordDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentHistoryQuery {
    pub months: Option<u32>,
}

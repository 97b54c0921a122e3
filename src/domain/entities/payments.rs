use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payments;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub order_id: String,
    pub account_id: Uuid,
    pub charge_key: String,
    pub order_name: String,
    pub amount: i64,
    pub status: String,
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub order_id: String,
    pub account_id: Uuid,
    pub charge_key: String,
    pub order_name: String,
    pub amount: i64,
    pub status: String,
    pub method: Option<String>,
}

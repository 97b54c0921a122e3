use serde::{Deserialize, Serialize};

/// Status the gateway reports for a settled charge.
pub const CHARGE_STATUS_DONE: &str = "DONE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedBillingKey {
    #[serde(default)]
    pub billing_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    #[serde(skip_serializing)]
    pub billing_key: String,
    pub customer_key: String,
    pub amount: i64,
    pub order_id: String,
    pub order_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    #[serde(rename = "paymentKey")]
    pub charge_key: String,
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
}

impl ChargeReceipt {
    pub fn is_done(&self) -> bool {
        self.status == CHARGE_STATUS_DONE
    }
}

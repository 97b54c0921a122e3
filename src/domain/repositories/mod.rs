pub mod accounts;
pub mod billing_gateway;
pub mod payments;

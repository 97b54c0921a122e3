pub mod accounts;
pub mod billing_gateway;
pub mod enums;
pub mod payments;
pub mod quota;
pub mod subscriptions;

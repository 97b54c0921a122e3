pub mod accounts;
pub mod payments;
pub mod quota;
pub mod subscriptions;

pub mod accounts;
pub mod payments;

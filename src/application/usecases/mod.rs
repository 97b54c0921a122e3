pub mod payment_history;
pub mod quota;
pub mod subscriptions;

#[cfg(test)]
mod in_memory;

pub mod payment_statuses;
pub mod subscription_tiers;

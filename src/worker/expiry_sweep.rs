use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::{
    application::usecases::subscriptions::{ExpirySweepResult, SubscriptionUseCase},
    config::config_model::ExpirySweep,
};

/// Returns lapsed `pending_cancel` accounts to `free`, forever, at the configured interval.
pub async fn run(usecase: Arc<SubscriptionUseCase>, config: ExpirySweep) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        interval_secs = config.interval,
        batch_size = config.batch_size,
        "expiry sweep: started"
    );

    loop {
        ticker.tick().await;
        sweep_until_drained(&usecase, config.batch_size).await;
    }
}

async fn sweep_until_drained(usecase: &SubscriptionUseCase, batch_size: i64) {
    loop {
        let result = match usecase.expire_lapsed(Utc::now(), batch_size).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "expiry sweep: batch failed");
                return;
            }
        };

        log_result(&result);

        // A short batch, or one where nothing moved, means there is no more work this tick.
        if !is_full_productive_batch(&result, batch_size) {
            return;
        }
    }
}

fn is_full_productive_batch(result: &ExpirySweepResult, batch_size: i64) -> bool {
    let full = i64::try_from(result.scanned).is_ok_and(|scanned| scanned >= batch_size);
    full && result.expired > 0
}

fn log_result(result: &ExpirySweepResult) {
    if result.scanned == 0 {
        return;
    }
    info!(
        scanned = result.scanned,
        expired = result.expired,
        skipped = result.skipped,
        failed = result.failed,
        "expiry sweep: batch processed"
    );
}

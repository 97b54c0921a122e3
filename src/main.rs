use anyhow::Result;
use std::sync::Arc;
use subscription_engine::{
    application::{
        account_locks::AccountLocks,
        usecases::{
            payment_history::PaymentHistoryUseCase, quota::QuotaUseCase,
            subscriptions::SubscriptionUseCase,
        },
    },
    config::config_loader,
    domain::repositories::{
        accounts::AccountRepository, billing_gateway::BillingGateway,
        payments::PaymentLedgerRepository,
    },
    infrastructure::{
        axum_http::http_serve::{self, HttpUseCases},
        payments::gateway_client::BillingGatewayClient,
        postgres::{
            postgres_connection,
            repositories::{accounts::AccountPostgres, payments::PaymentLedgerPostgres},
        },
    },
    observability, worker,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Subscription engine exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_observability("subscription-engine")?;

    let dotenvy_env = Arc::new(config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let account_repository: Arc<dyn AccountRepository + Send + Sync> =
        Arc::new(AccountPostgres::new(Arc::clone(&db_pool_arc)));
    let payment_repository: Arc<dyn PaymentLedgerRepository + Send + Sync> =
        Arc::new(PaymentLedgerPostgres::new(Arc::clone(&db_pool_arc)));
    let billing_gateway: Arc<dyn BillingGateway + Send + Sync> =
        Arc::new(BillingGatewayClient::new(&dotenvy_env.billing_gateway)?);

    // One lock table for every usecase that mutates an account.
    let account_locks = Arc::new(AccountLocks::new());

    let subscriptions_usecase = Arc::new(SubscriptionUseCase::new(
        Arc::clone(&account_repository),
        Arc::clone(&payment_repository),
        billing_gateway,
        Arc::clone(&account_locks),
        dotenvy_env.plans.clone(),
    ));
    let quota_usecase = Arc::new(QuotaUseCase::new(
        Arc::clone(&account_repository),
        Arc::clone(&account_locks),
    ));
    let payment_history_usecase = Arc::new(PaymentHistoryUseCase::new(
        account_repository,
        payment_repository,
    ));

    let expiry_sweep_loop = tokio::spawn(worker::expiry_sweep::run(
        Arc::clone(&subscriptions_usecase),
        dotenvy_env.expiry_sweep.clone(),
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let http_server = tokio::spawn(async move {
        http_serve::start(
            server_config,
            HttpUseCases {
                subscriptions: subscriptions_usecase,
                quota: quota_usecase,
                payment_history: payment_history_usecase,
            },
        )
        .await
    });

    // The sweep never returns on its own; the server returns on shutdown.
    tokio::select! {
        result = http_server => result??,
        result = expiry_sweep_loop => result??,
    };

    Ok(())
}

use crate::{
    application::usecases::{
        payment_history::PaymentHistoryUseCase, quota::QuotaUseCase,
        subscriptions::SubscriptionUseCase,
    },
    config::config_model::DotEnvyConfig,
    infrastructure::axum_http::{
        auth::JwtVerifier, default_routers, error_responses::fill_timeout_body, routers,
    },
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub struct HttpUseCases {
    pub subscriptions: Arc<SubscriptionUseCase>,
    pub quota: Arc<QuotaUseCase>,
    pub payment_history: Arc<PaymentHistoryUseCase>,
}

pub fn app(config: &DotEnvyConfig, usecases: HttpUseCases) -> Result<Router> {
    let verifier = Arc::new(JwtVerifier::new(&config.auth.jwt_secret));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/accounts",
            routers::accounts::routes(Arc::clone(&usecases.subscriptions)),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(Arc::clone(&usecases.subscriptions)),
        )
        .nest(
            "/api/v1/payments",
            routers::payments::routes(Arc::clone(&usecases.payment_history)),
        )
        .nest(
            "/api/v1/quota",
            routers::quota::routes(Arc::clone(&usecases.quota)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(verifier))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(middleware::map_response(fill_timeout_body))
        .layer(RequestBodyLimitLayer::new(
            (config.server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn start(config: Arc<DotEnvyConfig>, usecases: HttpUseCases) -> Result<()> {
    let app = app(&config, usecases)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

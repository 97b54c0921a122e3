use std::{env, str::FromStr};

use anyhow::{Context, Result};

use super::config_model::{
    Auth, BillingGatewayConfig, Database, DotEnvyConfig, ExpirySweep, Plans, Server,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: required_parse("SERVER_PORT")?,
        body_limit: required_parse("SERVER_BODY_LIMIT")?,
        timeout: required_parse("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional_parse("DATABASE_MAX_CONNECTIONS", 10)?,
        connect_timeout: optional_parse("DATABASE_CONNECT_TIMEOUT", 5)?,
    };

    let billing_gateway = BillingGatewayConfig {
        base_url: required("BILLING_GATEWAY_BASE_URL")?,
        secret_key: required("BILLING_GATEWAY_SECRET_KEY")?,
        timeout: optional_parse("BILLING_GATEWAY_TIMEOUT", 10)?,
    };

    let defaults = Plans::default();
    let plans = Plans {
        pro_price: optional_parse("PRO_PRICE", defaults.pro_price)?,
        pro_order_name: env::var("PRO_ORDER_NAME").unwrap_or(defaults.pro_order_name),
        pro_units: optional_parse("PRO_UNITS", defaults.pro_units)?,
        free_units: optional_parse("FREE_UNITS", defaults.free_units)?,
        billing_period_months: optional_parse(
            "BILLING_PERIOD_MONTHS",
            defaults.billing_period_months,
        )?,
    };
    validate_plans(&plans)?;

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
    };

    let expiry_sweep = ExpirySweep {
        interval: optional_parse("EXPIRY_SWEEP_INTERVAL", 300)?,
        batch_size: optional_parse("EXPIRY_SWEEP_BATCH", 100)?,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        billing_gateway,
        plans,
        auth,
        expiry_sweep,
    })
}

fn validate_plans(plans: &Plans) -> Result<()> {
    anyhow::ensure!(plans.pro_price > 0, "PRO_PRICE must be positive");
    anyhow::ensure!(plans.pro_units >= 0, "PRO_UNITS must not be negative");
    anyhow::ensure!(plans.free_units >= 0, "FREE_UNITS must not be negative");
    anyhow::ensure!(
        plans.billing_period_months > 0,
        "BILLING_PERIOD_MONTHS must be positive"
    );
    Ok(())
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} is invalid"))
}

fn required_parse<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .parse()
        .with_context(|| format!("{key} could not be parsed"))
}

fn optional_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} could not be parsed")),
        _ => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub billing_gateway: BillingGatewayConfig,
    pub plans: Plans,
    pub auth: Auth,
    pub expiry_sweep: ExpirySweep,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct BillingGatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: u64,
}

/// Pricing and allowances for the two purchasable states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plans {
    pub pro_price: i64,
    pub pro_order_name: String,
    pub pro_units: i32,
    pub free_units: i32,
    pub billing_period_months: u32,
}

impl Default for Plans {
    fn default() -> Self {
        Self {
            pro_price: 9900,
            pro_order_name: "Pro monthly".to_string(),
            pro_units: 10,
            free_units: 3,
            billing_period_months: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct ExpirySweep {
    pub interval: u64,
    pub batch_size: i64,
}

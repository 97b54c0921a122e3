use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    config::config_model::BillingGatewayConfig,
    domain::{
        repositories::billing_gateway::BillingGateway,
        value_objects::billing_gateway::{ChargeReceipt, ChargeRequest, IssuedBillingKey},
    },
};

/// Billing gateway client built on reqwest.
///
/// The billing key travels in the request path, so request errors are stripped of their URL
/// before they are returned or logged.
pub struct BillingGatewayClient {
    http: reqwest::Client,
    base_url: Url,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueBillingKeyBody<'a> {
    auth_key: &'a str,
    customer_key: &'a str,
}

impl BillingGatewayClient {
    pub fn new(config: &BillingGatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .context("failed to build billing gateway http client")?;
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid billing gateway base url: {}", config.base_url))?;

        Ok(Self {
            http,
            base_url,
            secret_key: config.secret_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("billing gateway base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {}>", err.without_url()),
        };
        let (gateway_code, gateway_message) = parse_error_envelope(&body);

        error!(
            status = %status,
            gateway_code = ?gateway_code,
            gateway_message = ?gateway_message,
            context = %context,
            "billing gateway request failed"
        );

        anyhow::bail!(
            "billing gateway request failed: {} (status {}, code={:?})",
            context,
            status,
            gateway_code
        );
    }
}

fn parse_error_envelope(body: &str) -> (Option<String>, Option<String>) {
    match serde_json::from_str::<GatewayErrorEnvelope>(body) {
        Ok(envelope) => (envelope.code, envelope.message),
        Err(_) => (None, None),
    }
}

#[async_trait]
impl BillingGateway for BillingGatewayClient {
    async fn issue_billing_key(
        &self,
        auth_key: &str,
        customer_key: &str,
    ) -> Result<IssuedBillingKey> {
        let url = self.endpoint(&["v1", "billing", "authorizations", "issue"])?;
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.secret_key, Some(""))
            .json(&IssueBillingKeyBody {
                auth_key,
                customer_key,
            })
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let resp = Self::ensure_success(resp, "issue billing key").await?;

        let issued: IssuedBillingKey = resp.json().await.map_err(reqwest::Error::without_url)?;
        Ok(issued)
    }

    async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt> {
        let url = self.endpoint(&["v1", "billing", &request.billing_key])?;
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.secret_key, Some(""))
            .header("Idempotency-Key", &request.order_id)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let resp = Self::ensure_success(resp, "charge billing key").await?;

        let receipt: ChargeReceipt = resp.json().await.map_err(reqwest::Error::without_url)?;
        Ok(receipt)
    }

    async fn revoke_billing_key(&self, billing_key: &str) -> Result<()> {
        let url = self.endpoint(&["v1", "billing", billing_key])?;
        let resp = self
            .http
            .delete(url)
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        // Already revoked keys count as revoked.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::ensure_success(resp, "revoke billing key").await?;

        Ok(())
    }
}

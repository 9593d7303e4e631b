//! SMS transport.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::fetch::auth::ApiKey;
use crate::fetch::{HttpClient, execute_json};

pub const AFRICASTALKING_URL: &str = "https://api.africastalking.com/version1/messaging";

/// Header carrying the Africa's Talking key.
const API_KEY_HEADER: &str = "apiKey";

/// Per-recipient status codes the gateway reports for an accepted message.
const ACCEPTED_STATUS: std::ops::RangeInclusive<u16> = 100..=102;

/// Outcome of one send call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReceipt {
    pub accepted: Vec<String>,
    /// Rejected numbers with the gateway's status text.
    pub rejected: Vec<(String, String)>,
}

impl DeliveryReceipt {
    pub fn all_accepted(numbers: &[String]) -> Self {
        Self {
            accepted: numbers.to_vec(),
            rejected: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && !self.accepted.is_empty()
    }
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Sends one message to every number. Transport failures are errors;
    /// per-number rejections come back in the receipt.
    async fn send(&self, numbers: &[String], message: &str) -> Result<DeliveryReceipt>;
}

/// Credentials and endpoint for Africa's Talking.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub username: String,
    pub api_key: String,
    pub sender_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "SMSMessageData")]
    data: MessageData,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Recipients", default)]
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    status_code: u16,
    number: String,
    status: String,
    #[serde(default)]
    message_id: Option<String>,
}

impl From<MessageData> for DeliveryReceipt {
    fn from(data: MessageData) -> Self {
        let mut receipt = DeliveryReceipt::default();
        for r in data.recipients {
            if ACCEPTED_STATUS.contains(&r.status_code) {
                debug!(number = %r.number, message_id = ?r.message_id, "Recipient accepted");
                receipt.accepted.push(r.number);
            } else {
                warn!(number = %r.number, status = %r.status, code = r.status_code, "Recipient rejected");
                receipt.rejected.push((r.number, r.status));
            }
        }
        receipt
    }
}

/// Africa's Talking bulk messaging over any [`HttpClient`].
pub struct AfricasTalkingGateway<C> {
    client: ApiKey<C>,
    requests: reqwest::Client,
    config: GatewayConfig,
}

impl<C: HttpClient> AfricasTalkingGateway<C> {
    pub fn new(transport: C, config: GatewayConfig) -> Result<Self> {
        if config.username.trim().is_empty() || config.api_key.trim().is_empty() {
            bail!("Africa's Talking username and API key are required");
        }
        Ok(Self {
            client: ApiKey::new(transport, API_KEY_HEADER, &config.api_key)?,
            requests: reqwest::Client::builder().build()?,
            config,
        })
    }

    fn build_request(&self, numbers: &[String], message: &str) -> Result<reqwest::Request> {
        let to = numbers.join(",");
        let mut form = vec![
            ("username", self.config.username.as_str()),
            ("to", to.as_str()),
            ("message", message),
        ];
        if let Some(from) = self.config.sender_id.as_deref().filter(|s| !s.is_empty()) {
            form.push(("from", from));
        }

        Ok(self
            .requests
            .post(&self.config.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .build()?)
    }
}

#[async_trait]
impl<C: HttpClient> SmsGateway for AfricasTalkingGateway<C> {
    async fn send(&self, numbers: &[String], message: &str) -> Result<DeliveryReceipt> {
        if numbers.is_empty() {
            return Ok(DeliveryReceipt::default());
        }
        let req = self.build_request(numbers, message)?;
        let resp: SendResponse = execute_json(&self.client, req).await?;
        debug!(summary = %resp.data.message, "Gateway response");
        Ok(resp.data.into())
    }
}

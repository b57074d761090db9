//! Delivery through one of two mutually exclusive providers
//!
//! Provider selection is a two-armed enum decided once at startup:
//! Resend when an API key is configured, MailChannels otherwise. One
//! attempt per message, no failover between providers within a
//! request.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::config::RelayConfig;

use super::EmailMessage;

/// Outcome of one delivery attempt. A transport-level failure (the
/// provider never answered) is reported with status 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Accepted,
    Rejected { status: u16, body: String },
}

impl DeliveryResult {
    pub fn accepted(&self) -> bool {
        matches!(self, DeliveryResult::Accepted)
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> DeliveryResult;
}

/// Which external provider this deployment delivers through.
#[derive(Debug, Clone)]
pub enum Provider {
    Resend { api_key: String, api_url: String },
    MailChannels { api_url: String },
}

impl Provider {
    /// Pick the provider from the deployment configuration: Resend
    /// whenever a key is present, the keyless MailChannels relay
    /// otherwise.
    pub fn from_config(config: &RelayConfig) -> Self {
        match &config.resend_api_key {
            Some(api_key) => Provider::Resend {
                api_key: api_key.clone(),
                api_url: config.endpoints.resend_api_url.clone(),
            },
            None => Provider::MailChannels {
                api_url: config.endpoints.mailchannels_api_url.clone(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Resend { .. } => "resend",
            Provider::MailChannels { .. } => "mailchannels",
        }
    }
}

/// Production transport: a reqwest client posting the provider's JSON
/// shape to its API endpoint.
pub struct HttpTransport {
    client: Client,
    provider: Provider,
}

impl HttpTransport {
    pub fn new(provider: Provider) -> Self {
        Self {
            client: Client::new(),
            provider,
        }
    }

    fn request_body(&self, message: &EmailMessage) -> serde_json::Value {
        match &self.provider {
            Provider::Resend { .. } => json!({
                "from": format!("{} <{}>", message.from_name, message.from),
                "to": [message.to],
                "subject": message.subject,
                "reply_to": message.reply_to,
                "text": message.text,
                "html": message.html,
            }),
            Provider::MailChannels { .. } => {
                let mut body = json!({
                    "personalizations": [{ "to": [{ "email": message.to }] }],
                    "from": { "email": message.from, "name": message.from_name },
                    "subject": message.subject,
                    "content": [
                        { "type": "text/plain", "value": message.text },
                        { "type": "text/html", "value": message.html },
                    ],
                });
                if let Some(reply_to) = &message.reply_to {
                    body["reply_to"] = json!({ "email": reply_to });
                }
                body
            }
        }
    }
}

#[async_trait]
impl MailTransport for HttpTransport {
    async fn send(&self, message: &EmailMessage) -> DeliveryResult {
        let (url, api_key) = match &self.provider {
            Provider::Resend { api_key, api_url } => (api_url.as_str(), Some(api_key.as_str())),
            Provider::MailChannels { api_url } => (api_url.as_str(), None),
        };

        let mut request = self.client.post(url).json(&self.request_body(message));
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(provider = self.provider.name(), to = %message.to, "email accepted");
                DeliveryResult::Accepted
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                warn!(
                    provider = self.provider.name(),
                    status, "provider rejected email: {body}"
                );
                DeliveryResult::Rejected { status, body }
            }
            Err(e) => {
                warn!(provider = self.provider.name(), "provider unreachable: {e}");
                DeliveryResult::Rejected {
                    status: 0,
                    body: e.to_string(),
                }
            }
        }
    }
}

/// Recording transport for tests. Results are popped from a scripted
/// queue; an empty queue accepts everything.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<EmailMessage>>,
    results: Mutex<VecDeque<DeliveryResult>>,
}

impl MockTransport {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn push_result(&self, result: DeliveryResult) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, message: &EmailMessage) -> DeliveryResult {
        self.sent.lock().unwrap().push(message.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DeliveryResult::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            from: "no-reply@example.com".to_string(),
            from_name: "Example Website".to_string(),
            to: "inbox@example.com".to_string(),
            subject: "[Example] Inquiry — Ada".to_string(),
            reply_to: Some("ada@example.com".to_string()),
            text: "hello".to_string(),
            html: "<p>hello</p>".to_string(),
        }
    }

    #[test]
    fn resend_body_uses_named_from_and_flat_fields() {
        let transport = HttpTransport::new(Provider::Resend {
            api_key: "key".to_string(),
            api_url: "https://api.resend.com/emails".to_string(),
        });
        let body = transport.request_body(&message());
        assert_eq!(body["from"], "Example Website <no-reply@example.com>");
        assert_eq!(body["to"][0], "inbox@example.com");
        assert_eq!(body["reply_to"], "ada@example.com");
        assert_eq!(body["text"], "hello");
    }

    #[test]
    fn mailchannels_body_uses_personalizations_and_content_parts() {
        let transport = HttpTransport::new(Provider::MailChannels {
            api_url: "https://api.mailchannels.net/tx/v1/send".to_string(),
        });
        let body = transport.request_body(&message());
        assert_eq!(
            body["personalizations"][0]["to"][0]["email"],
            "inbox@example.com"
        );
        assert_eq!(body["from"]["email"], "no-reply@example.com");
        assert_eq!(body["content"][0]["type"], "text/plain");
        assert_eq!(body["content"][1]["type"], "text/html");
        assert_eq!(body["reply_to"]["email"], "ada@example.com");
    }

    #[test]
    fn mailchannels_body_omits_reply_to_when_absent() {
        let transport = HttpTransport::new(Provider::MailChannels {
            api_url: "unused".to_string(),
        });
        let mut msg = message();
        msg.reply_to = None;
        let body = transport.request_body(&msg);
        assert!(body.get("reply_to").is_none());
    }

    #[test]
    fn provider_selection_follows_api_key_presence() {
        let mut config = RelayConfig::default();
        assert_eq!(Provider::from_config(&config).name(), "mailchannels");
        config.resend_api_key = Some("key".to_string());
        assert_eq!(Provider::from_config(&config).name(), "resend");
    }

    #[tokio::test]
    async fn mock_transport_records_and_scripts_results() {
        let transport = MockTransport::accepting();
        transport.push_result(DeliveryResult::Rejected {
            status: 503,
            body: "busy".to_string(),
        });
        let first = transport.send(&message()).await;
        let second = transport.send(&message()).await;
        assert_eq!(
            first,
            DeliveryResult::Rejected {
                status: 503,
                body: "busy".to_string()
            }
        );
        assert!(second.accepted());
        assert_eq!(transport.sent_count(), 2);
    }
}

//! Generic HTTP SMS gateway transport.
//!
//! Posts `{ to, from?, text, language }` as JSON to the configured endpoint
//! with the API key as a bearer token. Any 2xx counts as accepted.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::{config::SmsConfig, ChannelKind};
use serde::Serialize;
use tracing::debug;

use crate::{
    channel::Channel,
    error::ChannelError,
    http,
    types::{ChannelStatus, OutboundMessage},
};

pub struct SmsGatewayChannel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender_id: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    text: &'a str,
    language: &'a str,
}

impl SmsGatewayChannel {
    pub fn new(cfg: &SmsConfig, timeout: Duration) -> Result<Self, ChannelError> {
        if cfg.endpoint.trim().is_empty() || cfg.api_key.trim().is_empty() {
            return Err(ChannelError::ConfigError(
                "sms requires endpoint and api_key".to_string(),
            ));
        }
        Ok(Self {
            client: http::build_client(timeout)?,
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            sender_id: cfg.sender_id.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl Channel for SmsGatewayChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let payload = SmsPayload {
            to: &msg.recipient_id,
            from: self.sender_id.as_deref(),
            text: &msg.content,
            language: msg.language.as_str(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| http::request_error(e, self.timeout))?;
        http::ensure_success(resp).await?;

        debug!(recipient = %msg.recipient_id, "sms accepted by gateway");
        Ok(())
    }

    fn status(&self) -> ChannelStatus {
        ChannelStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::Language;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer, sender_id: Option<&str>) -> SmsGatewayChannel {
        let cfg = SmsConfig {
            endpoint: format!("{}/v1/sms", server.uri()),
            api_key: "sms-key".to_string(),
            sender_id: sender_id.map(String::from),
        };
        SmsGatewayChannel::new(&cfg, Duration::from_secs(5)).unwrap()
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            channel: ChannelKind::Sms,
            recipient_id: "+911".to_string(),
            content: "Boil water".to_string(),
            language: Language::Hindi,
        }
    }

    #[tokio::test]
    async fn posts_payload_with_sender_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sms"))
            .and(header("authorization", "Bearer sms-key"))
            .and(body_json(json!({
                "to": "+911",
                "from": "PHALRT",
                "text": "Boil water",
                "language": "hi",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server, Some("PHALRT")).send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn omits_from_without_sender_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "to": "+911", "text": "Boil water", "language": "hi" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server, None).send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn gateway_failure_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(matches!(
            channel(&server, None).send(&message()).await,
            Err(ChannelError::Rejected { status: 503, .. })
        ));
    }
}

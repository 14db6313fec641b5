//! WhatsApp Cloud API (Meta) transport.
//!
//! One text message per recipient via
//! `POST {api_base}/{phone_number_id}/messages`, authenticated with the
//! long-lived access token as a bearer.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::{config::WhatsAppConfig, ChannelKind};
use serde_json::json;
use tracing::debug;

use crate::{
    channel::Channel,
    error::ChannelError,
    http,
    types::{ChannelStatus, OutboundMessage},
};

pub struct WhatsAppChannel {
    client: reqwest::Client,
    url: String,
    access_token: String,
    timeout: Duration,
}

impl WhatsAppChannel {
    pub fn new(cfg: &WhatsAppConfig, timeout: Duration) -> Result<Self, ChannelError> {
        if cfg.phone_number_id.trim().is_empty() || cfg.access_token.trim().is_empty() {
            return Err(ChannelError::ConfigError(
                "whatsapp requires phone_number_id and access_token".to_string(),
            ));
        }
        Ok(Self {
            client: http::build_client(timeout)?,
            url: format!(
                "{}/{}/messages",
                cfg.api_base.trim_end_matches('/'),
                cfg.phone_number_id
            ),
            access_token: cfg.access_token.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Whatsapp
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": msg.recipient_id,
            "type": "text",
            "text": { "preview_url": false, "body": msg.content },
        });

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| http::request_error(e, self.timeout))?;
        http::ensure_success(resp).await?;

        debug!(recipient = %msg.recipient_id, "whatsapp message accepted");
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
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> WhatsAppConfig {
        WhatsAppConfig {
            phone_number_id: "1055".to_string(),
            access_token: "wa-token".to_string(),
            api_base: format!("{}/", server.uri()),
        }
    }

    fn message(to: &str) -> OutboundMessage {
        OutboundMessage {
            channel: ChannelKind::Whatsapp,
            recipient_id: to.to_string(),
            content: "Boil water before drinking".to_string(),
            language: Language::Odia,
        }
    }

    #[tokio::test]
    async fn posts_cloud_api_text_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1055/messages"))
            .and(header("authorization", "Bearer wa-token"))
            .and(body_partial_json(json!({
                "messaging_product": "whatsapp",
                "to": "919800000001",
                "type": "text",
                "text": { "body": "Boil water before drinking" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": [{"id": "wamid.1"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server), Duration::from_secs(5)).unwrap();
        channel.send(&message("919800000001")).await.unwrap();
    }

    #[tokio::test]
    async fn provider_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid recipient"))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server), Duration::from_secs(5)).unwrap();
        match channel.send(&message("bogus")).await {
            Err(ChannelError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid recipient");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server), Duration::from_millis(50)).unwrap();
        assert!(matches!(
            channel.send(&message("919800000001")).await,
            Err(ChannelError::Timeout { ms: 50 })
        ));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let cfg = WhatsAppConfig {
            phone_number_id: " ".to_string(),
            access_token: "t".to_string(),
            api_base: "http://localhost".to_string(),
        };
        assert!(matches!(
            WhatsAppChannel::new(&cfg, Duration::from_secs(1)),
            Err(ChannelError::ConfigError(_))
        ));
    }
}

//! Telegram Bot API transport.
//!
//! Subscribers reached over Telegram are addressed by chat ID, which the
//! directory stores in the `phone` column.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::{config::TelegramConfig, ChannelKind};
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    channel::Channel,
    error::ChannelError,
    http,
    types::{ChannelStatus, OutboundMessage},
};

/// Maximum characters per Telegram message.
const TELEGRAM_MAX_CHARS: usize = 4096;

pub struct TelegramChannel {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl TelegramChannel {
    pub fn new(cfg: &TelegramConfig, timeout: Duration) -> Result<Self, ChannelError> {
        if cfg.bot_token.trim().is_empty() {
            return Err(ChannelError::ConfigError(
                "telegram requires bot_token".to_string(),
            ));
        }
        Ok(Self {
            client: http::build_client(timeout)?,
            url: format!(
                "{}/bot{}/sendMessage",
                cfg.api_base.trim_end_matches('/'),
                cfg.bot_token
            ),
            timeout,
        })
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        // Broadcast text is capped well below this, but the Bot API would
        // reject the whole message rather than truncate it.
        if msg.content.chars().count() > TELEGRAM_MAX_CHARS {
            return Err(ChannelError::SendFailed(format!(
                "message exceeds {TELEGRAM_MAX_CHARS} characters"
            )));
        }

        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "chat_id": msg.recipient_id, "text": msg.content }))
            .send()
            .await
            .map_err(|e| http::request_error(e, self.timeout))?;
        let resp = http::ensure_success(resp).await?;

        // The Bot API signals some failures with `"ok": false` on a 200.
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if body.get("ok").and_then(Value::as_bool) == Some(false) {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ChannelError::Rejected {
                status: 200,
                body: description,
            });
        }

        debug!(chat_id = %msg.recipient_id, "telegram message accepted");
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
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer) -> TelegramChannel {
        let cfg = TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base: server.uri(),
        };
        TelegramChannel::new(&cfg, Duration::from_secs(5)).unwrap()
    }

    fn message(chat_id: &str) -> OutboundMessage {
        OutboundMessage {
            channel: ChannelKind::Telegram,
            recipient_id: chat_id.to_string(),
            content: "Dengue alert".to_string(),
            language: Language::Hindi,
        }
    }

    #[tokio::test]
    async fn posts_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({ "chat_id": "4242", "text": "Dengue alert" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server).send(&message("4242")).await.unwrap();
    }

    #[tokio::test]
    async fn ok_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "description": "Forbidden: bot was blocked by the user",
            })))
            .mount(&server)
            .await;

        match channel(&server).send(&message("4242")).await {
            Err(ChannelError::Rejected { body, .. }) => assert!(body.contains("blocked")),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
            .mount(&server)
            .await;

        assert!(matches!(
            channel(&server).send(&message("0")).await,
            Err(ChannelError::Rejected { status: 400, .. })
        ));
    }
}

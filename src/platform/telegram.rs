//! Telegram Bot API client over plain reqwest.
//!
//! Only `getUpdates` and `sendMessage` are used. Every response is the
//! standard `{ok, result, error_code, description}` envelope.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Message, Messenger, TransportError, Update};
use crate::config::TelegramConfig;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

/// Telegram client bound to one bot token.
pub struct TelegramClient {
    client: reqwest::Client,
    root: Url,
}

impl TelegramClient {
    /// Build the client from validated config. Performs no network I/O.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            anyhow::bail!("Bot token is not set");
        }
        let root = config.api_root()?;
        config.webhook_endpoint()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        info!("Telegram client initialized");
        Ok(Self { client, root })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.root.as_str().trim_end_matches('/'), method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        debug!("Calling Telegram method {}", method);

        let response = self
            .client
            .get(self.method_url(method))
            .query(query)
            .send()
            .await
            .map_err(|source| TransportError::Network {
                method,
                source: source.without_url(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Network {
                method,
                source: source.without_url(),
            })?;

        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Status {
                    method,
                    status: status.as_u16(),
                    body,
                })
            }
            Err(source) => return Err(TransportError::Decode { method, source }),
        };

        if !envelope.ok {
            return Err(TransportError::Platform {
                method,
                code: envelope.error_code,
                description: envelope
                    .description
                    .unwrap_or_else(|| "No data received".to_string()),
            });
        }

        envelope.result.ok_or_else(|| TransportError::Platform {
            method,
            code: None,
            description: "ok response without result".to_string(),
        })
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn fetch_updates(&self) -> Result<Vec<Update>, TransportError> {
        self.call::<Vec<Update>>("getUpdates", &[]).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let sent: Message = self
            .call(
                "sendMessage",
                &[("chat_id", chat_id.to_string()), ("text", text.to_string())],
            )
            .await?;
        info!(
            "Message {} delivered to chat {}",
            sent.message_id, sent.chat.id
        );
        Ok(())
    }
}

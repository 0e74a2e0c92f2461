pub mod telegram;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A conversation the bot can post into.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel"
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub all_members_are_administrators: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    /// Unix timestamp
    pub date: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

/// One inbound event from `getUpdates`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

impl Update {
    /// The conversation this update originated from, if it carries one.
    pub fn chat(&self) -> Option<&Chat> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .map(|m| &m.chat)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {method} failed")]
    Network {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        status: u16,
        body: String,
    },
    #[error("could not decode {method} response")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{method} rejected by platform. Error Code: {}, Desc: {description}", error_code(.code))]
    Platform {
        method: &'static str,
        code: Option<i64>,
        description: String,
    },
}

fn error_code(code: &Option<i64>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// The two Bot API operations the reminder needs.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn fetch_updates(&self) -> Result<Vec<Update>, TransportError>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;
}

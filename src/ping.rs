use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{Messenger, TransportError};
use crate::recipient::{self, ResolveError};

#[derive(Debug, Error)]
pub enum PingError {
    #[error("could not get updates")]
    Updates(#[source] TransportError),
    #[error("could not pick a chat")]
    Recipient(#[from] ResolveError),
    #[error("failed sending message")]
    Send(#[source] TransportError),
}

/// Fetch updates, pick the latest chat and send `text` to it.
pub async fn try_post_reminder(messenger: &dyn Messenger, text: &str) -> Result<i64, PingError> {
    info!("Requesting for updates");
    let updates = messenger
        .fetch_updates()
        .await
        .map_err(PingError::Updates)?;

    let chat_id = recipient::select_chat(&updates)?;

    info!("Sending message to chat {}: {}", chat_id, text);
    messenger
        .send_message(chat_id, text)
        .await
        .map_err(PingError::Send)?;
    Ok(chat_id)
}

/// Fire-and-report wrapper: failures end up in the log, never in the caller.
pub async fn post_reminder(messenger: &dyn Messenger, text: &str) {
    match try_post_reminder(messenger, text).await {
        Ok(chat_id) => info!("Reminder posted to chat {}", chat_id),
        Err(e) => warn!("Reminder not posted: {:#}", anyhow::Error::new(e)),
    }
}

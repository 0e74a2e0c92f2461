use thiserror::Error;

use crate::platform::Update;

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("no updates received, nobody to ping")]
    NoUpdates,
    #[error("latest update {update_id} carries no chat")]
    NoChat { update_id: i64 },
}

/// Pick the chat of the most recent update. Last seen wins.
pub fn select_chat(updates: &[Update]) -> Result<i64, ResolveError> {
    let last = updates.last().ok_or(ResolveError::NoUpdates)?;
    last.chat().map(|chat| chat.id).ok_or(ResolveError::NoChat {
        update_id: last.update_id,
    })
}

//! Telegram update handlers.
//!
//! Each update is reduced to a messenger-agnostic `IncomingMessage` and handed to the core
//! dispatcher. Errors are logged here and never stop the polling loop.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use amlbot_core::{domain::ChatId, messaging::types::IncomingMessage};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = incoming_from_message(&msg) else {
        tracing::debug!(chat_id = msg.chat.id.0, "Ignoring non-text message");
        return Ok(());
    };

    if let Err(e) = state.dispatcher.handle_message(&incoming).await {
        tracing::error!(
            chat_id = incoming.chat_id.0,
            text = %incoming.text,
            error = %e,
            "Failed to handle message"
        );
    }

    Ok(())
}

/// Text messages only; service messages, stickers and media carry no command.
pub fn incoming_from_message(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let mut incoming = IncomingMessage::new(ChatId(msg.chat.id.0), text);
    if let Some(lang) = msg.from().and_then(|u| u.language_code.clone()) {
        incoming = incoming.with_language(lang);
    }
    Some(incoming)
}

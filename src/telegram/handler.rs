//! Telegram message handling.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, Me, Message};
use teloxide::RequestError;

use crate::core::{BotCore, InboundEvent, Outbound};

/// Handle one incoming message.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    me: Me,
    core: Arc<BotCore>,
) -> Result<(), RequestError> {
    let text = match msg.text().or_else(|| msg.caption()) {
        Some(text) => text,
        // Stickers, voice and service messages only get an answer in private chats.
        None if msg.chat.is_private() => "",
        None => return Ok(()),
    };

    let Some(event) = InboundEvent::from_text(msg.chat.id.0, text, me.user.username.as_deref())
    else {
        return Ok(());
    };

    let sender = msg
        .from
        .as_ref()
        .map(|u| u.full_name())
        .unwrap_or_else(|| "Unknown".to_string());
    tracing::info!(
        "Message from {} in chat {} ({})",
        sender,
        msg.chat.id,
        event.command_name.as_deref().map(|c| format!("/{}", c)).unwrap_or_else(|| "text".to_string())
    );

    if !event.is_command() && !text.trim().is_empty() {
        let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;
    }

    let replies = core.handle(&event).await;
    deliver(&bot, msg.chat.id, &replies).await;
    Ok(())
}

/// Send replies in order. A failed send is logged and ends the sequence.
pub async fn deliver(bot: &Bot, chat_id: ChatId, replies: &[Outbound]) -> usize {
    let mut sent = 0;
    for reply in replies {
        if let Err(e) = bot.send_message(chat_id, &reply.text).await {
            tracing::warn!(
                "Delivery to chat {} failed after {}/{} message(s): {}",
                chat_id,
                sent,
                replies.len(),
                e
            );
            break;
        }
        sent += 1;
    }
    sent
}

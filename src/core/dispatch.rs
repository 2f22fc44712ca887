//! Transport-independent message handling.
//!
//! An [`InboundEvent`] goes in, an ordered list of [`Outbound`] replies comes
//! out. Nothing in here talks to Telegram.

use std::sync::Arc;

use super::command::{classify, CommandId, Inbound};
use super::responder::{split_message, Responder, MAX_MESSAGE_LEN};
use super::router::CommandRouter;
use crate::config::Settings;
use crate::providers::{create_provider, Provider};
use crate::tools::Toolbox;

pub const UNKNOWN_COMMAND_REPLY: &str = "🤔 No conozco ese comando. Usa /help para ver lo que puedo hacer.";

/// One incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: i64,
    /// Lowercased command name without slash; `None` for free text.
    pub command_name: Option<String>,
    pub args: Vec<String>,
    pub raw_text: String,
}

impl InboundEvent {
    /// Build an event from message text. `None` when the message is meant for another bot.
    pub fn from_text(chat_id: i64, text: &str, bot_username: Option<&str>) -> Option<Self> {
        let (command_name, args) = match classify(text, bot_username) {
            Inbound::Command { name, args } => (Some(name), args),
            Inbound::Text(_) => (None, Vec::new()),
            Inbound::Ignored => return None,
        };
        Some(Self { chat_id, command_name, args, raw_text: text.to_string() })
    }

    pub fn is_command(&self) -> bool {
        self.command_name.is_some()
    }
}

/// One message to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub is_error: bool,
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

/// Everything a message handler needs, built once at startup.
pub struct BotCore {
    settings: Arc<Settings>,
    router: CommandRouter,
    responder: Responder,
}

impl BotCore {
    /// Wire the real provider and tools from settings.
    pub fn from_settings(settings: Arc<Settings>) -> Self {
        let provider = create_provider(&settings.model);
        let tools = Toolbox::from_settings(&settings, provider.clone());
        Self::with_parts(settings, provider, tools)
    }

    pub fn with_parts(settings: Arc<Settings>, provider: Arc<dyn Provider>, tools: Toolbox) -> Self {
        let responder = Responder::new(settings.responder_mode, provider, tools.clone());
        let router = CommandRouter::new(settings.clone(), tools);
        Self { settings, router, responder }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Handle one event. Never fails; every fault is already a reply.
    pub async fn handle(&self, event: &InboundEvent) -> Vec<Outbound> {
        let Some(name) = event.command_name.as_deref() else {
            return self
                .responder
                .respond_chunks(event.chat_id, &event.raw_text)
                .await
                .into_iter()
                .map(Outbound::text)
                .collect();
        };

        let Some(command) = CommandId::from_name(name) else {
            tracing::debug!("Unknown command /{} in chat {}", name, event.chat_id);
            return vec![Outbound::error(UNKNOWN_COMMAND_REPLY)];
        };

        if command == CommandId::Start && self.responder.memory().clear(event.chat_id) {
            tracing::debug!("Cleared conversation memory for chat {}", event.chat_id);
        }

        match self.router.route(command, &event.args).await {
            Ok(result) => {
                tracing::info!(
                    "Chat {}: /{} answered by {}",
                    event.chat_id,
                    command.name(),
                    result.origin.map(|o| o.name()).unwrap_or("local")
                );
                split_message(&result.text, MAX_MESSAGE_LEN)
                    .into_iter()
                    .map(Outbound::text)
                    .collect()
            }
            Err(usage) => {
                tracing::debug!("Chat {}: {}", event.chat_id, usage);
                vec![Outbound::error(usage.user_message())]
            }
        }
    }
}

//! Free-text responder: user text in, model text out, split for delivery.

use std::sync::Arc;

use crate::agent::Agent;
use crate::config::ResponderMode;
use crate::providers::{ChatMessage, Provider};
use crate::tools::Toolbox;

use super::conversation::ConversationMemory;

/// Telegram's per-message limit.
pub const MAX_MESSAGE_LEN: usize = 4096;

pub const EMPTY_TEXT_REPLY: &str = "⚠️ No recibí ningún texto. Escríbeme lo que quieras contarme.";
pub const FAILURE_REPLY: &str = "⚠️ Ocurrió un error al procesar tu mensaje. Intenta de nuevo en un momento.";

const DIRECT_SYSTEM_PROMPT: &str = "Eres Serena, una asistente de bienestar emocional. Responde en \
español, con calidez y brevedad. No das diagnósticos. Si detectas señales de autolesión o ideas \
suicidas, recomienda con claridad buscar ayuda profesional o una línea de crisis de inmediato.";

/// Split `text` into consecutive chunks of at most `limit` characters.
///
/// Counts chars, so multi-byte text is never cut inside a character.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let limit = limit.max(1);

    let mut chunks = Vec::with_capacity(text.len() / limit + 1);
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == limit {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(text[start..].to_string());
    chunks
}

enum Backend {
    Direct(Arc<dyn Provider>),
    Agent(Agent),
}

/// Answers free text via the model, directly or through the agent.
pub struct Responder {
    backend: Backend,
    memory: ConversationMemory,
}

impl Responder {
    pub fn new(mode: ResponderMode, provider: Arc<dyn Provider>, tools: Toolbox) -> Self {
        let backend = match mode {
            ResponderMode::Direct => Backend::Direct(provider),
            ResponderMode::Agent => Backend::Agent(Agent::new(provider, tools)),
        };
        Self { backend, memory: ConversationMemory::default() }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Answer one message. Never fails; backend faults become [`FAILURE_REPLY`].
    pub async fn respond(&self, chat_id: i64, user_text: &str) -> String {
        let text = user_text.trim();
        if text.is_empty() {
            return EMPTY_TEXT_REPLY.to_string();
        }

        let history = self.memory.history(chat_id);
        let result = match &self.backend {
            Backend::Direct(provider) => {
                let mut messages = Vec::with_capacity(history.len() + 2);
                messages.push(ChatMessage::system(DIRECT_SYSTEM_PROMPT));
                messages.extend(history);
                messages.push(ChatMessage::user(text));
                provider.complete(&messages).await
            }
            Backend::Agent(agent) => agent.run(&history, text).await,
        };

        match result {
            Ok(reply) if reply.trim().is_empty() => {
                tracing::error!("Free-text response for chat {} was empty", chat_id);
                FAILURE_REPLY.to_string()
            }
            Ok(reply) => {
                self.memory.record(chat_id, text, &reply);
                reply
            }
            Err(e) => {
                tracing::error!("Free-text response for chat {} failed: {}", chat_id, e);
                FAILURE_REPLY.to_string()
            }
        }
    }

    /// [`Self::respond`] split into deliverable messages.
    pub async fn respond_chunks(&self, chat_id: i64, user_text: &str) -> Vec<String> {
        split_message(&self.respond(chat_id, user_text).await, MAX_MESSAGE_LEN)
    }
}

//! Per-chat conversation memory for the free-text responder.
//!
//! Handles:
//! - Keeping the last few turns of each chat
//! - Dropping the oldest turns past the cap
//! - Evicting the least recently active chat past the chat cap
//!
//! Memory lives in-process only and is lost on restart.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::providers::ChatMessage;

/// Turns (user + assistant pair) kept per chat.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Chats remembered at once; the least recently active one is evicted first.
pub const DEFAULT_MAX_CHATS: usize = 1_000;

#[derive(Default)]
struct ChatHistory {
    messages: VecDeque<ChatMessage>,
    last_used: u64,
}

#[derive(Default)]
struct Chats {
    by_id: HashMap<i64, ChatHistory>,
    clock: u64,
}

/// Bounded history keyed by chat id.
pub struct ConversationMemory {
    max_messages: usize,
    max_chats: usize,
    chats: Mutex<Chats>,
}

impl ConversationMemory {
    /// Create a memory keeping `max_turns` exchanges per chat.
    pub fn new(max_turns: usize) -> Self {
        Self::with_limits(max_turns, DEFAULT_MAX_CHATS)
    }

    pub fn with_limits(max_turns: usize, max_chats: usize) -> Self {
        Self {
            max_messages: max_turns * 2,
            max_chats: max_chats.max(1),
            chats: Mutex::new(Chats::default()),
        }
    }

    /// History of a chat, oldest first.
    pub fn history(&self, chat_id: i64) -> Vec<ChatMessage> {
        self.lock()
            .by_id
            .get(&chat_id)
            .map(|h| h.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append a completed exchange.
    pub fn record(&self, chat_id: i64, user: &str, assistant: &str) {
        if self.max_messages == 0 {
            return;
        }
        let mut chats = self.lock();
        chats.clock += 1;
        let now = chats.clock;

        if !chats.by_id.contains_key(&chat_id) && chats.by_id.len() >= self.max_chats {
            let oldest = chats
                .by_id
                .iter()
                .min_by_key(|(_, h)| h.last_used)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                chats.by_id.remove(&oldest);
                tracing::debug!("Evicted conversation memory for chat {}", oldest);
            }
        }

        let history = chats.by_id.entry(chat_id).or_default();
        history.last_used = now;
        history.messages.push_back(ChatMessage::user(user));
        history.messages.push_back(ChatMessage::assistant(assistant));
        while history.messages.len() > self.max_messages {
            history.messages.pop_front();
        }
    }

    /// Forget a chat.
    pub fn clear(&self, chat_id: i64) -> bool {
        self.lock().by_id.remove(&chat_id).is_some()
    }

    /// Number of chats with history.
    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Chats> {
        // A poisoned map only holds chat history; keep serving it.
        self.chats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

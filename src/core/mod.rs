//! Core module - command parsing, routing and free-text answers.
//!
//! This module contains Serena's message processing, independent of Telegram:
//! - Command classification and routing to lookup tools
//! - Free-text responder with per-chat memory
//! - Event-to-replies dispatch

pub mod command;
pub mod conversation;
pub mod dispatch;
pub mod responder;
pub mod router;

pub use command::{CommandId, Inbound};
pub use dispatch::{BotCore, InboundEvent, Outbound};
pub use responder::{split_message, Responder, MAX_MESSAGE_LEN};
pub use router::CommandRouter;

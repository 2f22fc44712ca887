//! Slash-command parsing.
//!
//! Handles:
//! - `/name arg1 arg2` splitting
//! - `/name@botname` suffixes used in group chats
//! - Spanish and English command names

use regex::Regex;
use std::sync::OnceLock;

/// Registered commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Start,
    Help,
    Date,
    Weather,
    Motivation,
    Mood,
    Centers,
}

impl CommandId {
    pub const ALL: [CommandId; 7] = [
        CommandId::Start,
        CommandId::Help,
        CommandId::Date,
        CommandId::Weather,
        CommandId::Motivation,
        CommandId::Mood,
        CommandId::Centers,
    ];

    /// Resolve a command name (without slash), case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "start" | "inicio" => Some(CommandId::Start),
            "help" | "ayuda" => Some(CommandId::Help),
            "fecha" | "date" => Some(CommandId::Date),
            "clima" | "weather" => Some(CommandId::Weather),
            "motivacion" | "motivación" | "motivation" => Some(CommandId::Motivation),
            "mood" | "animo" | "ánimo" => Some(CommandId::Mood),
            "centros" | "centers" => Some(CommandId::Centers),
            _ => None,
        }
    }

    /// Name shown in the Telegram command menu.
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Start => "start",
            CommandId::Help => "help",
            CommandId::Date => "fecha",
            CommandId::Weather => "clima",
            CommandId::Motivation => "motivacion",
            CommandId::Mood => "mood",
            CommandId::Centers => "centros",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CommandId::Start => "Mensaje de bienvenida",
            CommandId::Help => "Mostrar la ayuda",
            CommandId::Date => "Fecha y hora actual",
            CommandId::Weather => "Clima de una ciudad",
            CommandId::Motivation => "Mensaje motivacional",
            CommandId::Mood => "Comprobación de ánimo",
            CommandId::Centers => "Buscar centros psicológicos",
        }
    }
}

/// A message classified as command or free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command { name: String, args: Vec<String> },
    Text(String),
    /// A command addressed to a different bot in a group chat.
    Ignored,
}

fn command_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^/(\w+)(?:@([A-Za-z0-9_]+))?(?:\s+(.*))?$").ok())
        .as_ref()
}

/// Classify raw message text.
///
/// `bot_username` filters `/cmd@other_bot` commands in groups.
///
/// # Examples
///
/// ```
/// use serena::core::command::{classify, Inbound};
///
/// let parsed = classify("/clima San Salvador", None);
/// assert_eq!(
///     parsed,
///     Inbound::Command { name: "clima".into(), args: vec!["San".into(), "Salvador".into()] }
/// );
/// ```
pub fn classify(text: &str, bot_username: Option<&str>) -> Inbound {
    let trimmed = text.trim();
    let Some(caps) = command_regex().and_then(|re| re.captures(trimmed)) else {
        return Inbound::Text(text.to_string());
    };

    if let (Some(target), Some(me)) = (caps.get(2), bot_username) {
        if !target.as_str().eq_ignore_ascii_case(me.trim_start_matches('@')) {
            return Inbound::Ignored;
        }
    }

    let name = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
    let args = caps
        .get(3)
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    Inbound::Command { name, args }
}

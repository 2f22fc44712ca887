//! Telegram command menu.

use teloxide::prelude::*;
use teloxide::types::BotCommand;

use crate::core::CommandId;

/// Menu entries, one per registered command.
pub fn bot_commands() -> Vec<BotCommand> {
    CommandId::ALL
        .iter()
        .map(|c| BotCommand::new(c.name(), c.description()))
        .collect()
}

/// Publish the menu. Failure only costs the menu, so it is logged.
pub async fn register_commands(bot: &Bot) {
    match bot.set_my_commands(bot_commands()).await {
        Ok(_) => tracing::info!("Telegram bot commands set"),
        Err(e) => tracing::warn!("Failed to set commands: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_uses_primary_names() {
        let names: Vec<String> = bot_commands().into_iter().map(|c| c.command).collect();
        assert_eq!(names, vec!["start", "help", "fecha", "clima", "motivacion", "mood", "centros"]);
    }
}

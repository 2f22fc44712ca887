//! Command routing: one registered command to one tool call or local answer.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use super::command::CommandId;
use crate::config::{Locale, Settings};
use crate::error::UsageError;
use crate::tools::{ToolKind, ToolResult, Toolbox};

const WEATHER_USAGE: &str = "Usa /clima [ciudad]. Ejemplo: /clima San Salvador";
const MOOD_USAGE: &str = "Describe cómo te sientes. Ejemplo: /mood me siento ansioso";
const CENTERS_USAGE: &str = "Indica una ciudad o ubicación. Ejemplo: /centros San Salvador";

const WEEKDAYS_ES: [&str; 7] = ["Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado", "Domingo"];
const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];
const WEEKDAYS_EN: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];
const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Maps commands to tools.
#[derive(Clone)]
pub struct CommandRouter {
    settings: Arc<Settings>,
    tools: Toolbox,
}

impl CommandRouter {
    pub fn new(settings: Arc<Settings>, tools: Toolbox) -> Self {
        Self { settings, tools }
    }

    /// Route one command. Tool output is returned verbatim.
    pub async fn route(&self, command: CommandId, args: &[String]) -> Result<ToolResult, UsageError> {
        let joined = args.join(" ");
        let query = joined.trim();

        match command {
            CommandId::Start => Ok(ToolResult::local(self.settings.start_text.clone())),
            CommandId::Help => Ok(ToolResult::local(self.settings.help_text.clone())),
            CommandId::Date => Ok(ToolResult::local(format_date(
                Utc::now().with_timezone(&self.settings.timezone),
                self.settings.locale,
            ))),
            CommandId::Motivation => Ok(self.tools.invoke(ToolKind::Motivation, query).await),
            CommandId::Weather => {
                let query = require(query, "clima", WEATHER_USAGE)?;
                Ok(self.tools.invoke(ToolKind::Weather, query).await)
            }
            CommandId::Mood => {
                let query = require(query, "mood", MOOD_USAGE)?;
                Ok(self.tools.invoke(ToolKind::Mood, query).await)
            }
            CommandId::Centers => {
                let query = require(query, "centros", CENTERS_USAGE)?;
                Ok(self.tools.invoke(ToolKind::Clinics, query).await)
            }
        }
    }
}

fn require<'a>(query: &'a str, command: &'static str, example: &'static str) -> Result<&'a str, UsageError> {
    if query.is_empty() {
        Err(UsageError::new(command, example))
    } else {
        Ok(query)
    }
}

/// Weekday, day, month, year and `HH:MM:SS` in the given locale.
pub fn format_date(now: DateTime<Tz>, locale: Locale) -> String {
    let weekday = now.weekday().num_days_from_monday() as usize;
    let month = now.month0() as usize;
    let clock = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());

    match locale {
        Locale::Es => format!(
            "📅 Hoy es {}, {:02} de {} de {}\n🕒 Hora: {}",
            WEEKDAYS_ES[weekday],
            now.day(),
            MONTHS_ES[month],
            now.year(),
            clock
        ),
        Locale::En => format!(
            "📅 Today is {}, {:02} {} {}\n🕒 Time: {}",
            WEEKDAYS_EN[weekday],
            now.day(),
            MONTHS_EN[month],
            now.year(),
            clock
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use crate::tools::testing::recording_toolbox;
    use chrono::TimeZone;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_weather_without_args_is_usage_error() {
        let (tools, recorders) = recording_toolbox();
        let router = CommandRouter::new(Arc::new(test_settings()), tools);

        let err = router.route(CommandId::Weather, &[]).await.unwrap_err();
        assert_eq!(err.example, WEATHER_USAGE);
        assert!(router.route(CommandId::Weather, &args(&["  "])).await.is_err());
        assert!(recorders.weather.calls().is_empty());
    }

    #[tokio::test]
    async fn test_weather_calls_tool_once_with_city() {
        let (tools, recorders) = recording_toolbox();
        let router = CommandRouter::new(Arc::new(test_settings()), tools);

        let result = router.route(CommandId::Weather, &args(&["Paris"])).await.unwrap();
        assert_eq!(recorders.weather.calls(), vec!["Paris".to_string()]);
        assert_eq!(result.text, "clima:Paris");
        assert_eq!(result.origin, Some(ToolKind::Weather));
    }

    #[tokio::test]
    async fn test_multi_word_args_are_joined() {
        let (tools, recorders) = recording_toolbox();
        let router = CommandRouter::new(Arc::new(test_settings()), tools);

        router.route(CommandId::Centers, &args(&["San", "Salvador"])).await.unwrap();
        router.route(CommandId::Mood, &args(&["me", "siento", "bien"])).await.unwrap();
        assert_eq!(recorders.clinics.calls(), vec!["San Salvador".to_string()]);
        assert_eq!(recorders.mood.calls(), vec!["me siento bien".to_string()]);
    }

    #[tokio::test]
    async fn test_mood_and_centers_require_args() {
        let (tools, _recorders) = recording_toolbox();
        let router = CommandRouter::new(Arc::new(test_settings()), tools);

        assert_eq!(router.route(CommandId::Mood, &[]).await.unwrap_err().example, MOOD_USAGE);
        assert_eq!(router.route(CommandId::Centers, &[]).await.unwrap_err().example, CENTERS_USAGE);
    }

    #[tokio::test]
    async fn test_motivation_ignores_args_requirement() {
        let (tools, recorders) = recording_toolbox();
        let router = CommandRouter::new(Arc::new(test_settings()), tools);

        let result = router.route(CommandId::Motivation, &[]).await.unwrap();
        assert_eq!(result.origin, Some(ToolKind::Motivation));
        assert_eq!(recorders.motivation.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_start_help_and_date_are_local() {
        let (tools, recorders) = recording_toolbox();
        let settings = Arc::new(test_settings());
        let router = CommandRouter::new(settings.clone(), tools);

        let help = router.route(CommandId::Help, &args(&["extra"])).await.unwrap();
        assert_eq!(help.text, settings.help_text);
        assert_eq!(help.origin, None);

        let start = router.route(CommandId::Start, &[]).await.unwrap();
        assert_eq!(start.text, settings.start_text);

        let date = router.route(CommandId::Date, &args(&["ignored"])).await.unwrap();
        assert!(date.text.starts_with("📅 Hoy es "));
        assert!(recorders.weather.calls().is_empty());
        assert!(recorders.motivation.calls().is_empty());
    }

    #[test]
    fn test_format_date_locales() {
        let tz: Tz = chrono_tz::America::El_Salvador;
        let now = tz.with_ymd_and_hms(2025, 3, 5, 9, 7, 3).unwrap();
        assert_eq!(
            format_date(now, Locale::Es),
            "📅 Hoy es Miércoles, 05 de marzo de 2025\n🕒 Hora: 09:07:03"
        );
        assert_eq!(
            format_date(now, Locale::En),
            "📅 Today is Wednesday, 05 March 2025\n🕒 Time: 09:07:03"
        );
    }
}

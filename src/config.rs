//! Configuration loading for Serena.
//!
//! Everything is read once at startup from the process environment (after an
//! optional `.env` file) into plain structs that are passed down explicitly.

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEZONE: &str = "America/El_Salvador";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_START_TEXT: &str = "👋 ¡Hola! Soy Serena, tu asistente de bienestar.\n\n\
Usa /help para ver lo que puedo hacer.";

pub const DEFAULT_HELP_TEXT: &str = "📌 Funcionalidades disponibles:\n\n\
/start - Mensaje de bienvenida\n\
/help - Mostrar esta ayuda\n\
/fecha - Fecha y hora actual\n\
/clima [ciudad] - Información meteorológica\n\
/motivacion - Mensaje motivacional\n\
/mood [cómo te sientes] - Comprobación de ánimo\n\
/centros [ubicación] - Buscar centros psicológicos\n\n\
También puedes escribirme cualquier cosa y te responderé.";

/// Load `.env` into the process environment if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// How Telegram updates reach the bot.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[default]
    Polling,
    Webhook,
}

/// How free text is answered.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponderMode {
    /// Single-turn model call.
    Direct,
    /// Model may pick lookup tools before answering.
    #[default]
    Agent,
}

/// Which hosted model API to talk to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// Any OpenAI-compatible `chat/completions` endpoint.
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
}

/// Language used for dates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

macro_rules! impl_from_str {
    ($ty:ty, $($name:literal => $variant:expr),+ $(,)?) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!("unsupported value '{}'", other)),
                }
            }
        }
    };
}

impl_from_str!(DeliveryMode, "polling" => DeliveryMode::Polling, "webhook" => DeliveryMode::Webhook);
impl_from_str!(ResponderMode, "direct" => ResponderMode::Direct, "agent" => ResponderMode::Agent);
impl_from_str!(ProviderKind, "gemini" => ProviderKind::Gemini, "openai" => ProviderKind::OpenAi);
impl_from_str!(Locale, "es" => Locale::Es, "en" => Locale::En);

/// Language model configuration.
#[derive(Clone, Debug)]
pub struct ModelSettings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Bot process settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub telegram_token: String,
    pub model: ModelSettings,
    pub weather_api_key: String,
    pub weather_api_url: String,
    pub nominatim_url: String,
    pub responder_mode: ResponderMode,
    /// Let motivation and mood ask the model first, falling back to canned text.
    pub llm_tools: bool,
    pub delivery: DeliveryMode,
    /// Public base URL Telegram posts updates to (webhook mode only).
    pub webhook_url: Option<String>,
    pub port: u16,
    pub timezone: Tz,
    pub locale: Locale,
    pub start_text: String,
    pub help_text: String,
}

impl Settings {
    /// Load bot settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load bot settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let telegram_token = env.required(&["TELEGRAM_TOKEN", "BOT_TOKEN"])?;
        let model = ModelSettings {
            provider: env.parsed("LLM_PROVIDER")?.unwrap_or_default(),
            api_key: env.required(&["GEMINI_API_KEY", "LLM_API_KEY"])?,
            model: env.optional("LLM_MODEL"),
            base_url: env.optional("LLM_BASE_URL"),
        };
        let weather_api_key = env.required(&["WEATHER_API_KEY"])?;

        let delivery: DeliveryMode = env.parsed("BOT_MODE")?.unwrap_or_default();
        let webhook_url = env.optional("WEBHOOK_URL");

        let timezone_name =
            env.optional("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name.parse().map_err(|_| {
            Error::config(format!("TIMEZONE '{}' is not a known IANA time zone", timezone_name))
        })?;

        let settings = Self {
            telegram_token,
            model,
            weather_api_key,
            weather_api_url: env
                .optional("WEATHER_API_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            nominatim_url: env
                .optional("NOMINATIM_URL")
                .unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string()),
            responder_mode: env.parsed("RESPONDER_MODE")?.unwrap_or_default(),
            llm_tools: env.parsed::<bool>("LLM_TOOLS")?.unwrap_or(true),
            delivery,
            webhook_url,
            port: env.parsed("PORT")?.unwrap_or(DEFAULT_PORT),
            timezone,
            locale: env.parsed("LOCALE")?.unwrap_or_default(),
            start_text: env
                .optional("START_TEXT")
                .unwrap_or_else(|| DEFAULT_START_TEXT.to_string()),
            help_text: env
                .optional("HELP_TEXT")
                .unwrap_or_else(|| DEFAULT_HELP_TEXT.to_string()),
        };

        settings.validate()?;
        tracing::debug!(
            "Loaded settings: provider={:?} responder={:?} delivery={:?} port={}",
            settings.model.provider,
            settings.responder_mode,
            settings.delivery,
            settings.port
        );
        Ok(settings)
    }

    /// Check cross-field requirements. Called again after CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if self.delivery == DeliveryMode::Webhook && self.webhook_url.is_none() {
            return Err(Error::config(
                "BOT_MODE=webhook requires WEBHOOK_URL (public base URL of this service)",
            ));
        }
        Ok(())
    }
}

/// Liveness monitor settings.
#[derive(Clone, Debug)]
pub struct MonitorSettings {
    pub check_url: String,
    pub deploy_hook: String,
    pub interval: Duration,
    pub timeout: Duration,
}

impl MonitorSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);
        Ok(Self {
            check_url: env.required(&["CHECK_URL"])?,
            deploy_hook: env.required(&["RENDER_DEPLOY_HOOK", "REDEPLOY_WEBHOOK_URL"])?,
            interval: env.seconds("CHECK_INTERVAL", DEFAULT_CHECK_INTERVAL_SECS)?,
            timeout: env.seconds("CHECK_TIMEOUT", DEFAULT_CHECK_TIMEOUT_SECS)?,
        })
    }
}

/// Key lookup with the error reporting shared by both loaders.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Non-empty value of `key`.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// First non-empty value among `keys` (primary name, then aliases).
    fn required(&self, keys: &[&str]) -> Result<String> {
        keys.iter()
            .find_map(|key| self.optional(key))
            .ok_or_else(|| {
                Error::config(format!(
                    "missing required environment variable {} (set it in the environment or .env)",
                    keys.join(" / ")
                ))
            })
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| Error::config(format!("invalid value for {}: '{}' ({})", key, raw, e)))
            })
            .transpose()
    }

    /// Whole seconds, at least 1.
    fn seconds(&self, key: &str, default: u64) -> Result<Duration> {
        match self.parsed::<u64>(key)?.unwrap_or(default) {
            0 => Err(Error::config(format!("{} must be at least 1 second", key))),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings::from_lookup(|key| match key {
        "TELEGRAM_TOKEN" => Some("123:abc".to_string()),
        "GEMINI_API_KEY" => Some("gemini-key".to_string()),
        "WEATHER_API_KEY" => Some("weather-key".to_string()),
        _ => None,
    })
    .expect("test settings")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("TELEGRAM_TOKEN", "t"),
        ("GEMINI_API_KEY", "g"),
        ("WEATHER_API_KEY", "w"),
    ];

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(settings.delivery, DeliveryMode::Polling);
        assert_eq!(settings.responder_mode, ResponderMode::Agent);
        assert_eq!(settings.model.provider, ProviderKind::Gemini);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.timezone, chrono_tz::America::El_Salvador);
        assert_eq!(settings.locale, Locale::Es);
        assert!(settings.llm_tools);
        assert!(settings.help_text.contains("/clima"));
    }

    #[test]
    fn test_missing_token_names_the_key() {
        let err = Settings::from_lookup(lookup(&[("GEMINI_API_KEY", "g"), ("WEATHER_API_KEY", "w")]))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("TELEGRAM_TOKEN"));
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bot_token_alias_and_blank_values() {
        let settings = Settings::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "  "),
            ("BOT_TOKEN", "alias"),
            ("LLM_API_KEY", "k"),
            ("WEATHER_API_KEY", "w"),
        ]))
        .unwrap();
        assert_eq!(settings.telegram_token, "alias");
        assert_eq!(settings.model.api_key, "k");
    }

    #[test]
    fn test_webhook_mode_requires_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BOT_MODE", "webhook"));
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL"));

        pairs.push(("WEBHOOK_URL", "https://bot.example.com"));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(settings.delivery, DeliveryMode::Webhook);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(Settings::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TIMEZONE", "Mars/Olympus"));
        let err = Settings::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_monitor_settings() {
        let settings = MonitorSettings::from_lookup(lookup(&[
            ("CHECK_URL", "https://bot.example.com"),
            ("REDEPLOY_WEBHOOK_URL", "https://deploy.example.com/hook"),
            ("CHECK_INTERVAL", "60"),
        ]))
        .unwrap();
        assert_eq!(settings.interval, Duration::from_secs(60));
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS));
        assert_eq!(settings.deploy_hook, "https://deploy.example.com/hook");

        let err = MonitorSettings::from_lookup(lookup(&[("CHECK_URL", "x")])).unwrap_err();
        assert!(err.to_string().contains("RENDER_DEPLOY_HOOK"));
    }

    #[test]
    fn test_monitor_rejects_zero_durations() {
        for key in ["CHECK_INTERVAL", "CHECK_TIMEOUT"] {
            let err = MonitorSettings::from_lookup(lookup(&[
                ("CHECK_URL", "https://bot.example.com"),
                ("RENDER_DEPLOY_HOOK", "https://deploy.example.com/hook"),
                (key, "0"),
            ]))
            .unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains(key));
        }
    }
}

//! Lookup tools.
//!
//! Each tool maps a short query to a short user-facing text. Tools never fail
//! past their boundary: transport faults and malformed responses are logged
//! and turned into an apology string.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

pub mod clinics;
pub mod mood;
pub mod motivation;
pub mod weather;

pub use clinics::ClinicsTool;
pub use mood::MoodTool;
pub use motivation::MotivationTool;
pub use weather::WeatherTool;

use crate::config::Settings;
use crate::providers::Provider;

/// Identifier sent to upstream APIs that ask for one (Nominatim requires it).
pub const USER_AGENT: &str = concat!("serena-bot/", env!("CARGO_PKG_VERSION"));

/// The closed set of capabilities the router and the agent can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Weather,
    Clinics,
    Motivation,
    Mood,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Weather,
        ToolKind::Clinics,
        ToolKind::Motivation,
        ToolKind::Mood,
    ];

    /// Name the agent uses to select the tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Weather => "clima",
            ToolKind::Clinics => "centros",
            ToolKind::Motivation => "motivacion",
            ToolKind::Mood => "animo",
        }
    }

    /// One-line capability description shown to the agent.
    pub fn description(self) -> &'static str {
        match self {
            ToolKind::Weather => {
                "Consulta el clima actual de una ciudad. Entrada: nombre de la ciudad."
            }
            ToolKind::Clinics => {
                "Busca centros psicológicos cercanos a una ubicación. Entrada: ciudad o dirección."
            }
            ToolKind::Motivation => {
                "Da un mensaje motivacional breve. Entrada: contexto opcional del usuario."
            }
            ToolKind::Mood => {
                "Analiza cómo se siente la persona y sugiere algo para su bienestar. Entrada: descripción de su ánimo."
            }
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clima" | "weather" => Ok(ToolKind::Weather),
            "centros" | "clinics" | "centers" => Ok(ToolKind::Clinics),
            "motivacion" | "motivación" | "motivation" => Ok(ToolKind::Motivation),
            "animo" | "ánimo" | "mood" => Ok(ToolKind::Mood),
            other => Err(format!("unknown tool '{}'", other)),
        }
    }
}

/// Text produced by a tool, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub origin: Option<ToolKind>,
}

impl ToolResult {
    pub fn from_tool(origin: ToolKind, text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Some(origin) }
    }

    /// Text computed locally without a tool (date, help).
    pub fn local(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: None }
    }
}

/// A stateless query-to-text capability.
#[async_trait]
pub trait LookupTool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// Never fails; faults come back as apology text.
    async fn run(&self, query: &str) -> String;
}

/// One instance of every tool, shared by the router and the agent.
#[derive(Clone)]
pub struct Toolbox {
    weather: Arc<dyn LookupTool>,
    clinics: Arc<dyn LookupTool>,
    motivation: Arc<dyn LookupTool>,
    mood: Arc<dyn LookupTool>,
}

impl Toolbox {
    pub fn new(
        weather: Arc<dyn LookupTool>,
        clinics: Arc<dyn LookupTool>,
        motivation: Arc<dyn LookupTool>,
        mood: Arc<dyn LookupTool>,
    ) -> Self {
        Self { weather, clinics, motivation, mood }
    }

    /// Build the real tools from settings. `provider` backs the LLM variants
    /// of motivation and mood when `settings.llm_tools` is on.
    pub fn from_settings(settings: &Settings, provider: Arc<dyn Provider>) -> Self {
        let llm = settings.llm_tools.then_some(provider);
        Self::new(
            Arc::new(WeatherTool::new(
                settings.weather_api_url.clone(),
                settings.weather_api_key.clone(),
            )),
            Arc::new(ClinicsTool::new(settings.nominatim_url.clone())),
            Arc::new(MotivationTool::new(llm.clone())),
            Arc::new(MoodTool::new(llm)),
        )
    }

    pub fn get(&self, kind: ToolKind) -> &Arc<dyn LookupTool> {
        match kind {
            ToolKind::Weather => &self.weather,
            ToolKind::Clinics => &self.clinics,
            ToolKind::Motivation => &self.motivation,
            ToolKind::Mood => &self.mood,
        }
    }

    /// Run a tool and tag its output.
    pub async fn invoke(&self, kind: ToolKind, query: &str) -> ToolResult {
        tracing::debug!("Invoking tool {} with {:?}", kind, query);
        let text = self.get(kind).run(query).await;
        ToolResult::from_tool(kind, text)
    }
}

/// HTTP client with a per-request timeout for the tools.
pub(crate) fn http_client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

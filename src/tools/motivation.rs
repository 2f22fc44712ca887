//! Motivational messages, canned or model-written.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use super::{LookupTool, ToolKind};
use crate::providers::Provider;

pub const PHRASES: &[&str] = &[
    "💪 ¡Tú puedes con todo!",
    "🌟 Nunca olvides lo valioso que eres.",
    "🚀 Cada día es una nueva oportunidad.",
    "🔥 No te rindas, lo mejor está por venir.",
    "🧘‍♂️ Respira profundo, todo estará bien.",
    "💖 Tómate un momento para ti y tu bienestar.",
];

const SYSTEM_PROMPT: &str = "Eres un acompañante de bienestar emocional. Escribe un mensaje \
motivacional breve (máximo tres frases), cálido y en español, adaptado a lo que cuenta la persona. \
Si hay señales de autolesión o ideas suicidas, anímala con claridad a buscar ayuda profesional \
o una línea de crisis de inmediato.";

/// Uniform pick from [`PHRASES`].
pub fn canned_phrase() -> &'static str {
    PHRASES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PHRASES[0])
}

pub struct MotivationTool {
    provider: Option<Arc<dyn Provider>>,
}

impl MotivationTool {
    /// With a provider the model writes the message; the canned list is the fallback.
    pub fn new(provider: Option<Arc<dyn Provider>>) -> Self {
        Self { provider }
    }

    pub fn canned() -> Self {
        Self { provider: None }
    }
}

#[async_trait]
impl LookupTool for MotivationTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Motivation
    }

    async fn run(&self, query: &str) -> String {
        let Some(provider) = &self.provider else {
            return canned_phrase().to_string();
        };

        let prompt = if query.trim().is_empty() {
            "Necesito un poco de motivación.".to_string()
        } else {
            query.trim().to_string()
        };

        match provider.ask(Some(SYSTEM_PROMPT), &prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("Motivation via {} failed, using canned phrase: {}", provider.name(), e);
                canned_phrase().to_string()
            }
        }
    }
}

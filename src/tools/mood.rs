//! Mood check: keyword classifier, optionally refined by the model.

use std::sync::Arc;

use async_trait::async_trait;

use super::{LookupTool, ToolKind};
use crate::providers::Provider;

/// Branch picked by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Sad,
    Stressed,
    Positive,
    Unclassified,
}

const SAD_KEYWORDS: &[&str] = &["triste", "deprimido"];
const STRESS_KEYWORDS: &[&str] = &["estresado", "ansioso"];
const POSITIVE_KEYWORDS: &[&str] = &["feliz", "bien"];

const SYSTEM_PROMPT: &str = "Eres un acompañante de bienestar emocional. La persona describe \
cómo se siente. Identifica su estado de ánimo en pocas palabras y sugiere una acción concreta y \
sencilla para cuidarse, en español y en máximo cuatro frases. No diagnostiques. Si hay señales de \
autolesión o ideas suicidas, recomiéndale con claridad buscar ayuda profesional o una línea de crisis \
de inmediato.";

/// Checked in order; the first matching set wins.
pub fn classify(description: &str) -> Mood {
    let text = description.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has_any(SAD_KEYWORDS) {
        Mood::Sad
    } else if has_any(STRESS_KEYWORDS) {
        Mood::Stressed
    } else if has_any(POSITIVE_KEYWORDS) {
        Mood::Positive
    } else {
        Mood::Unclassified
    }
}

pub fn advice(mood: Mood) -> &'static str {
    match mood {
        Mood::Sad => "😢 Parece que te sientes triste. Te sugiero respirar profundamente 5 veces y dar un pequeño paseo.",
        Mood::Stressed => "😰 Parece que estás estresado. Intenta meditar o escuchar música relajante durante 5-10 minutos.",
        Mood::Positive => "😄 Me alegra que te sientas bien. Mantén esa energía positiva y sigue cuidándote.",
        Mood::Unclassified => "💬 Gracias por compartir cómo te sientes. Recuerda que siempre puedes buscar ayuda profesional si lo necesitas.",
    }
}

/// Deterministic path, always available.
pub fn keyword_advice(description: &str) -> &'static str {
    advice(classify(description))
}

pub struct MoodTool {
    provider: Option<Arc<dyn Provider>>,
}

impl MoodTool {
    pub fn new(provider: Option<Arc<dyn Provider>>) -> Self {
        Self { provider }
    }

    pub fn keywords_only() -> Self {
        Self { provider: None }
    }
}

#[async_trait]
impl LookupTool for MoodTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Mood
    }

    async fn run(&self, query: &str) -> String {
        let Some(provider) = &self.provider else {
            return keyword_advice(query).to_string();
        };

        match provider.ask(Some(SYSTEM_PROMPT), query.trim()).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("Mood check via {} failed, using keywords: {}", provider.name(), e);
                keyword_advice(query).to_string()
            }
        }
    }
}

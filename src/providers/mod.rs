//! Language model providers.

use std::sync::Arc;

pub mod gemini;
pub mod openai;
pub mod provider;

pub use provider::{ChatMessage, Provider, ProviderError, Result, Role};

use crate::config::{ModelSettings, ProviderKind};

/// Provider factory.
pub fn create_provider(settings: &ModelSettings) -> Arc<dyn Provider> {
    let provider: Arc<dyn Provider> = match settings.provider {
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::with_options(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
        )),
        ProviderKind::OpenAi => Arc::new(openai::OpenAiProvider::with_options(
            settings.api_key.clone(),
            settings.model.clone(),
            settings.base_url.clone(),
        )),
    };
    tracing::info!("Using {} provider with model {}", provider.name(), provider.model());
    provider
}
